// Tagged ownership state for native handles.
//
// A wrapper holds `Live(ptr)` until it frees the handle, after which the
// pointer is gone from the value entirely. Every native call goes through
// `live()`, so a released wrapper can never hand a dangling pointer to C.

use std::mem;
use std::ptr::NonNull;

pub(crate) enum HandleState<T> {
    Live(NonNull<T>),
    Released,
}

impl<T> HandleState<T> {
    /// The native pointer, if the handle has not been released.
    pub(crate) fn live(&self) -> Option<NonNull<T>> {
        match self {
            Self::Live(ptr) => Some(*ptr),
            Self::Released => None,
        }
    }

    /// Move to `Released`, returning the pointer exactly once.
    pub(crate) fn take(&mut self) -> Option<NonNull<T>> {
        match mem::replace(self, Self::Released) {
            Self::Live(ptr) => Some(ptr),
            Self::Released => None,
        }
    }

    pub(crate) fn is_released(&self) -> bool {
        matches!(self, Self::Released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_yields_pointer_once() {
        let mut value = 7u8;
        let mut state = HandleState::Live(NonNull::from(&mut value));
        assert!(!state.is_released());
        assert!(state.live().is_some());
        assert!(state.take().is_some());
        assert!(state.is_released());
        assert!(state.live().is_none());
        assert!(state.take().is_none());
    }
}
