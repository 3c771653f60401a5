use std::ffi::NulError;

use enchant_sys::LoadError;

/// Error type for broker and dictionary operations.
#[derive(Debug, thiserror::Error)]
pub enum EnchantError {
    /// The native library could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// `enchant_broker_init` returned no broker.
    #[error("enchant broker initialisation failed")]
    Initialization,

    /// No dictionary is installed for the tag, or the tag is invalid.
    #[error("no dictionary available for language tag {tag:?}{}", reason_suffix(.reason))]
    DictionaryUnavailable {
        tag: String,
        /// The broker's error string, if Enchant set one.
        reason: Option<String>,
    },

    /// A handle was used outside its valid lifecycle.
    #[error(transparent)]
    InvalidState(#[from] InvalidState),

    /// A string argument could not be passed as a C string.
    #[error("string passed to enchant contains a NUL byte: {0}")]
    Nul(#[from] NulError),
}

/// Lifecycle violations that would be undefined behaviour at the C level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidState {
    #[error("broker has already been released")]
    BrokerReleased,

    #[error("dictionary has already been released")]
    DictionaryReleased,

    #[error("dictionary {tag:?} was not requested from this broker")]
    ForeignDictionary { tag: String },
}

pub type Result<T, E = EnchantError> = std::result::Result<T, E>;

fn reason_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(r) if !r.is_empty() => format!(": {r}"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_message_includes_reason() {
        let err = EnchantError::DictionaryUnavailable {
            tag: "zz_ZZ".into(),
            reason: Some("no provider".into()),
        };
        assert_eq!(err.to_string(), "no dictionary available for language tag \"zz_ZZ\": no provider");
    }

    #[test]
    fn unavailable_message_without_reason() {
        let err = EnchantError::DictionaryUnavailable { tag: "zz_ZZ".into(), reason: None };
        assert_eq!(err.to_string(), "no dictionary available for language tag \"zz_ZZ\"");
    }

    #[test]
    fn invalid_state_is_transparent() {
        let err: EnchantError = InvalidState::ForeignDictionary { tag: "en_US".into() }.into();
        assert_eq!(err.to_string(), "dictionary \"en_US\" was not requested from this broker");
    }
}
