// Broker: root owner of the native `EnchantBroker`.
//
// Design notes:
// - The broker is the only value that can free dictionaries. A `Dictionary`
//   borrows the broker that created it, so the borrow checker keeps the
//   broker alive (and un-released, since `release` takes `&mut self`) while
//   any dictionary exists.
// - Each broker carries a process-unique id. `release_dictionary` compares
//   ids and rejects dictionaries that came from another broker instead of
//   handing a foreign pointer to `enchant_broker_free_dict`.
// - Dropping a live broker frees it; explicit `release` is only needed to
//   observe the error when it was already released.

use std::ffi::CString;
use std::ptr::{self, NonNull};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use enchant_sys::{EnchantApi, EnchantBroker, EnchantDict, EnchantLibrary};
use tracing::{debug, trace};

use crate::describe::{self, DictionaryInfo};
use crate::dictionary::Dictionary;
use crate::error::{EnchantError, InvalidState, Result};
use crate::handle::HandleState;
use crate::marshal::{copy_c_str, tag_to_c};

static NEXT_BROKER_ID: AtomicU64 = AtomicU64::new(1);

/// Owner of a native Enchant broker.
///
/// Not `Send` or `Sync`: Enchant gives no thread-safety guarantee for a
/// broker or its dictionaries, so each broker stays on the thread that
/// created it.
pub struct Broker {
    library: Arc<EnchantLibrary>,
    state: HandleState<EnchantBroker>,
    id: u64,
}

impl Broker {
    /// Load the native library with the default search order and create a
    /// broker.
    pub fn new() -> Result<Self> {
        let library = EnchantLibrary::load()?;
        Self::with_library(Arc::new(library))
    }

    /// Create a broker from an already loaded library.
    pub fn with_library(library: Arc<EnchantLibrary>) -> Result<Self> {
        let raw = unsafe { (library.api().broker_init)() };
        let Some(handle) = NonNull::new(raw) else {
            return Err(EnchantError::Initialization);
        };
        let id = NEXT_BROKER_ID.fetch_add(1, Ordering::Relaxed);
        debug!(broker = id, library = library.origin(), "enchant broker created");
        Ok(Self { library, state: HandleState::Live(handle), id })
    }

    /// The library this broker calls into.
    pub fn library(&self) -> &Arc<EnchantLibrary> {
        &self.library
    }

    /// Whether [`release`](Self::release) has been called.
    pub fn is_released(&self) -> bool {
        self.state.is_released()
    }

    /// Free the native broker.
    ///
    /// Fails with [`InvalidState::BrokerReleased`] on a second call.
    pub fn release(&mut self) -> Result<()> {
        let handle = self.state.take().ok_or(InvalidState::BrokerReleased)?;
        unsafe { (self.library.api().broker_free)(handle.as_ptr()) };
        debug!(broker = self.id, "enchant broker released");
        Ok(())
    }

    /// Whether a dictionary for `tag` is installed.
    ///
    /// Empty tags and tags containing a NUL byte are never installed.
    pub fn dictionary_exists(&self, tag: &str) -> Result<bool> {
        let broker = self.handle()?;
        let Some(c_tag) = tag_to_c(tag) else {
            return Ok(false);
        };
        let exists = unsafe { (self.api().broker_dict_exists)(broker.as_ptr(), c_tag.as_ptr()) };
        trace!(broker = self.id, tag, exists, "enchant_broker_dict_exists");
        Ok(exists != 0)
    }

    /// Load the dictionary for `tag`.
    ///
    /// Fails with [`EnchantError::DictionaryUnavailable`] when Enchant has no
    /// dictionary for the tag or the tag is malformed.
    pub fn request_dictionary(&self, tag: &str) -> Result<Dictionary<'_>> {
        let broker = self.handle()?;
        let Some(c_tag) = tag_to_c(tag) else {
            return Err(EnchantError::DictionaryUnavailable {
                tag: tag.to_string(),
                reason: Some("language tag is empty or contains a NUL byte".to_string()),
            });
        };

        let raw = unsafe { (self.api().broker_request_dict)(broker.as_ptr(), c_tag.as_ptr()) };
        match NonNull::new(raw) {
            Some(dict) => {
                debug!(broker = self.id, tag, "enchant dictionary loaded");
                Ok(Dictionary::new(self, dict, tag.to_string()))
            }
            None => {
                let reason = self.error_string(broker);
                debug!(broker = self.id, tag, reason = ?reason, "enchant dictionary unavailable");
                Err(EnchantError::DictionaryUnavailable { tag: tag.to_string(), reason })
            }
        }
    }

    /// Free a dictionary obtained from this broker.
    ///
    /// Fails with [`InvalidState::ForeignDictionary`] if `dictionary` came
    /// from a different broker and with [`InvalidState::DictionaryReleased`]
    /// if it was already released.
    pub fn release_dictionary(&self, dictionary: &mut Dictionary<'_>) -> Result<()> {
        if dictionary.broker_id() != self.id {
            return Err(InvalidState::ForeignDictionary {
                tag: dictionary.language().to_string(),
            }
            .into());
        }
        let dict = dictionary.take_handle().ok_or(InvalidState::DictionaryReleased)?;
        self.free_dict(dict, dictionary.language());
        Ok(())
    }

    /// Every dictionary the installed providers offer.
    pub fn list_dictionaries(&self) -> Result<Vec<DictionaryInfo>> {
        let broker = self.handle()?;
        let mut found: Vec<DictionaryInfo> = Vec::new();
        unsafe {
            (self.api().broker_list_dicts)(
                broker.as_ptr(),
                describe::collect_into_vec,
                ptr::from_mut(&mut found).cast(),
            );
        }
        trace!(broker = self.id, count = found.len(), "enchant_broker_list_dicts");
        Ok(found)
    }

    /// Set the provider preference for `tag` (`"*"` for the default),
    /// e.g. `"hunspell,nuspell,aspell"`.
    ///
    /// An empty tag or ordering is ignored without calling Enchant.
    pub fn set_ordering(&self, tag: &str, ordering: &str) -> Result<()> {
        let broker = self.handle()?;
        if tag.is_empty() || ordering.is_empty() {
            debug!(broker = self.id, tag, ordering, "empty provider ordering ignored");
            return Ok(());
        }
        let c_tag = CString::new(tag)?;
        let c_ordering = CString::new(ordering)?;
        unsafe {
            (self.api().broker_set_ordering)(broker.as_ptr(), c_tag.as_ptr(), c_ordering.as_ptr());
        }
        debug!(broker = self.id, tag, ordering, "enchant provider ordering set");
        Ok(())
    }

    /// The broker's most recent error message, if any.
    pub fn last_error(&self) -> Result<Option<String>> {
        let broker = self.handle()?;
        Ok(self.error_string(broker))
    }

    /// Version string of the loaded Enchant library.
    pub fn version(&self) -> Option<String> {
        unsafe { copy_c_str((self.api().get_version)()) }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn api(&self) -> &EnchantApi {
        self.library.api()
    }

    /// Free a dictionary handle owned by this broker.
    pub(crate) fn free_dict(&self, dict: NonNull<EnchantDict>, tag: &str) {
        // Dictionaries borrow the broker, so it is still live here.
        if let Some(broker) = self.state.live() {
            unsafe { (self.api().broker_free_dict)(broker.as_ptr(), dict.as_ptr()) };
            debug!(broker = self.id, tag, "enchant dictionary released");
        }
    }

    fn handle(&self) -> Result<NonNull<EnchantBroker>> {
        Ok(self.state.live().ok_or(InvalidState::BrokerReleased)?)
    }

    fn error_string(&self, broker: NonNull<EnchantBroker>) -> Option<String> {
        unsafe { copy_c_str((self.api().broker_get_error)(broker.as_ptr())) }
    }
}

impl Drop for Broker {
    fn drop(&mut self) {
        if let Some(handle) = self.state.take() {
            unsafe { (self.library.api().broker_free)(handle.as_ptr()) };
            debug!(broker = self.id, "enchant broker released on drop");
        }
    }
}

impl std::fmt::Debug for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("id", &self.id)
            .field("library", &self.library.origin())
            .field("released", &self.state.is_released())
            .finish()
    }
}
