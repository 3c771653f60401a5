// Dictionary: one loaded language dictionary, borrowed from its broker.
//
// State machine: Loaded (after `Broker::request_dictionary`) -> Released
// (after `Broker::release_dictionary` or drop). Every operation checks the
// state first and fails with `InvalidState::DictionaryReleased` afterwards.

use std::ptr::{self, NonNull};

use enchant_sys::{EnchantApi, EnchantDict};
use tracing::{debug, trace};

use crate::broker::Broker;
use crate::describe::{self, DictionaryInfo};
use crate::error::{InvalidState, Result};
use crate::handle::HandleState;
use crate::marshal::{SuggestionList, Word, copy_c_str};

/// A language dictionary loaded through a [`Broker`].
pub struct Dictionary<'b> {
    broker: &'b Broker,
    state: HandleState<EnchantDict>,
    language: String,
}

/// Personal word list operations: `(dict, word, len)` with no result.
macro_rules! word_list_op {
    ($(#[$doc:meta])* $name:ident, $native:ident) => {
        $(#[$doc])*
        pub fn $name(&self, word: &str) -> Result<()> {
            let dict = self.handle()?;
            if word.is_empty() {
                return Ok(());
            }
            let word_ref = Word::new(word);
            unsafe { (self.api().$native)(dict.as_ptr(), word_ref.ptr(), word_ref.len()) };
            trace!(language = %self.language, word, op = stringify!($native), "personal word list updated");
            Ok(())
        }
    };
}

impl<'b> Dictionary<'b> {
    pub(crate) fn new(broker: &'b Broker, handle: NonNull<EnchantDict>, language: String) -> Self {
        Self { broker, state: HandleState::Live(handle), language }
    }

    /// The tag this dictionary was requested with.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Whether the dictionary has been released.
    pub fn is_released(&self) -> bool {
        self.state.is_released()
    }

    /// Whether `word` is spelled correctly.
    ///
    /// The empty string is always correct and never reaches Enchant.
    /// Enchant reports errors and misspellings through the same nonzero
    /// return code, so a checker error also yields `false`.
    pub fn check(&self, word: &str) -> Result<bool> {
        let dict = self.handle()?;
        if word.is_empty() {
            return Ok(true);
        }
        let word_ref = Word::new(word);
        let code = unsafe { (self.api().dict_check)(dict.as_ptr(), word_ref.ptr(), word_ref.len()) };
        if code < 0 {
            debug!(
                language = %self.language,
                word,
                error = ?self.error_string(dict),
                "enchant_dict_check failed; reporting word as misspelled"
            );
        }
        Ok(code == 0)
    }

    /// Suggestions for `word`, in Enchant's ranking order.
    ///
    /// The empty string yields no suggestions and never reaches Enchant.
    /// No suggestions is an empty vector, not an error.
    pub fn suggest(&self, word: &str) -> Result<Vec<String>> {
        let dict = self.handle()?;
        if word.is_empty() {
            return Ok(Vec::new());
        }
        let word_ref = Word::new(word);
        let mut count: usize = 0;
        let list = unsafe {
            let raw = (self.api().dict_suggest)(dict.as_ptr(), word_ref.ptr(), word_ref.len(), &mut count);
            SuggestionList::new(self.api(), dict, raw, count)
        };
        let suggestions = list.to_vec();
        trace!(language = %self.language, word, count = suggestions.len(), "enchant_dict_suggest");
        Ok(suggestions)
    }

    word_list_op!(
        /// Add `word` to the personal word list (persisted by Enchant).
        add, dict_add
    );
    word_list_op!(
        /// Accept `word` for the lifetime of this dictionary only.
        add_to_session, dict_add_to_session
    );
    word_list_op!(
        /// Add `word` to the personal exclude list (persisted by Enchant).
        remove, dict_remove
    );
    word_list_op!(
        /// Reject `word` for the lifetime of this dictionary only.
        remove_from_session, dict_remove_from_session
    );

    /// Whether `word` was added to the personal or session word list.
    pub fn is_added(&self, word: &str) -> Result<bool> {
        let dict = self.handle()?;
        if word.is_empty() {
            return Ok(false);
        }
        let word_ref = Word::new(word);
        Ok(unsafe { (self.api().dict_is_added)(dict.as_ptr(), word_ref.ptr(), word_ref.len()) } != 0)
    }

    /// Whether `word` was removed through the personal or session exclude list.
    pub fn is_removed(&self, word: &str) -> Result<bool> {
        let dict = self.handle()?;
        if word.is_empty() {
            return Ok(false);
        }
        let word_ref = Word::new(word);
        Ok(unsafe { (self.api().dict_is_removed)(dict.as_ptr(), word_ref.ptr(), word_ref.len()) } != 0)
    }

    /// Tell the provider that `misspelled` was corrected to `correction`, so
    /// it can rank that correction higher later.
    pub fn store_replacement(&self, misspelled: &str, correction: &str) -> Result<()> {
        let dict = self.handle()?;
        if misspelled.is_empty() || correction.is_empty() {
            return Ok(());
        }
        let mis = Word::new(misspelled);
        let cor = Word::new(correction);
        unsafe {
            (self.api().dict_store_replacement)(dict.as_ptr(), mis.ptr(), mis.len(), cor.ptr(), cor.len());
        }
        Ok(())
    }

    /// Provider details for this dictionary.
    pub fn describe(&self) -> Result<DictionaryInfo> {
        let dict = self.handle()?;
        let mut found: Vec<DictionaryInfo> = Vec::with_capacity(1);
        unsafe {
            (self.api().dict_describe)(
                dict.as_ptr(),
                describe::collect_into_vec,
                ptr::from_mut(&mut found).cast(),
            );
        }
        Ok(found.pop().unwrap_or_else(|| DictionaryInfo {
            language: self.language.clone(),
            ..DictionaryInfo::default()
        }))
    }

    /// The dictionary's most recent error message, if any.
    pub fn last_error(&self) -> Result<Option<String>> {
        let dict = self.handle()?;
        Ok(self.error_string(dict))
    }

    pub(crate) fn broker_id(&self) -> u64 {
        self.broker.id()
    }

    pub(crate) fn take_handle(&mut self) -> Option<NonNull<EnchantDict>> {
        self.state.take()
    }

    fn api(&self) -> &'b EnchantApi {
        self.broker.api()
    }

    fn handle(&self) -> Result<NonNull<EnchantDict>> {
        Ok(self.state.live().ok_or(InvalidState::DictionaryReleased)?)
    }

    fn error_string(&self, dict: NonNull<EnchantDict>) -> Option<String> {
        unsafe { copy_c_str((self.api().dict_get_error)(dict.as_ptr())) }
    }
}

impl Drop for Dictionary<'_> {
    fn drop(&mut self) {
        if let Some(dict) = self.state.take() {
            self.broker.free_dict(dict, &self.language);
        }
    }
}

impl std::fmt::Debug for Dictionary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dictionary")
            .field("language", &self.language)
            .field("broker", &self.broker.id())
            .field("released", &self.state.is_released())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EnchantError;
    use crate::testing;

    fn broker() -> Broker {
        Broker::with_library(testing::library()).expect("fake broker")
    }

    /// Call `enchant_dict_suggest` directly through the raw table, the way a
    /// C caller would, for comparison with the wrapper.
    fn native_suggest(dictionary: &Dictionary<'_>, word: &str) -> Vec<String> {
        let api = dictionary.api();
        let dict = dictionary.state.live().unwrap();
        let c_word = std::ffi::CString::new(word).unwrap();
        let mut count = 0usize;
        unsafe {
            let list = (api.dict_suggest)(dict.as_ptr(), c_word.as_ptr(), -1, &mut count);
            let out = (0..count)
                .map(|i| std::ffi::CStr::from_ptr(*list.add(i)).to_string_lossy().into_owned())
                .collect();
            if !list.is_null() {
                (api.dict_free_string_list)(dict.as_ptr(), list);
            }
            out
        }
    }

    // =========================================================================
    // check
    // =========================================================================

    #[test]
    fn empty_word_is_correct_without_native_call() {
        let broker = broker();
        let dict = broker.request_dictionary("en_US").unwrap();
        assert!(dict.check("").unwrap());
        assert_eq!(testing::stats().check_calls, 0);
    }

    #[test]
    fn known_words_are_correct() {
        let broker = broker();
        let dict = broker.request_dictionary("en_US").unwrap();
        for word in ["hello", "world", "spell", "check", "color"] {
            assert!(dict.check(word).unwrap(), "{word} should be correct");
        }
    }

    #[test]
    fn unknown_words_are_misspelled() {
        let broker = broker();
        let dict = broker.request_dictionary("en_US").unwrap();
        assert!(!dict.check("helo").unwrap());
        assert!(!dict.check("colour").unwrap());
    }

    #[test]
    fn dictionaries_are_language_specific() {
        let broker = broker();
        let us = broker.request_dictionary("en_US").unwrap();
        let gb = broker.request_dictionary("en_GB").unwrap();
        assert!(us.check("color").unwrap());
        assert!(!gb.check("color").unwrap());
        assert!(gb.check("colour").unwrap());
    }

    #[test]
    fn checker_error_reads_as_misspelled() {
        let broker = broker();
        let dict = broker.request_dictionary("en_US").unwrap();
        assert!(!dict.check(testing::ERROR_WORD).unwrap());
        assert_eq!(dict.last_error().unwrap().as_deref(), Some("simulated checker failure"));
    }

    #[test]
    fn check_passes_exact_byte_length() {
        let broker = broker();
        let dict = broker.request_dictionary("en_US").unwrap();
        // Only matches if the bytes after the NUL reach the checker.
        assert!(dict.check("embedded\0nul").unwrap());
        assert_eq!(testing::stats().last_word_len, Some(12));
        assert!(!dict.check("embedded\0").unwrap());
        assert_eq!(testing::stats().last_word_len, Some(9));
    }

    #[test]
    fn check_passes_utf8_byte_length() {
        let broker = broker();
        let dict = broker.request_dictionary("fi").unwrap();
        assert!(dict.check("päivä").unwrap());
        assert_eq!(testing::stats().last_word_len, Some("päivä".len() as isize));
    }

    // =========================================================================
    // suggest
    // =========================================================================

    #[test]
    fn empty_word_has_no_suggestions_without_native_call() {
        let broker = broker();
        let dict = broker.request_dictionary("en_US").unwrap();
        assert!(dict.suggest("").unwrap().is_empty());
        assert_eq!(testing::stats().suggest_calls, 0);
    }

    #[test]
    fn misspelled_word_gets_ranked_suggestions() {
        let broker = broker();
        let dict = broker.request_dictionary("en_US").unwrap();
        let suggestions = dict.suggest("helo").unwrap();
        assert!(!suggestions.is_empty());
        assert!(suggestions.iter().any(|s| s == "hello"));
        assert_eq!(suggestions, native_suggest(&dict, "helo"));
    }

    #[test]
    fn suggestion_order_matches_native_for_many_words() {
        let broker = broker();
        let dict = broker.request_dictionary("en_US").unwrap();
        for word in ["wrld", "chek", "spel", "hel", "wordd", "colr"] {
            let ours = dict.suggest(word).unwrap();
            assert!(!ours.is_empty(), "expected suggestions for {word}");
            assert_eq!(ours, native_suggest(&dict, word), "order mismatch for {word}");
        }
        assert_eq!(testing::stats().live_suggestion_lists, 0);
    }

    #[test]
    fn suggestion_lists_are_freed() {
        let broker = broker();
        let dict = broker.request_dictionary("en_US").unwrap();
        for _ in 0..10 {
            dict.suggest("helo").unwrap();
        }
        let stats = testing::stats();
        assert_eq!(stats.suggest_calls, 10);
        assert_eq!(stats.live_suggestion_lists, 0);
        assert_eq!(stats.violations, 0);
    }

    #[test]
    fn null_list_is_empty() {
        let broker = broker();
        let dict = broker.request_dictionary("en_US").unwrap();
        assert!(dict.suggest("xyzzyplugh").unwrap().is_empty());
        assert_eq!(testing::stats().suggest_calls, 1);
    }

    #[test]
    fn zero_count_list_is_empty_and_freed() {
        let broker = broker();
        let dict = broker.request_dictionary("en_US").unwrap();
        assert!(dict.suggest(testing::EMPTY_LIST_WORD).unwrap().is_empty());
        assert_eq!(testing::stats().live_suggestion_lists, 0);
        assert_eq!(testing::stats().violations, 0);
    }

    #[test]
    fn invalid_utf8_suggestions_are_replaced() {
        let broker = broker();
        let dict = broker.request_dictionary("en_US").unwrap();
        assert_eq!(dict.suggest(testing::INVALID_UTF8_WORD).unwrap(), ["caf\u{fffd}"]);
    }

    // =========================================================================
    // Personal word list
    // =========================================================================

    #[test]
    fn add_makes_word_correct() {
        let broker = broker();
        let dict = broker.request_dictionary("en_US").unwrap();
        assert!(!dict.check("rustacean").unwrap());
        dict.add("rustacean").unwrap();
        assert!(dict.check("rustacean").unwrap());
        assert!(dict.is_added("rustacean").unwrap());
    }

    #[test]
    fn session_add_and_remove() {
        let broker = broker();
        let dict = broker.request_dictionary("en_US").unwrap();
        dict.add_to_session("crate").unwrap();
        assert!(dict.check("crate").unwrap());
        dict.remove_from_session("crate").unwrap();
        assert!(!dict.check("crate").unwrap());
        assert!(dict.is_removed("crate").unwrap());
    }

    #[test]
    fn remove_rejects_known_word() {
        let broker = broker();
        let dict = broker.request_dictionary("en_US").unwrap();
        dict.remove("hello").unwrap();
        assert!(!dict.check("hello").unwrap());
        assert!(dict.is_removed("hello").unwrap());
        assert!(!dict.is_added("hello").unwrap());
    }

    #[test]
    fn empty_word_list_operations_are_noops() {
        let broker = broker();
        let dict = broker.request_dictionary("en_US").unwrap();
        dict.add("").unwrap();
        dict.remove("").unwrap();
        assert!(!dict.is_added("").unwrap());
        assert!(!dict.is_removed("").unwrap());
        dict.store_replacement("", "x").unwrap();
        assert_eq!(testing::stats().word_list_calls, 0);
    }

    #[test]
    fn stored_replacement_ranks_first() {
        let broker = broker();
        let dict = broker.request_dictionary("en_US").unwrap();
        dict.store_replacement("helo", "help").unwrap();
        assert_eq!(dict.suggest("helo").unwrap().first().map(String::as_str), Some("help"));
    }

    // =========================================================================
    // describe / state
    // =========================================================================

    #[test]
    fn describe_reports_provider() {
        let broker = broker();
        let dict = broker.request_dictionary("en_GB").unwrap();
        let info = dict.describe().unwrap();
        assert_eq!(info.language, "en_GB");
        assert_eq!(info.provider_name, testing::PROVIDER_NAME);
    }

    #[test]
    fn released_dictionary_rejects_operations() {
        let broker = broker();
        let mut dict = broker.request_dictionary("en_US").unwrap();
        broker.release_dictionary(&mut dict).unwrap();

        let released = |r: Result<()>| {
            assert!(matches!(r, Err(EnchantError::InvalidState(InvalidState::DictionaryReleased))));
        };
        released(dict.check("hello").map(drop));
        released(dict.check("").map(drop));
        released(dict.suggest("helo").map(drop));
        released(dict.suggest("").map(drop));
        released(dict.add("x"));
        released(dict.is_added("x").map(drop));
        released(dict.store_replacement("a", "b"));
        released(dict.describe().map(drop));
        released(dict.last_error().map(drop));

        let stats = testing::stats();
        assert_eq!(stats.check_calls, 0);
        assert_eq!(stats.suggest_calls, 0);
        assert_eq!(stats.violations, 0);
    }

    #[test]
    fn full_session_leaves_nothing_live() {
        let mut broker = broker();
        assert!(broker.dictionary_exists("en_US").unwrap());
        let mut dict = broker.request_dictionary("en_US").unwrap();
        assert!(dict.check("hello").unwrap());
        assert!(dict.suggest("helo").unwrap().contains(&"hello".to_string()));
        broker.release_dictionary(&mut dict).unwrap();
        drop(dict);
        broker.release().unwrap();

        let stats = testing::stats();
        assert_eq!(stats.live_brokers, 0);
        assert_eq!(stats.live_dictionaries, 0);
        assert_eq!(stats.live_suggestion_lists, 0);
        assert_eq!(stats.violations, 0);
    }
}
