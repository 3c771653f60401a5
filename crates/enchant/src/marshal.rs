// String and string-array marshaling across the Enchant boundary.
//
// Memory rules:
// - Language tags and provider orderings go in as NUL-terminated `CString`s,
//   owned by the caller for the duration of one native call.
// - Words go in as (pointer, byte length). Enchant is told the length
//   explicitly, so words are never copied or NUL-terminated.
// - Strings owned by Enchant (error messages, describe callback arguments,
//   the version) are copied out immediately and never freed here.
// - Suggestion arrays are owned by `SuggestionList`, which hands them back to
//   `enchant_dict_free_string_list` when dropped.

use std::ffi::{CStr, CString, c_char};
use std::ptr::NonNull;
use std::slice;

use enchant_sys::{EnchantApi, EnchantDict, ssize_t};
use tracing::trace;

/// Convert a language tag for a native call.
///
/// Returns `None` for tags Enchant cannot be asked about: empty tags and
/// tags with an interior NUL byte.
pub(crate) fn tag_to_c(tag: &str) -> Option<CString> {
    if tag.is_empty() {
        return None;
    }
    CString::new(tag).ok()
}

/// A word borrowed as a byte buffer with an explicit length.
#[derive(Clone, Copy)]
pub(crate) struct Word<'a> {
    bytes: &'a [u8],
}

impl<'a> Word<'a> {
    pub(crate) fn new(word: &'a str) -> Self {
        Self { bytes: word.as_bytes() }
    }

    pub(crate) fn ptr(&self) -> *const c_char {
        self.bytes.as_ptr().cast()
    }

    /// Byte length as `ssize_t`. Slices never exceed `isize::MAX` bytes.
    pub(crate) fn len(&self) -> ssize_t {
        self.bytes.len() as ssize_t
    }
}

/// Copy a borrowed native string into an owned `String`.
///
/// Returns `None` for NULL. Invalid UTF-8 is replaced with U+FFFD.
///
/// # Safety
///
/// `ptr` must be NULL or point to a NUL-terminated string that stays valid
/// for the duration of the call.
pub(crate) unsafe fn copy_c_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

/// Scoped owner of a suggestion array returned by `enchant_dict_suggest`.
pub(crate) struct SuggestionList<'a> {
    api: &'a EnchantApi,
    dict: NonNull<EnchantDict>,
    list: *mut *mut c_char,
    count: usize,
}

impl<'a> SuggestionList<'a> {
    /// Take ownership of a suggestion array.
    ///
    /// # Safety
    ///
    /// `list` must be NULL or an array returned by `api.dict_suggest` on
    /// `dict` holding at least `count` entries, and `dict` must stay live
    /// until this value is dropped.
    pub(crate) unsafe fn new(
        api: &'a EnchantApi,
        dict: NonNull<EnchantDict>,
        list: *mut *mut c_char,
        count: usize,
    ) -> Self {
        Self { api, dict, list, count }
    }

    /// Copy exactly `count` entries, in native order, into owned strings.
    ///
    /// A NULL entry inside the reported range becomes an empty string so the
    /// result length always matches the reported count.
    pub(crate) fn to_vec(&self) -> Vec<String> {
        if self.list.is_null() || self.count == 0 {
            return Vec::new();
        }
        let entries = unsafe { slice::from_raw_parts(self.list, self.count) };
        entries
            .iter()
            .map(|&entry| unsafe { copy_c_str(entry) }.unwrap_or_default())
            .collect()
    }
}

impl Drop for SuggestionList<'_> {
    fn drop(&mut self) {
        if self.list.is_null() {
            return;
        }
        trace!(count = self.count, "freeing native suggestion list");
        unsafe { (self.api.dict_free_string_list)(self.dict.as_ptr(), self.list) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_conversion_rejects_empty_and_nul() {
        assert!(tag_to_c("").is_none());
        assert!(tag_to_c("en\0US").is_none());
        assert_eq!(tag_to_c("en_GB").unwrap().as_bytes(), b"en_GB");
    }

    #[test]
    fn word_length_counts_bytes_not_chars() {
        let word = Word::new("päivää");
        assert_eq!(word.len(), 9);
        let word = Word::new("a\0b");
        assert_eq!(word.len(), 3);
    }

    #[test]
    fn copy_c_str_handles_null_and_invalid_utf8() {
        assert_eq!(unsafe { copy_c_str(std::ptr::null()) }, None);
        let valid = c"hello";
        assert_eq!(unsafe { copy_c_str(valid.as_ptr()) }.as_deref(), Some("hello"));
        let invalid = CString::new(vec![b'a', 0xff, b'b']).unwrap();
        assert_eq!(unsafe { copy_c_str(invalid.as_ptr()) }.as_deref(), Some("a\u{fffd}b"));
    }

    // -------------------------------------------------------------------------
    // SuggestionList over hand-built arrays
    // -------------------------------------------------------------------------

    use std::cell::Cell;
    use std::ptr;

    thread_local! {
        static FREED: Cell<usize> = const { Cell::new(0) };
    }

    unsafe extern "C" fn count_free(_dict: *mut EnchantDict, _list: *mut *mut c_char) {
        FREED.with(|f| f.set(f.get() + 1));
    }

    fn counting_api() -> EnchantApi {
        FREED.with(|f| f.set(0));
        let mut api = crate::testing::api();
        api.dict_free_string_list = count_free;
        api
    }

    fn freed() -> usize {
        FREED.with(Cell::get)
    }

    #[test]
    fn null_entry_inside_count_becomes_empty_string() {
        let api = counting_api();
        let first = CString::new("a").unwrap();
        let mut entries = [first.as_ptr().cast_mut(), ptr::null_mut()];
        {
            let list =
                unsafe { SuggestionList::new(&api, NonNull::dangling(), entries.as_mut_ptr(), 2) };
            assert_eq!(list.to_vec(), ["a", ""]);
        }
        assert_eq!(freed(), 1);
    }

    #[test]
    fn null_list_with_nonzero_count_is_neither_read_nor_freed() {
        let api = counting_api();
        {
            let list =
                unsafe { SuggestionList::new(&api, NonNull::dangling(), ptr::null_mut(), 3) };
            assert!(list.to_vec().is_empty());
        }
        assert_eq!(freed(), 0);
    }

    #[test]
    fn entries_past_count_are_ignored() {
        let api = counting_api();
        let (a, b) = (CString::new("a").unwrap(), CString::new("b").unwrap());
        let mut entries = [a.as_ptr().cast_mut(), b.as_ptr().cast_mut(), ptr::null_mut()];
        {
            let list =
                unsafe { SuggestionList::new(&api, NonNull::dangling(), entries.as_mut_ptr(), 1) };
            assert_eq!(list.to_vec(), ["a"]);
        }
        assert_eq!(freed(), 1);
    }
}
