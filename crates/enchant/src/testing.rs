//! In-process fake of the Enchant C API.
//!
//! Every entry point is a real `extern "C"` function behind an
//! [`EnchantApi`] table, so the wrapper's marshaling runs exactly as it does
//! against libenchant. The fake keeps per-thread bookkeeping of every handle
//! and suggestion list it hands out; [`stats`] exposes live counts and a
//! `violations` counter for frees of unknown, foreign, or already freed
//! pointers.
//!
//! State is thread-local and reset by [`library`]. Brokers are not `Send`,
//! so all calls for one test land on that test's thread.
//!
//! Installed languages: `en_US`, `en_GB`, `fi`. Suggestions are the
//! dictionary words within edit distance 2, nearest first, ties in word
//! list order, preceded by any stored replacements.

use std::cell::RefCell;
use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::ptr;
use std::slice;
use std::sync::Arc;

use enchant_sys::{
    EnchantApi, EnchantBroker, EnchantDict, EnchantDictDescribeFn, EnchantLibrary, ssize_t,
};
use hashbrown::{HashMap, HashSet};

/// Version string reported by the fake library.
pub const VERSION: &str = "2.0.0-fake";

/// Provider name reported for every fake dictionary.
pub const PROVIDER_NAME: &str = "fake";

/// Word that makes `enchant_dict_check` fail with -1.
pub const ERROR_WORD: &str = "!error";

/// Word for which `enchant_dict_suggest` returns a non-NULL list of zero entries.
pub const EMPTY_LIST_WORD: &str = "~empty";

/// Word for which `enchant_dict_suggest` returns one non-UTF-8 suggestion.
pub const INVALID_UTF8_WORD: &str = "~latin1";

const PROVIDER_DESCRIPTION: &CStr = c"Fake provider";
const PROVIDER_FILE: &CStr = c"/fake/enchant_fake.so";
const VERSION_C: &CStr = c"2.0.0-fake";

const LANGUAGES: &[(&str, &[&str])] = &[
    ("en_US", &["hello", "help", "hell", "world", "word", "color", "spell", "check", "embedded\0nul"]),
    ("en_GB", &["hello", "help", "hell", "world", "word", "colour", "spell", "check"]),
    ("fi", &["koira", "kissa", "talo", "päivä"]),
];

/// Bookkeeping snapshot for the current thread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FakeStats {
    pub live_brokers: usize,
    pub live_dictionaries: usize,
    pub live_suggestion_lists: usize,
    pub exists_calls: usize,
    pub check_calls: usize,
    pub suggest_calls: usize,
    pub word_list_calls: usize,
    /// Frees of unknown, foreign, or already freed pointers, and calls on
    /// dead handles.
    pub violations: usize,
    /// Length argument of the last check call.
    pub last_word_len: Option<isize>,
}

#[derive(Default)]
struct FakeState {
    brokers: HashSet<usize>,
    /// dictionary address -> owning broker address
    dictionaries: HashMap<usize, usize>,
    /// list address -> allocated length (entries plus NULL terminator)
    suggestion_lists: HashMap<usize, usize>,
    calls: FakeStats,
    fail_next_init: bool,
    last_ordering: Option<(String, String)>,
}

struct FakeBroker {
    error: Option<CString>,
}

struct FakeDict {
    language: &'static str,
    words: &'static [&'static str],
    personal: HashSet<Vec<u8>>,
    excluded: HashSet<Vec<u8>>,
    session: HashSet<Vec<u8>>,
    session_excluded: HashSet<Vec<u8>>,
    replacements: Vec<(Vec<u8>, Vec<u8>)>,
    error: Option<CString>,
}

thread_local! {
    static STATE: RefCell<FakeState> = RefCell::new(FakeState::default());
}

/// Reset this thread's fake state and return a library backed by it.
pub fn library() -> Arc<EnchantLibrary> {
    STATE.with(|s| *s.borrow_mut() = FakeState::default());
    Arc::new(unsafe { EnchantLibrary::from_api(api(), "fake-enchant") })
}

/// The raw function table of the fake.
pub fn api() -> EnchantApi {
    EnchantApi {
        broker_init: fake_broker_init,
        broker_free: fake_broker_free,
        broker_request_dict: fake_broker_request_dict,
        broker_free_dict: fake_broker_free_dict,
        broker_dict_exists: fake_broker_dict_exists,
        broker_list_dicts: fake_broker_list_dicts,
        broker_set_ordering: fake_broker_set_ordering,
        broker_get_error: fake_broker_get_error,
        dict_check: fake_dict_check,
        dict_suggest: fake_dict_suggest,
        dict_free_string_list: fake_dict_free_string_list,
        dict_add: fake_dict_add,
        dict_add_to_session: fake_dict_add_to_session,
        dict_remove: fake_dict_remove,
        dict_remove_from_session: fake_dict_remove_from_session,
        dict_is_added: fake_dict_is_added,
        dict_is_removed: fake_dict_is_removed,
        dict_store_replacement: fake_dict_store_replacement,
        dict_get_error: fake_dict_get_error,
        dict_describe: fake_dict_describe,
        get_version: fake_get_version,
    }
}

/// Bookkeeping for the current thread.
pub fn stats() -> FakeStats {
    STATE.with(|s| {
        let s = s.borrow();
        FakeStats {
            live_brokers: s.brokers.len(),
            live_dictionaries: s.dictionaries.len(),
            live_suggestion_lists: s.suggestion_lists.len(),
            ..s.calls.clone()
        }
    })
}

/// Make the next `enchant_broker_init` return NULL.
pub fn fail_next_broker_init() {
    STATE.with(|s| s.borrow_mut().fail_next_init = true);
}

/// The last `(tag, ordering)` passed to `enchant_broker_set_ordering`.
pub fn last_ordering() -> Option<(String, String)> {
    STATE.with(|s| s.borrow().last_ordering.clone())
}

fn with_state<R>(f: impl FnOnce(&mut FakeState) -> R) -> R {
    STATE.with(|s| f(&mut s.borrow_mut()))
}

fn violation() {
    with_state(|s| s.calls.violations += 1);
}

/// Borrow a live fake broker, recording a violation for dead pointers.
unsafe fn broker_mut<'a>(broker: *mut EnchantBroker) -> Option<&'a mut FakeBroker> {
    if with_state(|s| s.brokers.contains(&(broker as usize))) {
        Some(unsafe { &mut *broker.cast::<FakeBroker>() })
    } else {
        violation();
        None
    }
}

/// Borrow a live fake dictionary, recording a violation for dead pointers.
unsafe fn dict_mut<'a>(dict: *mut EnchantDict) -> Option<&'a mut FakeDict> {
    if with_state(|s| s.dictionaries.contains_key(&(dict as usize))) {
        Some(unsafe { &mut *dict.cast::<FakeDict>() })
    } else {
        violation();
        None
    }
}

/// Word bytes from `(ptr, len)`; a negative length means NUL-terminated.
unsafe fn word_bytes<'a>(word: *const c_char, len: ssize_t) -> &'a [u8] {
    if word.is_null() {
        return &[];
    }
    if len < 0 {
        return unsafe { CStr::from_ptr(word) }.to_bytes();
    }
    unsafe { slice::from_raw_parts(word.cast::<u8>(), len as usize) }
}

unsafe fn tag_str<'a>(tag: *const c_char) -> Option<&'a str> {
    if tag.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(tag) }.to_str().ok()
}

fn language(tag: &str) -> Option<(&'static str, &'static [&'static str])> {
    LANGUAGES.iter().find(|(t, _)| *t == tag).copied()
}

fn edit_distance(a: &[u8], b: &[u8]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            cur[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

impl FakeDict {
    fn is_correct(&self, word: &[u8]) -> bool {
        if self.excluded.contains(word) || self.session_excluded.contains(word) {
            return false;
        }
        self.words.iter().any(|w| w.as_bytes() == word)
            || self.personal.contains(word)
            || self.session.contains(word)
    }

    fn suggestions(&self, word: &[u8]) -> Vec<Vec<u8>> {
        let mut out: Vec<Vec<u8>> = self
            .replacements
            .iter()
            .filter(|(mis, _)| mis == word)
            .map(|(_, cor)| cor.clone())
            .collect();

        let mut ranked: Vec<(usize, usize, &[u8])> = self
            .words
            .iter()
            .enumerate()
            .map(|(i, w)| (edit_distance(word, w.as_bytes()), i, w.as_bytes()))
            .filter(|(d, _, _)| *d <= 2)
            .collect();
        ranked.sort();

        for (_, _, w) in ranked {
            if !out.iter().any(|o| o == w) {
                out.push(w.to_vec());
            }
        }
        out
    }
}

// -- Broker -----------------------------------------------------------------

unsafe extern "C" fn fake_broker_init() -> *mut EnchantBroker {
    let fail = with_state(|s| std::mem::take(&mut s.fail_next_init));
    if fail {
        return ptr::null_mut();
    }
    let broker = Box::into_raw(Box::new(FakeBroker { error: None }));
    with_state(|s| s.brokers.insert(broker as usize));
    broker.cast()
}

unsafe extern "C" fn fake_broker_free(broker: *mut EnchantBroker) {
    let addr = broker as usize;
    let (known, orphans) = with_state(|s| {
        let known = s.brokers.remove(&addr);
        let orphans = s.dictionaries.values().filter(|&&owner| owner == addr).count();
        (known, orphans)
    });
    if !known || orphans > 0 {
        violation();
    }
    if known {
        drop(unsafe { Box::from_raw(broker.cast::<FakeBroker>()) });
    }
}

unsafe extern "C" fn fake_broker_request_dict(
    broker: *mut EnchantBroker,
    tag: *const c_char,
) -> *mut EnchantDict {
    let Some(fake) = (unsafe { broker_mut(broker) }) else {
        return ptr::null_mut();
    };
    let tag = unsafe { tag_str(tag) }.unwrap_or_default();
    let Some((language, words)) = language(tag) else {
        fake.error = CString::new(format!("no dictionary for {tag}")).ok();
        return ptr::null_mut();
    };
    let dict = Box::into_raw(Box::new(FakeDict {
        language,
        words,
        personal: HashSet::new(),
        excluded: HashSet::new(),
        session: HashSet::new(),
        session_excluded: HashSet::new(),
        replacements: Vec::new(),
        error: None,
    }));
    with_state(|s| s.dictionaries.insert(dict as usize, broker as usize));
    dict.cast()
}

unsafe extern "C" fn fake_broker_free_dict(broker: *mut EnchantBroker, dict: *mut EnchantDict) {
    let owned = with_state(|s| {
        if s.dictionaries.get(&(dict as usize)) == Some(&(broker as usize)) {
            s.dictionaries.remove(&(dict as usize));
            true
        } else {
            false
        }
    });
    if owned {
        drop(unsafe { Box::from_raw(dict.cast::<FakeDict>()) });
    } else {
        violation();
    }
}

unsafe extern "C" fn fake_broker_dict_exists(broker: *mut EnchantBroker, tag: *const c_char) -> c_int {
    if unsafe { broker_mut(broker) }.is_none() {
        return 0;
    }
    with_state(|s| s.calls.exists_calls += 1);
    let tag = unsafe { tag_str(tag) }.unwrap_or_default();
    c_int::from(language(tag).is_some())
}

unsafe extern "C" fn fake_broker_list_dicts(
    broker: *mut EnchantBroker,
    callback: EnchantDictDescribeFn,
    user_data: *mut c_void,
) {
    if unsafe { broker_mut(broker) }.is_none() {
        return;
    }
    for (tag, _) in LANGUAGES {
        let Ok(c_tag) = CString::new(*tag) else { continue };
        unsafe { describe(callback, &c_tag, user_data) };
    }
}

unsafe extern "C" fn fake_broker_set_ordering(
    broker: *mut EnchantBroker,
    tag: *const c_char,
    ordering: *const c_char,
) {
    if unsafe { broker_mut(broker) }.is_none() {
        return;
    }
    let tag = unsafe { tag_str(tag) }.unwrap_or_default().to_string();
    let ordering = unsafe { tag_str(ordering) }.unwrap_or_default().to_string();
    with_state(|s| s.last_ordering = Some((tag, ordering)));
}

unsafe extern "C" fn fake_broker_get_error(broker: *mut EnchantBroker) -> *const c_char {
    match unsafe { broker_mut(broker) } {
        Some(fake) => fake.error.as_ref().map_or(ptr::null(), |e| e.as_ptr()),
        None => ptr::null(),
    }
}

unsafe fn describe(callback: EnchantDictDescribeFn, tag: &CStr, user_data: *mut c_void) {
    let name = CString::new(PROVIDER_NAME).unwrap_or_default();
    unsafe {
        callback(
            tag.as_ptr(),
            name.as_ptr(),
            PROVIDER_DESCRIPTION.as_ptr(),
            PROVIDER_FILE.as_ptr(),
            user_data,
        );
    }
}

// -- Dictionary -------------------------------------------------------------

unsafe extern "C" fn fake_dict_check(dict: *mut EnchantDict, word: *const c_char, len: ssize_t) -> c_int {
    let Some(fake) = (unsafe { dict_mut(dict) }) else {
        return -1;
    };
    with_state(|s| {
        s.calls.check_calls += 1;
        s.calls.last_word_len = Some(len);
    });
    let word = unsafe { word_bytes(word, len) };
    if word == ERROR_WORD.as_bytes() {
        fake.error = Some(c"simulated checker failure".to_owned());
        return -1;
    }
    if fake.is_correct(word) { 0 } else { 1 }
}

unsafe extern "C" fn fake_dict_suggest(
    dict: *mut EnchantDict,
    word: *const c_char,
    len: ssize_t,
    out_n_suggs: *mut usize,
) -> *mut *mut c_char {
    if !out_n_suggs.is_null() {
        unsafe { *out_n_suggs = 0 };
    }
    let Some(fake) = (unsafe { dict_mut(dict) }) else {
        return ptr::null_mut();
    };
    with_state(|s| s.calls.suggest_calls += 1);
    let word = unsafe { word_bytes(word, len) };

    let suggestions = if word == INVALID_UTF8_WORD.as_bytes() {
        vec![b"caf\xff".to_vec()]
    } else if word == EMPTY_LIST_WORD.as_bytes() {
        Vec::new()
    } else {
        let found = fake.suggestions(word);
        if found.is_empty() {
            return ptr::null_mut();
        }
        found
    };

    let mut entries: Vec<*mut c_char> = suggestions
        .into_iter()
        .filter_map(|s| CString::new(s).ok())
        .map(CString::into_raw)
        .collect();
    let count = entries.len();
    entries.push(ptr::null_mut());
    let alloc_len = entries.len();
    let list = Box::into_raw(entries.into_boxed_slice()).cast::<*mut c_char>();

    with_state(|s| s.suggestion_lists.insert(list as usize, alloc_len));
    if !out_n_suggs.is_null() {
        unsafe { *out_n_suggs = count };
    }
    list
}

unsafe extern "C" fn fake_dict_free_string_list(dict: *mut EnchantDict, list: *mut *mut c_char) {
    if unsafe { dict_mut(dict) }.is_none() {
        return;
    }
    let Some(alloc_len) = with_state(|s| s.suggestion_lists.remove(&(list as usize))) else {
        violation();
        return;
    };
    let entries = unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(list, alloc_len)) };
    for &entry in entries.iter().filter(|e| !e.is_null()) {
        drop(unsafe { CString::from_raw(entry) });
    }
}

/// Shared body of the word-list setters.
unsafe fn word_list_update(
    dict: *mut EnchantDict,
    word: *const c_char,
    len: ssize_t,
    update: impl FnOnce(&mut FakeDict, Vec<u8>),
) {
    let Some(fake) = (unsafe { dict_mut(dict) }) else {
        return;
    };
    with_state(|s| s.calls.word_list_calls += 1);
    let word = unsafe { word_bytes(word, len) }.to_vec();
    update(fake, word);
}

unsafe extern "C" fn fake_dict_add(dict: *mut EnchantDict, word: *const c_char, len: ssize_t) {
    unsafe {
        word_list_update(dict, word, len, |d, w| {
            d.excluded.remove(&w);
            d.personal.insert(w);
        });
    }
}

unsafe extern "C" fn fake_dict_add_to_session(dict: *mut EnchantDict, word: *const c_char, len: ssize_t) {
    unsafe {
        word_list_update(dict, word, len, |d, w| {
            d.session_excluded.remove(&w);
            d.session.insert(w);
        });
    }
}

unsafe extern "C" fn fake_dict_remove(dict: *mut EnchantDict, word: *const c_char, len: ssize_t) {
    unsafe {
        word_list_update(dict, word, len, |d, w| {
            d.personal.remove(&w);
            d.excluded.insert(w);
        });
    }
}

unsafe extern "C" fn fake_dict_remove_from_session(
    dict: *mut EnchantDict,
    word: *const c_char,
    len: ssize_t,
) {
    unsafe {
        word_list_update(dict, word, len, |d, w| {
            d.session.remove(&w);
            d.session_excluded.insert(w);
        });
    }
}

unsafe extern "C" fn fake_dict_is_added(dict: *mut EnchantDict, word: *const c_char, len: ssize_t) -> c_int {
    let Some(fake) = (unsafe { dict_mut(dict) }) else {
        return 0;
    };
    with_state(|s| s.calls.word_list_calls += 1);
    let word = unsafe { word_bytes(word, len) };
    c_int::from(fake.personal.contains(word) || fake.session.contains(word))
}

unsafe extern "C" fn fake_dict_is_removed(dict: *mut EnchantDict, word: *const c_char, len: ssize_t) -> c_int {
    let Some(fake) = (unsafe { dict_mut(dict) }) else {
        return 0;
    };
    with_state(|s| s.calls.word_list_calls += 1);
    let word = unsafe { word_bytes(word, len) };
    c_int::from(fake.excluded.contains(word) || fake.session_excluded.contains(word))
}

unsafe extern "C" fn fake_dict_store_replacement(
    dict: *mut EnchantDict,
    mis: *const c_char,
    mis_len: ssize_t,
    cor: *const c_char,
    cor_len: ssize_t,
) {
    let Some(fake) = (unsafe { dict_mut(dict) }) else {
        return;
    };
    with_state(|s| s.calls.word_list_calls += 1);
    let mis = unsafe { word_bytes(mis, mis_len) }.to_vec();
    let cor = unsafe { word_bytes(cor, cor_len) }.to_vec();
    fake.replacements.push((mis, cor));
}

unsafe extern "C" fn fake_dict_get_error(dict: *mut EnchantDict) -> *const c_char {
    match unsafe { dict_mut(dict) } {
        Some(fake) => fake.error.as_ref().map_or(ptr::null(), |e| e.as_ptr()),
        None => ptr::null(),
    }
}

unsafe extern "C" fn fake_dict_describe(
    dict: *mut EnchantDict,
    callback: EnchantDictDescribeFn,
    user_data: *mut c_void,
) {
    let Some(fake) = (unsafe { dict_mut(dict) }) else {
        return;
    };
    let Ok(tag) = CString::new(fake.language) else {
        return;
    };
    unsafe { describe(callback, &tag, user_data) };
}

unsafe extern "C" fn fake_get_version() -> *const c_char {
    VERSION_C.as_ptr()
}
