//! Raw C ABI for the Enchant spell checking library.
//!
//! Enchant is resolved at runtime rather than linked, so binaries built
//! against this crate start (and their tests run) on systems without the
//! library installed. All entry points the safe wrapper needs are resolved
//! up front into an [`EnchantApi`] table; a fake implementation can build
//! the same table from plain `extern "C"` functions.
//!
//! # Architecture
//!
//! - [`EnchantBroker`], [`EnchantDict`] -- opaque native handle types
//! - [`EnchantApi`] -- function pointer table mirroring `enchant.h`
//! - [`loader`] -- library search order and symbol resolution
//!
//! Ownership rules of the native API:
//! - A broker from `enchant_broker_init` is freed with `enchant_broker_free`.
//! - A dictionary from `enchant_broker_request_dict` is freed with
//!   `enchant_broker_free_dict` on the broker that created it.
//! - A suggestion list from `enchant_dict_suggest` is freed with
//!   `enchant_dict_free_string_list` on the dictionary that produced it.
//! - Error strings, describe callback arguments, and the version string are
//!   owned by Enchant and must not be freed.

use std::ffi::{c_char, c_int, c_void};
use std::marker::{PhantomData, PhantomPinned};

pub mod loader;

pub use loader::{EnchantLibrary, LIBRARY_ENV_VAR, LoadError, library_candidates};

/// `ssize_t` as used by Enchant's length parameters.
#[allow(non_camel_case_types)]
pub type ssize_t = isize;

/// Opaque `EnchantBroker`.
#[repr(C)]
pub struct EnchantBroker {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

/// Opaque `EnchantDict`.
#[repr(C)]
pub struct EnchantDict {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

/// Callback for `enchant_broker_list_dicts` and `enchant_dict_describe`.
///
/// Arguments: language tag, provider name, provider description, provider
/// file, user data. All strings are borrowed for the duration of the call.
pub type EnchantDictDescribeFn = unsafe extern "C" fn(
    lang_tag: *const c_char,
    provider_name: *const c_char,
    provider_desc: *const c_char,
    provider_file: *const c_char,
    user_data: *mut c_void,
);

/// Function pointer table for every Enchant entry point this workspace uses.
///
/// Field names follow the C symbol names without the `enchant_` prefix.
#[derive(Clone, Copy)]
pub struct EnchantApi {
    // -- Broker --
    pub broker_init: unsafe extern "C" fn() -> *mut EnchantBroker,
    pub broker_free: unsafe extern "C" fn(broker: *mut EnchantBroker),
    pub broker_request_dict:
        unsafe extern "C" fn(broker: *mut EnchantBroker, tag: *const c_char) -> *mut EnchantDict,
    pub broker_free_dict: unsafe extern "C" fn(broker: *mut EnchantBroker, dict: *mut EnchantDict),
    pub broker_dict_exists:
        unsafe extern "C" fn(broker: *mut EnchantBroker, tag: *const c_char) -> c_int,
    pub broker_list_dicts: unsafe extern "C" fn(
        broker: *mut EnchantBroker,
        callback: EnchantDictDescribeFn,
        user_data: *mut c_void,
    ),
    pub broker_set_ordering: unsafe extern "C" fn(
        broker: *mut EnchantBroker,
        tag: *const c_char,
        ordering: *const c_char,
    ),
    pub broker_get_error: unsafe extern "C" fn(broker: *mut EnchantBroker) -> *const c_char,

    // -- Dictionary --
    pub dict_check:
        unsafe extern "C" fn(dict: *mut EnchantDict, word: *const c_char, len: ssize_t) -> c_int,
    pub dict_suggest: unsafe extern "C" fn(
        dict: *mut EnchantDict,
        word: *const c_char,
        len: ssize_t,
        out_n_suggs: *mut usize,
    ) -> *mut *mut c_char,
    pub dict_free_string_list:
        unsafe extern "C" fn(dict: *mut EnchantDict, string_list: *mut *mut c_char),
    pub dict_add: unsafe extern "C" fn(dict: *mut EnchantDict, word: *const c_char, len: ssize_t),
    pub dict_add_to_session:
        unsafe extern "C" fn(dict: *mut EnchantDict, word: *const c_char, len: ssize_t),
    pub dict_remove:
        unsafe extern "C" fn(dict: *mut EnchantDict, word: *const c_char, len: ssize_t),
    pub dict_remove_from_session:
        unsafe extern "C" fn(dict: *mut EnchantDict, word: *const c_char, len: ssize_t),
    pub dict_is_added:
        unsafe extern "C" fn(dict: *mut EnchantDict, word: *const c_char, len: ssize_t) -> c_int,
    pub dict_is_removed:
        unsafe extern "C" fn(dict: *mut EnchantDict, word: *const c_char, len: ssize_t) -> c_int,
    pub dict_store_replacement: unsafe extern "C" fn(
        dict: *mut EnchantDict,
        mis: *const c_char,
        mis_len: ssize_t,
        cor: *const c_char,
        cor_len: ssize_t,
    ),
    pub dict_get_error: unsafe extern "C" fn(dict: *mut EnchantDict) -> *const c_char,
    pub dict_describe: unsafe extern "C" fn(
        dict: *mut EnchantDict,
        callback: EnchantDictDescribeFn,
        user_data: *mut c_void,
    ),

    // -- Library --
    pub get_version: unsafe extern "C" fn() -> *const c_char,
}

impl std::fmt::Debug for EnchantApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnchantApi").finish_non_exhaustive()
    }
}
