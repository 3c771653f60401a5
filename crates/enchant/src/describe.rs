// Dictionary descriptions collected from Enchant's describe callbacks.

use std::ffi::{c_char, c_void};

use serde::Serialize;

use crate::marshal::copy_c_str;

/// A dictionary as reported by `enchant_broker_list_dicts` or
/// `enchant_dict_describe`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DictionaryInfo {
    /// Language tag, e.g. `en_GB`.
    pub language: String,
    /// Provider (backend) name, e.g. `hunspell`.
    pub provider_name: String,
    /// Human readable provider description.
    pub provider_description: String,
    /// Path of the provider module.
    pub provider_file: String,
}

/// Describe callback that appends to the `Vec<DictionaryInfo>` passed as
/// `user_data`.
pub(crate) unsafe extern "C" fn collect_into_vec(
    lang_tag: *const c_char,
    provider_name: *const c_char,
    provider_desc: *const c_char,
    provider_file: *const c_char,
    user_data: *mut c_void,
) {
    let Some(out) = (unsafe { user_data.cast::<Vec<DictionaryInfo>>().as_mut() }) else {
        return;
    };
    out.push(unsafe {
        DictionaryInfo {
            language: copy_c_str(lang_tag).unwrap_or_default(),
            provider_name: copy_c_str(provider_name).unwrap_or_default(),
            provider_description: copy_c_str(provider_desc).unwrap_or_default(),
            provider_file: copy_c_str(provider_file).unwrap_or_default(),
        }
    });
}
