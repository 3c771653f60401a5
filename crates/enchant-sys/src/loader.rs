// Runtime loading of the Enchant shared library.
//
// Search order:
// 1. Explicit path from the caller (if provided)
// 2. `ENCHANT_LIBRARY` environment variable
// 3. Platform default library names (resolved by the system loader)

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::EnchantApi;

/// Environment variable naming the Enchant shared library to load.
pub const LIBRARY_ENV_VAR: &str = "ENCHANT_LIBRARY";

#[cfg(target_os = "linux")]
const DEFAULT_NAMES: &[&str] = &[
    "libenchant-2.so.2",
    "libenchant-2.so",
    "libenchant.so.1",
    "libenchant.so",
];

#[cfg(target_os = "macos")]
const DEFAULT_NAMES: &[&str] = &[
    "libenchant-2.2.dylib",
    "libenchant-2.dylib",
    "/opt/homebrew/lib/libenchant-2.dylib",
    "/usr/local/lib/libenchant-2.dylib",
    "/opt/local/lib/libenchant-2.dylib",
];

#[cfg(target_os = "windows")]
const DEFAULT_NAMES: &[&str] = &["libenchant-2-2.dll", "libenchant-2.dll", "enchant-2.dll"];

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const DEFAULT_NAMES: &[&str] = &["libenchant-2.so", "libenchant.so"];

/// Error type for locating and binding the native library.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// No candidate could be opened.
    #[error("could not open the enchant library (tried: {})", .tried.join("; "))]
    NotFound { tried: Vec<String> },

    /// A library was opened but lacks an entry point we need.
    #[error("{path} does not export `{symbol}`: {source}")]
    MissingSymbol {
        path: String,
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },
}

/// Build the ordered list of library candidates.
///
/// `env_value` is the value of [`LIBRARY_ENV_VAR`], passed in so callers
/// (and tests) control where it comes from. Empty values are ignored.
pub fn library_candidates(explicit: Option<&Path>, env_value: Option<OsString>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(p) = explicit {
        paths.push(p.to_path_buf());
    }

    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        let path = PathBuf::from(value);
        if !paths.contains(&path) {
            paths.push(path);
        }
    }

    paths.extend(DEFAULT_NAMES.iter().map(PathBuf::from));
    paths
}

/// A loaded Enchant library: the resolved function table plus the library
/// handle that keeps those functions mapped.
pub struct EnchantLibrary {
    api: EnchantApi,
    origin: String,
    _library: Option<libloading::Library>,
}

impl EnchantLibrary {
    /// Load Enchant using the environment variable and platform defaults.
    pub fn load() -> Result<Self, LoadError> {
        Self::load_from(None)
    }

    /// Load Enchant, trying `explicit` before the default search order.
    pub fn load_from(explicit: Option<&Path>) -> Result<Self, LoadError> {
        let candidates = library_candidates(explicit, std::env::var_os(LIBRARY_ENV_VAR));
        Self::open_first(&candidates)
    }

    /// Load Enchant from exactly this path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::open_first(&[path.as_ref().to_path_buf()])
    }

    /// Wrap a function table that does not come from a shared library.
    ///
    /// # Safety
    ///
    /// Every function in `api` must honour the Enchant C contract described
    /// in the crate documentation: handles it returns stay valid until freed
    /// through the matching function, returned strings are NUL-terminated,
    /// and suggestion lists hold exactly the reported number of entries.
    pub unsafe fn from_api(api: EnchantApi, origin: impl Into<String>) -> Self {
        Self { api, origin: origin.into(), _library: None }
    }

    /// The resolved function table.
    pub fn api(&self) -> &EnchantApi {
        &self.api
    }

    /// Where the functions came from (library path, or the name given to
    /// [`from_api`](Self::from_api)).
    pub fn origin(&self) -> &str {
        &self.origin
    }

    fn open_first(candidates: &[PathBuf]) -> Result<Self, LoadError> {
        let mut tried = Vec::with_capacity(candidates.len());

        for path in candidates {
            trace!(path = %path.display(), "trying enchant library candidate");
            // Loading runs the library's initialisers; every candidate is an
            // Enchant build by construction of the search list.
            match unsafe { libloading::Library::new(path) } {
                Ok(library) => {
                    let origin = path.display().to_string();
                    let api = resolve_api(&library, &origin)?;
                    debug!(library = %origin, "loaded enchant library");
                    return Ok(Self { api, origin, _library: Some(library) });
                }
                Err(e) => tried.push(format!("{} ({e})", path.display())),
            }
        }

        Err(LoadError::NotFound { tried })
    }
}

impl std::fmt::Debug for EnchantLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnchantLibrary").field("origin", &self.origin).finish_non_exhaustive()
    }
}

fn symbol<T: Copy>(
    library: &libloading::Library,
    origin: &str,
    name: &'static str,
) -> Result<T, LoadError> {
    // The field type the result is assigned to is the C prototype from enchant.h.
    let sym = unsafe { library.get::<T>(name.as_bytes()) }.map_err(|source| {
        LoadError::MissingSymbol { path: origin.to_string(), symbol: name, source }
    })?;
    Ok(*sym)
}

fn resolve_api(library: &libloading::Library, origin: &str) -> Result<EnchantApi, LoadError> {
    Ok(EnchantApi {
        broker_init: symbol(library, origin, "enchant_broker_init")?,
        broker_free: symbol(library, origin, "enchant_broker_free")?,
        broker_request_dict: symbol(library, origin, "enchant_broker_request_dict")?,
        broker_free_dict: symbol(library, origin, "enchant_broker_free_dict")?,
        broker_dict_exists: symbol(library, origin, "enchant_broker_dict_exists")?,
        broker_list_dicts: symbol(library, origin, "enchant_broker_list_dicts")?,
        broker_set_ordering: symbol(library, origin, "enchant_broker_set_ordering")?,
        broker_get_error: symbol(library, origin, "enchant_broker_get_error")?,
        dict_check: symbol(library, origin, "enchant_dict_check")?,
        dict_suggest: symbol(library, origin, "enchant_dict_suggest")?,
        dict_free_string_list: symbol(library, origin, "enchant_dict_free_string_list")?,
        dict_add: symbol(library, origin, "enchant_dict_add")?,
        dict_add_to_session: symbol(library, origin, "enchant_dict_add_to_session")?,
        dict_remove: symbol(library, origin, "enchant_dict_remove")?,
        dict_remove_from_session: symbol(library, origin, "enchant_dict_remove_from_session")?,
        dict_is_added: symbol(library, origin, "enchant_dict_is_added")?,
        dict_is_removed: symbol(library, origin, "enchant_dict_is_removed")?,
        dict_store_replacement: symbol(library, origin, "enchant_dict_store_replacement")?,
        dict_get_error: symbol(library, origin, "enchant_dict_get_error")?,
        dict_describe: symbol(library, origin, "enchant_dict_describe")?,
        get_version: symbol(library, origin, "enchant_get_version")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_without_overrides_are_platform_defaults() {
        let paths = library_candidates(None, None);
        let expected: Vec<PathBuf> = DEFAULT_NAMES.iter().map(PathBuf::from).collect();
        assert_eq!(paths, expected);
    }

    #[test]
    fn explicit_path_comes_first_then_env() {
        let paths = library_candidates(
            Some(Path::new("/opt/enchant/libenchant-2.so")),
            Some(OsString::from("/custom/libenchant.so")),
        );
        assert_eq!(paths[0], PathBuf::from("/opt/enchant/libenchant-2.so"));
        assert_eq!(paths[1], PathBuf::from("/custom/libenchant.so"));
        assert_eq!(paths.len(), DEFAULT_NAMES.len() + 2);
    }

    #[test]
    fn empty_env_value_is_ignored() {
        let paths = library_candidates(None, Some(OsString::new()));
        assert_eq!(paths.len(), DEFAULT_NAMES.len());
    }

    #[test]
    fn env_value_equal_to_explicit_is_not_repeated() {
        let paths = library_candidates(
            Some(Path::new("/x/libenchant.so")),
            Some(OsString::from("/x/libenchant.so")),
        );
        assert_eq!(paths.iter().filter(|p| *p == Path::new("/x/libenchant.so")).count(), 1);
    }

    #[test]
    fn open_missing_file_reports_not_found_with_path() {
        let err = EnchantLibrary::open("/nonexistent/dir/libenchant-missing.so").unwrap_err();
        match &err {
            LoadError::NotFound { tried } => {
                assert_eq!(tried.len(), 1);
                assert!(tried[0].contains("/nonexistent/dir/libenchant-missing.so"));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert!(err.to_string().starts_with("could not open the enchant library"));
    }

    #[test]
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    fn non_enchant_library_reports_first_missing_symbol() {
        let err = EnchantLibrary::open("libc.so.6").unwrap_err();
        match &err {
            LoadError::MissingSymbol { path, symbol, .. } => {
                assert_eq!(path, "libc.so.6");
                assert_eq!(*symbol, "enchant_broker_init");
            }
            other => panic!("expected MissingSymbol, got {other:?}"),
        }
        assert!(err.to_string().starts_with("libc.so.6 does not export `enchant_broker_init`"));
    }
}
