//! Safe bindings for the Enchant spell checking library.
//!
//! Enchant's model has two handle types: a [`Broker`], which owns provider
//! state and hands out dictionaries, and a [`Dictionary`] for one language
//! tag, which checks words and produces suggestions. This crate wraps both
//! as owned values with tagged release state and marshals strings and
//! suggestion arrays across the C boundary. Spell checking itself happens
//! entirely inside Enchant and its providers.
//!
//! # Example
//!
//! ```no_run
//! use enchant::Broker;
//!
//! let mut broker = Broker::new()?;
//! if broker.dictionary_exists("en_US")? {
//!     let mut dict = broker.request_dictionary("en_US")?;
//!     assert!(dict.check("hello")?);
//!     println!("{:?}", dict.suggest("helo")?);
//!     broker.release_dictionary(&mut dict)?;
//! }
//! broker.release()?;
//! # Ok::<(), enchant::EnchantError>(())
//! ```
//!
//! # Architecture
//!
//! - [`broker`] -- broker lifecycle, dictionary provisioning, ownership checks
//! - [`dictionary`] -- check, suggest, personal word list, describe
//! - [`describe`] -- [`DictionaryInfo`] and the describe callback
//! - [`error`] -- [`EnchantError`] and [`InvalidState`]
//! - `marshal` -- tag/word conversion and the scoped suggestion list
//! - `testing` -- in-process fake of the C API (feature `testing`)
//!
//! # Lifecycle rules
//!
//! - A dictionary borrows its broker, so the broker outlives it and cannot be
//!   released while it exists.
//! - Dictionaries are released through the broker that created it; a foreign
//!   broker is rejected with [`InvalidState::ForeignDictionary`].
//! - Released handles reject every operation with an [`InvalidState`] error.
//! - Dropping a live handle releases it.

pub mod broker;
pub mod describe;
pub mod dictionary;
pub mod error;
mod handle;
mod marshal;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use broker::Broker;
pub use describe::DictionaryInfo;
pub use dictionary::Dictionary;
pub use enchant_sys::{EnchantLibrary, LoadError};
pub use error::{EnchantError, InvalidState, Result};
