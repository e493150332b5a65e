#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(
    missing_docs,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

//! Typed configuration for the Cinedex catalog explorer.
//!
//! Layout: `defaults.rs` (fallback values), `model.rs` (typed sections),
//! `loader.rs` (environment lookup), `validate.rs` (field parsing/validation).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use model::{ApiSettings, BrowseSettings, CatalogConfig, HttpSettings, StorageSettings};
