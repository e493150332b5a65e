#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(
    missing_docs,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (provider JSON builders), mocks.rs (scripted transport, counting store).

pub mod fixtures;
pub mod mocks;

pub use mocks::{CountingStore, Route, ScriptedTransport, Step};
