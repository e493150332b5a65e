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

//! Catalog exploration over the TMDB metadata API.
//!
//! Layout:
//! - `http.rs`: deadline/retry/normalisation helper over a pluggable [`Transport`]
//! - `service.rs`: endpoint parameter builders ([`CatalogService`])
//! - `pagination.rs` / `pipeline.rs`: pure client-side list transforms
//! - `storage.rs` / `favorites.rs`: local key/value persistence and the favorites set
//! - `debounce.rs`: quiet-period handling for typed search input
//! - `controller.rs`: the application state machine tying it all together
//! - `format.rs`: display helpers with fallbacks

pub mod cancel;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod favorites;
pub mod format;
pub mod genres;
pub mod http;
pub mod model;
pub mod pagination;
pub mod pipeline;
pub mod service;
pub mod storage;

pub use cancel::CancelToken;
pub use controller::{Applied, CatalogController, Phase, QueryOutcome, QueryTicket};
pub use debounce::{Debouncer, SearchInput};
pub use error::{FetchError, FetchResult, StorageError};
pub use favorites::FavoritesStore;
pub use http::{ReqwestTransport, RequestOptions, Transport, TransportError, TransportResponse};
pub use model::{
    DiscoverFilters, MediaItem, MediaItemDetails, MediaType, Movie, QueryParameters,
    SearchResultPage, Series, SortKey,
};
pub use pagination::{PageSize, Pagination, PaginationView};
pub use service::CatalogService;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
