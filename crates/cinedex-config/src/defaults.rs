//! Default values applied when the environment does not override a field.
//!
//! # Design
//! - Mirror the provider's public endpoints so a bare install talks to TMDB.
//! - Keep the supported page sizes here so the pagination engine and
//!   validation agree on one list.

/// Provider REST base URL.
pub const API_BASE_URL: &str = "https://api.themoviedb.org/3";
/// Provider image CDN base URL.
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
/// Language tag sent with every request.
pub const LANGUAGE: &str = "en-US";
/// Per-attempt request deadline in milliseconds.
pub const HTTP_TIMEOUT_MS: u64 = 8_000;
/// Extra attempts made after a deadline expiry.
pub const HTTP_RETRIES: u32 = 1;
/// Upper bound accepted for the retry count.
pub const MAX_HTTP_RETRIES: u32 = 5;
/// Page sizes offered by the client-side paginator.
pub const PAGE_SIZES: [u32; 4] = [6, 12, 24, 48];
/// Page size used on first load.
pub const PAGE_SIZE: u32 = 12;
/// Quiet period before typed search input triggers a query.
pub const DEBOUNCE_MS: u64 = 400;
/// Upper bound accepted for the debounce window.
pub const MAX_DEBOUNCE_MS: u64 = 5_000;
/// File backing the local key/value store.
pub const FAVORITES_PATH: &str = "cinedex-favorites.json";
/// Storage key holding the JSON list of favorite ids.
pub const FAVORITES_KEY: &str = "cinedex.favorites";
