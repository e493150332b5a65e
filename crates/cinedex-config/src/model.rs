//! Typed configuration sections consumed by the catalog and CLI crates.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use url::Url;

/// Fully validated configuration snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogConfig {
    /// Provider endpoints and request identity.
    pub api: ApiSettings,
    /// Request deadline and retry policy.
    pub http: HttpSettings,
    /// Client-side browsing defaults.
    pub browse: BrowseSettings,
    /// Local favorites persistence.
    pub storage: StorageSettings,
}

/// Provider endpoints and request identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiSettings {
    /// REST base URL; endpoint paths are appended to it.
    pub base_url: Url,
    /// Image CDN base URL.
    pub image_base_url: Url,
    /// Provider API key sent as the `api_key` query parameter.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Language tag in `ll-RR` form.
    pub language: String,
}

impl ApiSettings {
    /// Whether an API key has been configured.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Request deadline and retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HttpSettings {
    /// Per-attempt deadline in milliseconds.
    pub timeout_ms: u64,
    /// Extra attempts after a deadline expiry.
    pub retries: u32,
}

impl HttpSettings {
    /// Per-attempt deadline as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Client-side browsing defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BrowseSettings {
    /// Initial page size; always one of [`crate::defaults::PAGE_SIZES`].
    pub page_size: u32,
    /// Quiet period before typed input is processed, in milliseconds.
    pub debounce_ms: u64,
}

impl BrowseSettings {
    /// Debounce window as a [`Duration`].
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Local favorites persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageSettings {
    /// JSON file backing the key/value store.
    pub favorites_path: PathBuf,
    /// Key under which the favorites list is stored.
    pub favorites_key: String,
}
