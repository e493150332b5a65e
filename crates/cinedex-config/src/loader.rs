//! Environment-driven configuration loading.
//!
//! # Design
//! - Lookups go through an injected closure so tests never touch the process
//!   environment.
//! - Blank variables count as unset.

use std::fmt;
use std::path::PathBuf;

use tracing::debug;

use crate::defaults;
use crate::error::ConfigResult;
use crate::model::{ApiSettings, BrowseSettings, CatalogConfig, HttpSettings, StorageSettings};
use crate::validate::{
    parse_bounded_u64, parse_http_url, parse_language, parse_non_empty, parse_page_size,
};

/// Environment variable for the provider REST base URL.
pub const ENV_API_URL: &str = "CINEDEX_API_URL";
/// Environment variable for the image CDN base URL.
pub const ENV_IMAGE_URL: &str = "CINEDEX_IMAGE_URL";
/// Environment variable for the provider API key.
pub const ENV_API_KEY: &str = "CINEDEX_API_KEY";
/// Environment variable for the request language tag.
pub const ENV_LANGUAGE: &str = "CINEDEX_LANGUAGE";
/// Environment variable for the per-attempt deadline.
pub const ENV_HTTP_TIMEOUT_MS: &str = "CINEDEX_HTTP_TIMEOUT_MS";
/// Environment variable for the retry count.
pub const ENV_HTTP_RETRIES: &str = "CINEDEX_HTTP_RETRIES";
/// Environment variable for the initial page size.
pub const ENV_PAGE_SIZE: &str = "CINEDEX_PAGE_SIZE";
/// Environment variable for the search debounce window.
pub const ENV_DEBOUNCE_MS: &str = "CINEDEX_DEBOUNCE_MS";
/// Environment variable for the favorites file.
pub const ENV_FAVORITES_PATH: &str = "CINEDEX_FAVORITES_PATH";

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Builds a [`CatalogConfig`] from defaults overlaid with variable lookups.
pub struct ConfigLoader {
    lookup: Lookup,
}

impl fmt::Debug for ConfigLoader {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("ConfigLoader").finish_non_exhaustive()
    }
}

impl ConfigLoader {
    /// Read variables from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read variables through an arbitrary lookup function.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }

    /// Resolve and validate every section.
    ///
    /// # Errors
    /// Returns the first [`crate::ConfigError`] encountered.
    pub fn load(&self) -> ConfigResult<CatalogConfig> {
        let config = CatalogConfig {
            api: self.api()?,
            http: self.http()?,
            browse: self.browse()?,
            storage: self.storage()?,
        };
        debug!(
            base_url = %config.api.base_url,
            language = %config.api.language,
            has_api_key = config.api.has_api_key(),
            "configuration loaded"
        );
        Ok(config)
    }

    fn var(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn api(&self) -> ConfigResult<ApiSettings> {
        let base_url = self
            .var(ENV_API_URL)
            .unwrap_or_else(|| defaults::API_BASE_URL.to_string());
        let image_base_url = self
            .var(ENV_IMAGE_URL)
            .unwrap_or_else(|| defaults::IMAGE_BASE_URL.to_string());
        let language = self
            .var(ENV_LANGUAGE)
            .unwrap_or_else(|| defaults::LANGUAGE.to_string());
        let api_key = self
            .var(ENV_API_KEY)
            .map(|raw| parse_non_empty("api", "api_key", &raw))
            .transpose()?;
        Ok(ApiSettings {
            base_url: parse_http_url("api", "base_url", &base_url)?,
            image_base_url: parse_http_url("api", "image_base_url", &image_base_url)?,
            api_key,
            language: parse_language(&language)?,
        })
    }

    fn http(&self) -> ConfigResult<HttpSettings> {
        let timeout_ms = match self.var(ENV_HTTP_TIMEOUT_MS) {
            Some(raw) => parse_bounded_u64("http", "timeout_ms", &raw, 1, u64::from(u32::MAX))?,
            None => defaults::HTTP_TIMEOUT_MS,
        };
        let retries = match self.var(ENV_HTTP_RETRIES) {
            Some(raw) => {
                let value = parse_bounded_u64(
                    "http",
                    "retries",
                    &raw,
                    0,
                    u64::from(defaults::MAX_HTTP_RETRIES),
                )?;
                u32::try_from(value).unwrap_or(defaults::MAX_HTTP_RETRIES)
            }
            None => defaults::HTTP_RETRIES,
        };
        Ok(HttpSettings {
            timeout_ms,
            retries,
        })
    }

    fn browse(&self) -> ConfigResult<BrowseSettings> {
        let page_size = match self.var(ENV_PAGE_SIZE) {
            Some(raw) => parse_page_size(&raw)?,
            None => defaults::PAGE_SIZE,
        };
        let debounce_ms = match self.var(ENV_DEBOUNCE_MS) {
            Some(raw) => {
                parse_bounded_u64("browse", "debounce_ms", &raw, 0, defaults::MAX_DEBOUNCE_MS)?
            }
            None => defaults::DEBOUNCE_MS,
        };
        Ok(BrowseSettings {
            page_size,
            debounce_ms,
        })
    }

    fn storage(&self) -> ConfigResult<StorageSettings> {
        let favorites_path = match self.var(ENV_FAVORITES_PATH) {
            Some(raw) => PathBuf::from(parse_non_empty("storage", "favorites_path", &raw)?),
            None => PathBuf::from(defaults::FAVORITES_PATH),
        };
        Ok(StorageSettings {
            favorites_path,
            favorites_key: defaults::FAVORITES_KEY.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::ConfigError;

    fn loader(pairs: &[(&str, &str)]) -> ConfigLoader {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        ConfigLoader::from_lookup(move |key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = loader(&[]).load().unwrap();
        assert_eq!(config.api.base_url.as_str(), defaults::API_BASE_URL);
        assert_eq!(config.api.language, "en-US");
        assert!(config.api.api_key.is_none());
        assert_eq!(config.http.timeout_ms, 8_000);
        assert_eq!(config.http.retries, 1);
        assert_eq!(config.browse.page_size, 12);
        assert_eq!(config.browse.debounce_ms, 400);
        assert_eq!(config.storage.favorites_key, "cinedex.favorites");
    }

    #[test]
    fn blank_variables_are_treated_as_unset() {
        let config = loader(&[(ENV_API_KEY, "   "), (ENV_PAGE_SIZE, "")])
            .load()
            .unwrap();
        assert!(config.api.api_key.is_none());
        assert_eq!(config.browse.page_size, 12);
    }

    #[test]
    fn overrides_are_validated() {
        let config = loader(&[
            (ENV_API_URL, "http://127.0.0.1:9999/3/"),
            (ENV_API_KEY, "abc123"),
            (ENV_LANGUAGE, "pt-PT"),
            (ENV_HTTP_TIMEOUT_MS, "1500"),
            (ENV_HTTP_RETRIES, "0"),
            (ENV_PAGE_SIZE, "24"),
            (ENV_FAVORITES_PATH, "/tmp/favs.json"),
        ])
        .load()
        .unwrap();
        assert_eq!(config.api.base_url.as_str(), "http://127.0.0.1:9999/3");
        assert_eq!(config.api.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.http.timeout().as_millis(), 1_500);
        assert_eq!(config.http.retries, 0);
        assert_eq!(config.browse.page_size, 24);
        assert_eq!(config.storage.favorites_path, PathBuf::from("/tmp/favs.json"));
    }

    #[test]
    fn invalid_retry_count_is_reported_with_context() {
        let err = loader(&[(ENV_HTTP_RETRIES, "9")]).load().unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidField {
                section: "http",
                field: "retries",
                value: Some("9".to_string()),
                reason: "out of range",
            }
        );
    }
}
