//! Shared client utilities, error types and configuration wiring for the CLI.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use anyhow::anyhow;
use cinedex_catalog::{
    CatalogService, FavoritesStore, FetchError, FileStore, PageSize, RequestOptions, Transport,
};
use cinedex_config::loader::{
    ENV_API_KEY, ENV_API_URL, ENV_FAVORITES_PATH, ENV_HTTP_RETRIES, ENV_HTTP_TIMEOUT_MS,
    ENV_LANGUAGE, ENV_PAGE_SIZE,
};
use cinedex_config::{CatalogConfig, ConfigLoader};

use crate::cli::{GlobalArgs, OutputFormat};

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    /// Catalog failures surface the same message an end user would see.
    pub(crate) fn fetch(error: &FetchError) -> Self {
        tracing::debug!(error = %error, "catalog request failed");
        Self::Failure(anyhow!(error.user_message()))
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Variable lookup used as the fallback beneath command-line flags.
pub(crate) type Lookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolve configuration from flags first, then `fallback`.
pub(crate) fn load_config(global: &GlobalArgs, fallback: Lookup) -> CliResult<CatalogConfig> {
    let overrides = flag_overrides(global);
    ConfigLoader::from_lookup(move |name| {
        overrides
            .get(name)
            .cloned()
            .or_else(|| fallback(name))
    })
    .load()
    .map_err(|err| CliError::validation(err.to_string()))
}

fn flag_overrides(global: &GlobalArgs) -> HashMap<&'static str, String> {
    let pairs = [
        (ENV_API_URL, global.api_url.clone()),
        (ENV_API_KEY, global.api_key.clone()),
        (ENV_LANGUAGE, global.language.clone()),
        (ENV_HTTP_TIMEOUT_MS, global.timeout_ms.map(|value| value.to_string())),
        (ENV_HTTP_RETRIES, global.retries.map(|value| value.to_string())),
        (ENV_PAGE_SIZE, global.page_size.map(|value| value.to_string())),
        (
            ENV_FAVORITES_PATH,
            global
                .favorites_file
                .as_ref()
                .map(|path| path.display().to_string()),
        ),
    ];
    pairs
        .into_iter()
        .filter_map(|(name, value)| value.map(|value| (name, value)))
        .collect()
}

/// Application context passed to command handlers.
#[derive(Debug, Clone)]
pub(crate) struct AppContext {
    pub(crate) config: CatalogConfig,
    pub(crate) service: CatalogService,
    pub(crate) output: OutputFormat,
}

impl AppContext {
    pub(crate) fn new(
        config: CatalogConfig,
        transport: Arc<dyn Transport>,
        output: OutputFormat,
    ) -> Self {
        let service = CatalogService::new(
            transport,
            &config.api,
            RequestOptions::from(&config.http),
        );
        Self {
            config,
            service,
            output,
        }
    }

    /// Favorites backed by the configured JSON file.
    pub(crate) fn favorites(&self) -> FavoritesStore {
        let storage = &self.config.storage;
        FavoritesStore::load(
            Box::new(FileStore::new(&storage.favorites_path)),
            storage.favorites_key.clone(),
        )
    }

    pub(crate) fn page_size(&self) -> PageSize {
        PageSize::new(self.config.browse.page_size).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn global() -> GlobalArgs {
        GlobalArgs {
            api_url: None,
            api_key: None,
            language: None,
            timeout_ms: None,
            retries: None,
            favorites_file: None,
            page_size: None,
            output: OutputFormat::Table,
            log_format: None,
            log_level: None,
        }
    }

    fn env(pairs: &[(&str, &str)]) -> Lookup {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect();
        Arc::new(move |name: &str| map.get(name).cloned())
    }

    #[test]
    fn flags_override_environment() {
        let mut args = global();
        args.language = Some("fr-FR".into());
        args.retries = Some(3);
        args.favorites_file = Some(PathBuf::from("/tmp/favs.json"));
        let config = load_config(
            &args,
            env(&[("CINEDEX_LANGUAGE", "de-DE"), ("CINEDEX_API_KEY", "from-env")]),
        )
        .unwrap();
        assert_eq!(config.api.language, "fr-FR");
        assert_eq!(config.api.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.http.retries, 3);
        assert_eq!(config.storage.favorites_path, PathBuf::from("/tmp/favs.json"));
    }

    #[test]
    fn invalid_configuration_is_a_validation_error() {
        let err = load_config(&global(), env(&[("CINEDEX_HTTP_RETRIES", "99")])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.display_message().contains("retries"));
    }

    #[test]
    fn fetch_errors_use_user_messages() {
        let err = CliError::fetch(&FetchError::Timeout { attempts: 2 });
        assert_eq!(err.exit_code(), 3);
        assert_eq!(
            err.display_message(),
            "The request timed out. Please try again."
        );
    }
}
