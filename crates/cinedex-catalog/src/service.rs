//! Endpoint builders for the catalog provider.
//!
//! Every call appends `api_key` and `language`, delegates to
//! [`http::request`](crate::http::request) and decodes the normalised payload.
//! Failures pass through untouched; this layer never retries.

use std::fmt;
use std::sync::Arc;

use cinedex_config::{ApiSettings, CatalogConfig};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::cancel::CancelToken;
use crate::error::{FetchError, FetchResult};
use crate::http::{self, ReqwestTransport, RequestOptions, Transport, TransportError};
use crate::model::{
    DiscoverFilters, MediaItem, MediaItemDetails, MediaType, Movie, MovieDetails,
    SearchResultPage, Series, SeriesDetails,
};

/// Query service over a [`Transport`].
#[derive(Clone)]
pub struct CatalogService {
    transport: Arc<dyn Transport>,
    base_url: Url,
    api_key: Option<String>,
    language: String,
    options: RequestOptions,
}

impl fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogService")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("language", &self.language)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct RawPage {
    #[serde(default = "first_page")]
    page: u32,
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    total_pages: u32,
    #[serde(default)]
    total_results: u64,
}

const fn first_page() -> u32 {
    1
}

impl CatalogService {
    /// Service over an explicit transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, api: &ApiSettings, options: RequestOptions) -> Self {
        Self {
            transport,
            base_url: api.base_url.clone(),
            api_key: api.api_key.clone(),
            language: api.language.clone(),
            options,
        }
    }

    /// Service over a fresh [`ReqwestTransport`] configured from `config`.
    ///
    /// # Errors
    /// Returns the transport error when the HTTP client cannot be built.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new()?;
        Ok(Self::new(
            Arc::new(transport),
            &config.api,
            RequestOptions::from(&config.http),
        ))
    }

    /// Deadline and retry policy applied to every call.
    #[must_use]
    pub const fn options(&self) -> RequestOptions {
        self.options
    }

    /// Free-text search. A blank term yields [`SearchResultPage::empty`]
    /// without touching the network.
    ///
    /// # Errors
    /// Propagates any [`FetchError`] from the request.
    #[instrument(name = "catalog.search", skip(self, cancel))]
    pub async fn search_by_text(
        &self,
        term: &str,
        media_type: MediaType,
        page: u32,
        cancel: &CancelToken,
    ) -> FetchResult<SearchResultPage> {
        let term = term.trim();
        if term.is_empty() {
            debug!("blank search term; skipping request");
            return Ok(SearchResultPage::empty());
        }
        let path = format!("/search/{}", media_type.path_segment());
        let params = [("query", term.to_string()), ("page", page.max(1).to_string())];
        let payload = self.fetch(&path, &params, cancel).await?;
        decode_page(payload, media_type)
    }

    /// Server-side filtered and ordered listing.
    ///
    /// # Errors
    /// Propagates any [`FetchError`] from the request.
    #[instrument(name = "catalog.discover", skip(self, filters, cancel))]
    pub async fn discover(
        &self,
        media_type: MediaType,
        page: u32,
        filters: &DiscoverFilters,
        cancel: &CancelToken,
    ) -> FetchResult<SearchResultPage> {
        let path = format!("/discover/{}", media_type.path_segment());
        let params = discover_params(media_type, page, filters);
        let payload = self.fetch(&path, &params, cancel).await?;
        decode_page(payload, media_type)
    }

    /// Currently popular titles.
    ///
    /// # Errors
    /// Propagates any [`FetchError`] from the request.
    pub async fn popular(
        &self,
        media_type: MediaType,
        page: u32,
        cancel: &CancelToken,
    ) -> FetchResult<SearchResultPage> {
        let path = format!("/{}/popular", media_type.path_segment());
        self.list_feed(&path, media_type, page, cancel).await
    }

    /// Films currently in theatres.
    ///
    /// # Errors
    /// Propagates any [`FetchError`] from the request.
    pub async fn now_playing(&self, page: u32, cancel: &CancelToken) -> FetchResult<SearchResultPage> {
        self.list_feed("/movie/now_playing", MediaType::Movie, page, cancel)
            .await
    }

    /// Films releasing soon.
    ///
    /// # Errors
    /// Propagates any [`FetchError`] from the request.
    pub async fn upcoming(&self, page: u32, cancel: &CancelToken) -> FetchResult<SearchResultPage> {
        self.list_feed("/movie/upcoming", MediaType::Movie, page, cancel)
            .await
    }

    /// Extended record for one title.
    ///
    /// # Errors
    /// [`FetchError::NotFound`] for unknown ids, otherwise any request failure.
    #[instrument(name = "catalog.details", skip(self, cancel))]
    pub async fn details(
        &self,
        media_type: MediaType,
        id: u64,
        cancel: &CancelToken,
    ) -> FetchResult<MediaItemDetails> {
        let path = format!("/{}/{id}", media_type.path_segment());
        let payload = self.fetch(&path, &[], cancel).await?;
        match media_type {
            MediaType::Movie => decode::<MovieDetails>(payload, "decode details")
                .map(MediaItemDetails::Movie),
            MediaType::Series => decode::<SeriesDetails>(payload, "decode details")
                .map(MediaItemDetails::Series),
        }
    }

    async fn list_feed(
        &self,
        path: &str,
        media_type: MediaType,
        page: u32,
        cancel: &CancelToken,
    ) -> FetchResult<SearchResultPage> {
        let params = [("page", page.max(1).to_string())];
        let payload = self.fetch(path, &params, cancel).await?;
        decode_page(payload, media_type)
    }

    async fn fetch(
        &self,
        path: &str,
        params: &[(&str, String)],
        cancel: &CancelToken,
    ) -> FetchResult<Value> {
        let url = self.endpoint(path, params)?;
        http::request(self.transport.as_ref(), &url, self.options, cancel).await
    }

    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> FetchResult<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}{path}"))
            .map_err(|err| FetchError::unknown("build url", err))?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(key) = &self.api_key {
                query.append_pair("api_key", key);
            }
            query.append_pair("language", &self.language);
            for (name, value) in params {
                query.append_pair(name, value);
            }
        }
        Ok(url)
    }
}

fn discover_params(
    media_type: MediaType,
    page: u32,
    filters: &DiscoverFilters,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("page", page.max(1).to_string()),
        ("sort_by", filters.sort_key.as_str().to_string()),
    ];
    if media_type == MediaType::Movie {
        params.push(("include_adult", "false".to_string()));
    }
    if !filters.genre_ids.is_empty() {
        let joined = filters
            .genre_ids
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        params.push(("with_genres", joined));
    }
    let (lower, upper) = match media_type {
        MediaType::Movie => ("primary_release_date.gte", "primary_release_date.lte"),
        MediaType::Series => ("first_air_date.gte", "first_air_date.lte"),
    };
    if let Some(year) = filters.year_from {
        params.push((lower, format!("{year:04}-01-01")));
    }
    if let Some(year) = filters.year_to {
        params.push((upper, format!("{year:04}-12-31")));
    }
    params
}

fn decode<T: DeserializeOwned>(payload: Value, operation: &'static str) -> FetchResult<T> {
    serde_json::from_value(payload).map_err(|err| FetchError::unknown(operation, err))
}

fn decode_page(payload: Value, media_type: MediaType) -> FetchResult<SearchResultPage> {
    let raw = match payload {
        Value::Array(results) => RawPage {
            page: 1,
            total_pages: u32::from(!results.is_empty()),
            total_results: u64::try_from(results.len()).unwrap_or(u64::MAX),
            results,
        },
        other => decode::<RawPage>(other, "decode page")?,
    };
    let items = raw
        .results
        .into_iter()
        .map(|value| match media_type {
            MediaType::Movie => decode::<Movie>(value, "decode item").map(MediaItem::Movie),
            MediaType::Series => decode::<Series>(value, "decode item").map(MediaItem::Series),
        })
        .collect::<FetchResult<Vec<_>>>()?;
    Ok(SearchResultPage {
        page: raw.page.max(1),
        items,
        total_pages: raw.total_pages,
        total_results: raw.total_results,
    })
}
