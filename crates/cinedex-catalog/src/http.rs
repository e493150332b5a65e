//! Request helper with a per-attempt deadline, immediate retry on deadline
//! expiry, status validation and payload normalisation.
//!
//! # Design
//! - The network sits behind [`Transport`] so the policy here can be exercised
//!   without sockets.
//! - Every attempt races the caller's [`CancelToken`]; a cancelled call never
//!   retries.
//! - URLs are logged by path only; the query string carries the API key.

use std::time::Duration;

use async_trait::async_trait;
use cinedex_config::HttpSettings;
use cinedex_config::defaults::{HTTP_RETRIES, HTTP_TIMEOUT_MS};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::cancel::CancelToken;
use crate::error::{FetchError, FetchResult};

/// Raw response handed back by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Undecoded body bytes.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Response carrying a JSON document.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
        }
    }
}

/// Low-level failure reported by a [`Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// DNS, connect or connection-reset failures.
    #[error("connection failed: {detail}")]
    Connect {
        /// Client error detail.
        detail: String,
    },
    /// Any other client-side failure.
    #[error("transport failure: {detail}")]
    Other {
        /// Client error detail.
        detail: String,
    },
}

/// Issues a single GET; retries and deadlines are layered on top.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one GET against `url`.
    async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client that asks for JSON and identifies itself.
    ///
    /// # Errors
    /// Returns [`TransportError::Other`] when the TLS backend cannot be
    /// initialised.
    pub fn new() -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("cinedex/", env!("CARGO_PKG_VERSION"))),
        );
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| TransportError::Other {
                detail: format!("failed to build HTTP client: {err}"),
            })?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify_reqwest)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify_reqwest)?;
        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn classify_reqwest(err: reqwest::Error) -> TransportError {
    if err.is_connect() || err.is_request() {
        TransportError::Connect {
            detail: err.to_string(),
        }
    } else {
        TransportError::Other {
            detail: err.to_string(),
        }
    }
}

/// Deadline and retry policy for [`request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// Deadline applied to each attempt.
    pub timeout: Duration,
    /// Extra attempts after a deadline expiry.
    pub retries: u32,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(HTTP_TIMEOUT_MS),
            retries: HTTP_RETRIES,
        }
    }
}

impl From<&HttpSettings> for RequestOptions {
    fn from(settings: &HttpSettings) -> Self {
        Self {
            timeout: settings.timeout(),
            retries: settings.retries,
        }
    }
}

#[derive(Deserialize)]
struct ProviderError {
    status_message: Option<String>,
}

/// Perform a GET with deadline, retry and normalisation applied.
///
/// # Errors
/// - [`FetchError::Cancelled`] once `cancel` fires.
/// - [`FetchError::Timeout`] after `1 + options.retries` expired attempts.
/// - [`FetchError::NotFound`] / [`FetchError::Http`] for non-success statuses.
/// - [`FetchError::Network`] for connection failures.
/// - [`FetchError::Unknown`] for anything else, including undecodable bodies.
pub async fn request(
    transport: &dyn Transport,
    url: &Url,
    options: RequestOptions,
    cancel: &CancelToken,
) -> FetchResult<Value> {
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(FetchError::Cancelled),
            outcome = tokio::time::timeout(options.timeout, transport.get(url)) => outcome,
        };
        match outcome {
            Ok(Ok(response)) => {
                debug!(path = url.path(), status = response.status, attempt, "catalog response");
                return interpret(response);
            }
            Ok(Err(TransportError::Connect { detail })) => {
                return Err(FetchError::Network { detail });
            }
            Ok(Err(err)) => return Err(FetchError::unknown("transport", err)),
            Err(_elapsed) if attempt <= options.retries => {
                warn!(
                    path = url.path(),
                    attempt,
                    timeout_ms = u64::try_from(options.timeout.as_millis()).unwrap_or(u64::MAX),
                    "request deadline exceeded; retrying"
                );
            }
            Err(_elapsed) => return Err(FetchError::Timeout { attempts: attempt }),
        }
    }
}

fn interpret(response: TransportResponse) -> FetchResult<Value> {
    let status = response.status;
    if !(200..300).contains(&status) {
        if status == 404 {
            return Err(FetchError::NotFound);
        }
        let message = serde_json::from_slice::<ProviderError>(&response.body)
            .ok()
            .and_then(|body| body.status_message)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| format!("request failed with status {status}"));
        return Err(FetchError::Http { status, message });
    }

    let parsed = if response.body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&response.body)
            .map_err(|err| FetchError::unknown("decode response", err))?
    };
    Ok(normalize_payload(parsed))
}

/// Unwrap `{"data": [..]}` envelopes and turn an absent body into `[]`.
#[must_use]
pub fn normalize_payload(payload: Value) -> Value {
    match payload {
        Value::Null => Value::Array(Vec::new()),
        Value::Object(mut map) if map.get("data").is_some_and(Value::is_array) => {
            map.remove("data").unwrap_or_default()
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use serde_json::json;

    use super::*;

    struct StalledTransport {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Transport for StalledTransport {
        async fn get(&self, _url: &Url) -> Result<TransportResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    struct FixedTransport(Result<TransportResponse, fn() -> TransportError>);

    #[async_trait]
    impl Transport for FixedTransport {
        async fn get(&self, _url: &Url) -> Result<TransportResponse, TransportError> {
            match &self.0 {
                Ok(response) => Ok(response.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn url() -> Url {
        Url::parse("https://api.example.org/3/movie/popular?api_key=k").unwrap()
    }

    async fn fetch(transport: &dyn Transport) -> FetchResult<Value> {
        request(transport, &url(), RequestOptions::default(), &CancelToken::new()).await
    }

    #[test]
    fn normalize_unwraps_data_envelope() {
        assert_eq!(normalize_payload(json!({"data": [1, 2, 3]})), json!([1, 2, 3]));
        assert_eq!(normalize_payload(json!([1, 2, 3])), json!([1, 2, 3]));
        assert_eq!(normalize_payload(Value::Null), json!([]));
    }

    #[test]
    fn normalize_keeps_objects_without_list_data() {
        let page = json!({"page": 1, "results": []});
        assert_eq!(normalize_payload(page.clone()), page);
        let scalar_data = json!({"data": 5});
        assert_eq!(normalize_payload(scalar_data.clone()), scalar_data);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_with_one_retry_attempts_twice() {
        let transport = StalledTransport {
            calls: AtomicU32::new(0),
        };
        let err = fetch(&transport).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { attempts: 2 }));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_fails_after_first_deadline() {
        let transport = StalledTransport {
            calls: AtomicU32::new(0),
        };
        let options = RequestOptions {
            timeout: Duration::from_millis(50),
            retries: 0,
        };
        let err = request(&transport, &url(), options, &CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout { attempts: 1 }));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_a_stalled_attempt() {
        let transport = StalledTransport {
            calls: AtomicU32::new(0),
        };
        let token = CancelToken::new();
        let canceller = {
            let token = token.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                token.cancel();
            }
        };
        let target = url();
        let (result, ()) = tokio::join!(
            request(&transport, &target, RequestOptions::default(), &token),
            canceller
        );
        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn not_found_is_distinguished() {
        let transport = FixedTransport(Ok(TransportResponse::json(
            404,
            &json!({"status_message": "The resource you requested could not be found."}),
        )));
        assert!(matches!(fetch(&transport).await, Err(FetchError::NotFound)));
    }

    #[tokio::test]
    async fn provider_status_message_is_surfaced() {
        let transport = FixedTransport(Ok(TransportResponse::json(
            401,
            &json!({"status_code": 7, "status_message": "Invalid API key"}),
        )));
        match fetch(&transport).await {
            Err(FetchError::Http { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn opaque_error_body_falls_back_to_status() {
        let transport = FixedTransport(Ok(TransportResponse {
            status: 503,
            body: b"<html>busy</html>".to_vec(),
        }));
        match fetch(&transport).await {
            Err(FetchError::Http { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "request failed with status 503");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_success_body_normalizes_to_empty_list() {
        let transport = FixedTransport(Ok(TransportResponse {
            status: 200,
            body: Vec::new(),
        }));
        assert_eq!(fetch(&transport).await.unwrap(), json!([]));
    }

    #[tokio::test]
    async fn malformed_success_body_is_unknown() {
        let transport = FixedTransport(Ok(TransportResponse {
            status: 200,
            body: b"{not json".to_vec(),
        }));
        assert!(matches!(
            fetch(&transport).await,
            Err(FetchError::Unknown {
                operation: "decode response",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn connect_failures_map_to_network() {
        let transport = FixedTransport(Err(|| TransportError::Connect {
            detail: "connection refused".into(),
        }));
        assert!(matches!(fetch(&transport).await, Err(FetchError::Network { .. })));

        let transport = FixedTransport(Err(|| TransportError::Other {
            detail: "builder".into(),
        }));
        assert!(matches!(
            fetch(&transport).await,
            Err(FetchError::Unknown {
                operation: "transport",
                ..
            })
        ));
    }
}
