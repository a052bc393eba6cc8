//! Resilient Cloudflare HTTP client
//!
//! Issues REST calls with auth injection and retry-with-backoff, and
//! exposes a raw/parsed dual interface: [`CloudflareClient::request`]
//! returns the transport response, [`CloudflareClient::make_request`]
//! parses the envelope. HTTP error statuses never become `Err` here; only
//! transport and parse failures do.

use std::sync::Arc;
use std::time::Duration;

use cloudgate_domain::{CloudflareError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::{Client as ReqwestClient, Method, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use super::response::ApiResponse;
use crate::auth::CredentialResolver;

/// Production endpoint for the Cloudflare v4 REST API.
pub const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_RETRIES: u32 = 3;
const BASE_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Per-request options: JSON body, query parameters, extra headers.
///
/// Caller headers are applied first and auth headers overlaid after, so a
/// caller can never displace the active auth scheme.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    json: Option<Value>,
    query: Vec<(String, String)>,
    headers: HeaderMap,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// HTTP client for the Cloudflare REST API with built-in retry.
#[derive(Clone)]
pub struct CloudflareClient {
    http: ReqwestClient,
    base_url: String,
    auth: Arc<CredentialResolver>,
    base_retry_delay: Duration,
}

impl CloudflareClient {
    /// Client against the production API.
    pub fn new(auth: Arc<CredentialResolver>) -> Result<Self> {
        Self::with_base_url(auth, DEFAULT_BASE_URL)
    }

    /// Client against a custom base URL (tests point this at a mock
    /// server).
    pub fn with_base_url(auth: Arc<CredentialResolver>, base_url: impl Into<String>) -> Result<Self> {
        let http = ReqwestClient::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                CloudflareError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            base_retry_delay: BASE_RETRY_DELAY,
        })
    }

    /// Override the backoff base delay (tests shrink this to keep retry
    /// scenarios fast).
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.base_retry_delay = delay;
        self
    }

    pub fn auth(&self) -> &CredentialResolver {
        &self.auth
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a raw request, retrying per policy.
    ///
    /// Retries on 429, 5xx, and connection-level transport errors, up to 3
    /// retries (4 attempts). Other statuses, including 4xx, return the
    /// response as-is. A transport failure that survives the retry budget
    /// is wrapped with the method and endpoint that was attempted.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Response> {
        // Covers lazily-configured settings: one refresh before giving up.
        if !self.auth.has_credentials() {
            self.auth.refresh_credentials();
        }
        let auth_headers = self.auth.auth_headers()?;
        let url = self.url_for(endpoint);

        let mut retries: u32 = 0;
        loop {
            let builder = self.build_request(&method, &url, &options, &auth_headers);

            debug!(attempt = retries + 1, %method, endpoint, "sending Cloudflare request");
            match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt = retries + 1, %method, endpoint, %status, "received Cloudflare response");

                    if retryable_status(status) && retries < MAX_RETRIES {
                        let delay = self.retry_delay(status, response.headers(), retries);
                        warn!(%method, endpoint, %status, delay_ms = delay.as_millis() as u64, "retrying Cloudflare request");
                        retries += 1;
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    return Ok(response);
                }
                Err(err) => {
                    if is_connection_error(&err) && retries < MAX_RETRIES {
                        let delay = backoff_delay(self.base_retry_delay, retries);
                        warn!(%method, endpoint, error = %err, delay_ms = delay.as_millis() as u64, "retrying after transport error");
                        retries += 1;
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    return Err(CloudflareError::Request {
                        method: method.to_string(),
                        endpoint: endpoint.to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }
    }

    /// Issue a request and parse the response envelope.
    ///
    /// HTTP-level failures produce a `success: false` envelope rather than
    /// an error; only transport and parse failures are `Err`.
    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let response = self.request(method, endpoint, options).await?;
        ApiResponse::from_response(response).await
    }

    /// Single-shot POST to the GraphQL endpoint.
    ///
    /// Shares auth headers with the REST side but has no retry wrapper:
    /// analytics queries are best-effort and failures surface directly.
    pub async fn post_graphql(&self, body: &Value) -> Result<Value> {
        if !self.auth.has_credentials() {
            self.auth.refresh_credentials();
        }
        let headers = self.auth.auth_headers()?;
        let url = format!("{}/graphql", self.base_url);

        debug!("sending Cloudflare GraphQL request");
        let response = self
            .http
            .post(&url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| CloudflareError::Request {
                method: Method::POST.to_string(),
                endpoint: "/graphql".to_string(),
                message: e.to_string(),
            })?;

        response
            .json()
            .await
            .map_err(|e| CloudflareError::MalformedResponse(e.to_string()))
    }

    fn url_for(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Delay before the next attempt. A numeric `Retry-After` on a 429 is
    /// honored verbatim (seconds); everything else falls back to
    /// exponential backoff.
    fn retry_delay(&self, status: StatusCode, headers: &HeaderMap, retry: u32) -> Duration {
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            if let Some(seconds) = retry_after {
                return Duration::from_secs(seconds);
            }
        }

        backoff_delay(self.base_retry_delay, retry)
    }

    fn build_request(
        &self,
        method: &Method,
        url: &str,
        options: &RequestOptions,
        auth_headers: &HeaderMap,
    ) -> reqwest::RequestBuilder {
        let mut headers = options.headers.clone();
        for (name, value) in auth_headers {
            headers.insert(name, value.clone());
        }

        let mut builder = self.http.request(method.clone(), url).headers(headers);
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(body) = &options.json {
            builder = builder.json(body);
        }
        builder
    }
}

fn retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Exponential backoff for retry N (0-based): base, 2*base, 4*base.
fn backoff_delay(base: Duration, retry: u32) -> Duration {
    let multiplier = 1u32 << retry.min(8);
    base.saturating_mul(multiplier)
}

fn is_connection_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use cloudgate_domain::settings_keys;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::settings::StaticSettingsProvider;

    fn token_client(base_url: &str) -> CloudflareClient {
        let settings = StaticSettingsProvider::default().set(settings_keys::TOKEN, "test-token");
        let auth = Arc::new(CredentialResolver::new(Arc::new(settings)));
        CloudflareClient::with_base_url(auth, base_url)
            .unwrap()
            .with_retry_base_delay(Duration::from_millis(5))
    }

    #[test]
    fn backoff_sequence_doubles_from_base() {
        let base = Duration::from_millis(1000);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(1000));
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(2000));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(4000));
    }

    #[tokio::test]
    async fn retry_after_header_wins_on_429() {
        let settings = StaticSettingsProvider::default().set(settings_keys::TOKEN, "t");
        let auth = Arc::new(CredentialResolver::new(Arc::new(settings)));
        let client = CloudflareClient::with_base_url(auth, "http://localhost").unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(
            client.retry_delay(StatusCode::TOO_MANY_REQUESTS, &headers, 0),
            Duration::from_secs(7)
        );

        // Non-numeric header falls back to backoff
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2026 07:28:00 GMT"));
        assert_eq!(
            client.retry_delay(StatusCode::TOO_MANY_REQUESTS, &headers, 1),
            Duration::from_millis(2000)
        );

        // 500s never consult Retry-After
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(
            client.retry_delay(StatusCode::INTERNAL_SERVER_ERROR, &headers, 0),
            Duration::from_millis(1000)
        );
    }

    #[tokio::test]
    async fn attaches_bearer_token_to_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .and(header("Authorization", "Bearer test-token"))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true, "result": {"id": "u1"}, "errors": [], "messages": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = token_client(&server.uri());
        let response = client.make_request(Method::GET, "user", RequestOptions::new()).await.unwrap();

        assert!(response.is_successful());
    }

    #[tokio::test]
    async fn retries_429_once_then_succeeds() {
        let server = MockServer::start().await;
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        Mock::given(method("GET"))
            .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
                if hits_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                    ResponseTemplate::new(429).insert_header("Retry-After", "0")
                } else {
                    ResponseTemplate::new(200)
                        .set_body_json(serde_json::json!({"success": true, "result": null}))
                }
            })
            .expect(2)
            .mount(&server)
            .await;

        let client = token_client(&server.uri());
        let response =
            client.make_request(Method::GET, "zones", RequestOptions::new()).await.unwrap();

        assert!(response.is_successful());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausts_retries_on_persistent_500() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({"success": false, "errors": []})),
            )
            .expect(4)
            .mount(&server)
            .await;

        let client = token_client(&server.uri());
        let response =
            client.make_request(Method::GET, "zones", RequestOptions::new()).await.unwrap();

        // Last response is returned; the envelope reflects the failure.
        assert!(!response.is_successful());
    }

    #[tokio::test]
    async fn does_not_retry_plain_400() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "success": false,
                "errors": [{"code": 6003, "message": "Invalid request headers"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = token_client(&server.uri());
        let response =
            client.make_request(Method::GET, "zones", RequestOptions::new()).await.unwrap();

        assert!(!response.is_successful());
        assert_eq!(response.first_error().as_deref(), Some("Invalid request headers"));
    }

    #[tokio::test]
    async fn wraps_transport_failure_with_method_and_endpoint() {
        // Bind then drop to get a port that refuses connections.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = token_client(&format!("http://{addr}"));
        let result =
            client.request(Method::DELETE, "zones/z1/dns_records/r1", RequestOptions::new()).await;

        match result {
            Err(CloudflareError::Request { method, endpoint, .. }) => {
                assert_eq!(method, "DELETE");
                assert_eq!(endpoint, "zones/z1/dns_records/r1");
            }
            other => panic!("expected request error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn caller_headers_cannot_displace_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("Authorization", "Bearer test-token"))
            .and(header("X-Request-Id", "req-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = token_client(&server.uri());
        let options = RequestOptions::new()
            .header(HeaderName::from_static("authorization"), HeaderValue::from_static("Bearer forged"))
            .header(HeaderName::from_static("x-request-id"), HeaderValue::from_static("req-1"));
        let response = client.make_request(Method::GET, "zones", options).await.unwrap();

        assert!(response.is_successful());
    }

    #[tokio::test]
    async fn graphql_channel_shares_auth_but_does_not_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"viewer": {"zones": []}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = token_client(&server.uri());
        let body = serde_json::json!({"query": "{ viewer { zones } }", "variables": {}});
        let value = client.post_graphql(&body).await.unwrap();

        assert_eq!(value["data"]["viewer"]["zones"], serde_json::json!([]));
    }
}
