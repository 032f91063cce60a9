use std::time::Duration;

use reqwest::StatusCode;
use rule_query_core::UpstreamConfig;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Typed HTTP client for the order status and purpose lookup services.
///
/// One client is built per process and shared by every invocation. Each
/// request is a single GET bounded by the configured timeout; nothing is
/// retried.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    order_status_url: Url,
    purpose_url: Url,
    timeout: Duration,
}

/// Status code and decoded body of an upstream answer.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse {
    pub status: StatusCode,
    /// `None` when the body was empty, `null`, or not JSON on a non-2xx reply.
    pub body: Option<Value>,
}

impl JsonResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl UpstreamClient {
    /// Creates a client bound to the configured endpoints.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let order_status_url = parse_url(&config.order_status_url)?;
        let purpose_url = parse_url(&config.purpose_url)?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| UpstreamError::Client(err.to_string()))?;

        Ok(Self {
            http,
            order_status_url,
            purpose_url,
            timeout: config.timeout,
        })
    }

    /// Looks up an order's status by identifier.
    pub async fn order_status(&self, order_id: &str) -> Result<JsonResponse, UpstreamError> {
        self.fetch_json(&self.order_status_url, &[("order_id", order_id)])
            .await
    }

    /// Looks up the rules registered for a purpose.
    pub async fn matched_rules(&self, purpose: &str) -> Result<JsonResponse, UpstreamError> {
        self.fetch_json(&self.purpose_url, &[("purpose", purpose)])
            .await
    }

    /// Issues one GET with `params` as the query string.
    ///
    /// Transport failures and timeouts are returned as errors; any HTTP status
    /// is returned to the caller. A 2xx reply that is not JSON is an error.
    pub async fn fetch_json(
        &self,
        url: &Url,
        params: &[(&str, &str)],
    ) -> Result<JsonResponse, UpstreamError> {
        debug!(url = %url, ?params, "sending upstream request");

        let response = self
            .http
            .get(url.clone())
            .query(params)
            .send()
            .await
            .map_err(|err| self.transport_error(url, err))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| self.transport_error(url, err))?;

        let body = match decode_body(&bytes) {
            Ok(body) => body,
            Err(err) if status.is_success() => {
                return Err(UpstreamError::Decode {
                    url: url.to_string(),
                    message: err.to_string(),
                });
            }
            Err(err) => {
                debug!(url = %url, %status, error = %err, "ignoring non-JSON error body");
                None
            }
        };

        debug!(url = %url, %status, has_body = body.is_some(), "upstream replied");
        Ok(JsonResponse { status, body })
    }

    pub fn order_status_url(&self) -> &Url {
        &self.order_status_url
    }

    pub fn purpose_url(&self) -> &Url {
        &self.purpose_url
    }

    fn transport_error(&self, url: &Url, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            warn!(url = %url, timeout_ms = self.timeout.as_millis() as u64, "upstream request timed out");
            UpstreamError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            warn!(url = %url, error = %err, "upstream request failed");
            UpstreamError::Http {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

fn parse_url(raw: &str) -> Result<Url, UpstreamError> {
    Url::parse(raw).map_err(|err| UpstreamError::InvalidUrl {
        url: raw.to_string(),
        source: err,
    })
}

fn decode_body(bytes: &[u8]) -> Result<Option<Value>, serde_json::Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    match serde_json::from_slice::<Value>(bytes)? {
        Value::Null => Ok(None),
        value => Ok(Some(value)),
    }
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    #[error("request to {url} timed out after {}ms", .timeout.as_millis())]
    Timeout { url: String, timeout: Duration },
    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },
    #[error("{url} returned unexpected status {status}")]
    UnexpectedStatus { url: String, status: StatusCode },
    #[error("{url} returned an empty body")]
    EmptyBody { url: String },
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl UpstreamError {
    /// HTTP status reported by the upstream, when there was one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            UpstreamError::UnexpectedStatus { status, .. } => Some(status.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, timeout: Duration) -> UpstreamClient {
        let config = UpstreamConfig::new(
            format!("{}/order_status", server.uri()),
            format!("{}/purpose", server.uri()),
        )
        .with_timeout(timeout);
        UpstreamClient::new(&config).expect("client builds")
    }

    #[test]
    fn empty_and_null_bodies_decode_to_none() {
        assert_eq!(decode_body(b"").unwrap(), None);
        assert_eq!(decode_body(b"  \n").unwrap(), None);
        assert_eq!(decode_body(b"null").unwrap(), None);
        assert_eq!(decode_body(b"{\"a\":1}").unwrap(), Some(json!({"a": 1})));
        assert!(decode_body(b"<html>").is_err());
    }

    #[test]
    fn rejects_invalid_urls() {
        let config = UpstreamConfig::new("not a url", "http://localhost/purpose");
        assert!(matches!(
            UpstreamClient::new(&config),
            Err(UpstreamError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn sends_order_id_as_query_parameter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/order_status"))
            .and(query_param("order_id", "ST-9012"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"order_id": "ST-9012", "status": "处理中"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let response = client.order_status("ST-9012").await.expect("request succeeds");

        assert!(response.is_success());
        assert_eq!(response.body.unwrap()["status"], "处理中");
    }

    #[tokio::test]
    async fn non_success_status_is_returned_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/order_status"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let response = client.order_status("nonexistent").await.expect("request completes");

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body, None);
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/purpose"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{oops"))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let err = client.matched_rules("取消订单").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Decode { .. }));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/purpose"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_millis(800)),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_millis(100));
        let err = client.matched_rules("修改配送时间").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Timeout { .. }));
    }
}
