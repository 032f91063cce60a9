use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::errors::ConfigError;

pub const DEFAULT_ORDER_STATUS_URL: &str =
    "https://1m9r5sk109.execute-api.cn-northwest-1.amazonaws.com.cn/prod/kit_box/order_status";
pub const DEFAULT_PURPOSE_URL: &str =
    "https://1m9r5sk109.execute-api.cn-northwest-1.amazonaws.com.cn/prod/purpose";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_LOG_FILE: &str = "rule-query-server.log";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Endpoints and timeout used for the two outbound lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    pub order_status_url: String,
    pub purpose_url: String,
    pub timeout: Duration,
}

impl UpstreamConfig {
    pub fn new(order_status_url: impl Into<String>, purpose_url: impl Into<String>) -> Self {
        Self {
            order_status_url: order_status_url.into(),
            purpose_url: purpose_url.into(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ORDER_STATUS_URL, DEFAULT_PURPOSE_URL)
    }
}

/// Process configuration for the tool server, loaded from the environment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub upstream: UpstreamConfig,
    pub log_file: PathBuf,
    pub log_level: String,
}

impl ServiceConfig {
    /// Loads configuration from the process environment, reading `.env`
    /// first when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| env::var(key))
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let order_status_url = read_http_url(
            &lookup,
            "RULE_QUERY_ORDER_STATUS_URL",
            DEFAULT_ORDER_STATUS_URL,
        )?;
        let purpose_url = read_http_url(&lookup, "RULE_QUERY_PURPOSE_URL", DEFAULT_PURPOSE_URL)?;
        let timeout_ms = parse_var::<u64, _>(&lookup, "RULE_QUERY_HTTP_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?;

        let log_file = read_var(&lookup, "RULE_QUERY_LOG_FILE")?
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
        let log_level = read_var(&lookup, "RULE_QUERY_LOG_LEVEL")?
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            upstream: UpstreamConfig {
                order_status_url,
                purpose_url,
                timeout: Duration::from_millis(timeout_ms.max(100)),
            },
            log_file,
            log_level,
        })
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            upstream: UpstreamConfig::default(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Trimmed, non-empty value of `key`, or `None` when unset or blank.
fn read_var<F>(lookup: &F, key: &'static str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Result<String, env::VarError>,
{
    match lookup(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(ConfigError::InvalidEnvVar { key, source: err }),
    }
}

fn read_http_url<F>(lookup: &F, key: &'static str, default: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Result<String, env::VarError>,
{
    match read_var(lookup, key)? {
        Some(value) => sanitize_http_url(key, &value),
        None => sanitize_http_url(key, default),
    }
}

fn sanitize_http_url(key: &'static str, value: &str) -> Result<String, ConfigError> {
    let parsed = Url::parse(value).map_err(|err| ConfigError::InvalidUrl {
        key,
        message: err.to_string(),
    })?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::InvalidUrl {
            key,
            message: format!("scheme {} is not http or https", parsed.scheme()),
        });
    }

    Ok(value.trim_end_matches('/').to_string())
}

fn parse_var<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Result<String, env::VarError>,
{
    match read_var(lookup, key)? {
        Some(value) => T::from_str(&value).map_err(|err| ConfigError::InvalidValue {
            key,
            message: err.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(
        pairs: &[(&str, &str)],
    ) -> impl Fn(&str) -> Result<String, env::VarError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned().ok_or(env::VarError::NotPresent)
    }

    #[test]
    fn falls_back_to_defaults() {
        let cfg = ServiceConfig::from_source(lookup_from(&[])).expect("config should load");
        assert_eq!(cfg.upstream.order_status_url, DEFAULT_ORDER_STATUS_URL);
        assert_eq!(cfg.upstream.purpose_url, DEFAULT_PURPOSE_URL);
        assert_eq!(cfg.upstream.timeout, Duration::from_secs(10));
        assert_eq!(cfg.log_file, PathBuf::from(DEFAULT_LOG_FILE));
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn reads_overrides_and_trims_trailing_slash() {
        let cfg = ServiceConfig::from_source(lookup_from(&[
            ("RULE_QUERY_ORDER_STATUS_URL", "http://127.0.0.1:9000/status/"),
            ("RULE_QUERY_PURPOSE_URL", " http://127.0.0.1:9000/purpose "),
            ("RULE_QUERY_HTTP_TIMEOUT_MS", "2500"),
            ("RULE_QUERY_LOG_FILE", "/tmp/rq.log"),
        ]))
        .expect("config should load");

        assert_eq!(cfg.upstream.order_status_url, "http://127.0.0.1:9000/status");
        assert_eq!(cfg.upstream.purpose_url, "http://127.0.0.1:9000/purpose");
        assert_eq!(cfg.upstream.timeout, Duration::from_millis(2500));
        assert_eq!(cfg.log_file, PathBuf::from("/tmp/rq.log"));
    }

    #[test]
    fn floors_tiny_timeouts() {
        let cfg = ServiceConfig::from_source(lookup_from(&[("RULE_QUERY_HTTP_TIMEOUT_MS", "5")]))
            .expect("config should load");
        assert_eq!(cfg.upstream.timeout, Duration::from_millis(100));
    }

    #[test]
    fn rejects_non_http_urls() {
        let err = ServiceConfig::from_source(lookup_from(&[(
            "RULE_QUERY_PURPOSE_URL",
            "ftp://example.com/purpose",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { key: "RULE_QUERY_PURPOSE_URL", .. }));
    }

    #[test]
    fn rejects_unparsable_timeout() {
        let err = ServiceConfig::from_source(lookup_from(&[("RULE_QUERY_HTTP_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
