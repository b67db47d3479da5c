//! Receipt download from the bank's receipt server.
//!
//! GET <base_url>/?id=<reference><suffix>
//! The server's certificate chain does not validate, so certificate checks are
//! relaxed by default (`accept_invalid_certs`).

use cbe_core::VerifyError;
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, CONTENT_TYPE};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://apps.cbe.com.et:100";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_USER_AGENT: &str = concat!("Mozilla/5.0 (cbe-verify/", env!("CARGO_PKG_VERSION"), ")");

#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub accept_invalid_certs: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: true,
        }
    }
}

impl FetchConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Zero keeps the current timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        if secs > 0 {
            self.timeout = Duration::from_secs(secs);
        }
        self
    }

    pub fn receipt_endpoint(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }
}

pub struct ReceiptFetcher {
    http: reqwest::Client,
    config: FetchConfig,
}

impl ReceiptFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, VerifyError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            // one request per verification; pooled connections would outlive
            // the runtime used by `verify_blocking`
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| VerifyError::Network(format!("building http client: {e}")))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Download the receipt PDF for `id` + `suffix`.
    ///
    /// Anything other than a 200 response with a PDF content type is an error.
    pub async fn fetch(&self, id: &str, suffix: &str) -> Result<Vec<u8>, VerifyError> {
        let full_id = format!("{id}{suffix}");
        let full_id = full_id.trim();
        let url = self.config.receipt_endpoint();

        info!(url = %url, id = %full_id, "requesting receipt");

        let resp = self
            .http
            .get(&url)
            .query(&[("id", full_id)])
            .header(ACCEPT, "application/pdf")
            .header(ACCEPT_ENCODING, "identity")
            .send()
            .await
            .map_err(|e| VerifyError::Network(describe(&e)))?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        if status != StatusCode::OK || !content_type.contains("application/pdf") {
            return Err(VerifyError::UnexpectedResponse {
                status: status.as_u16(),
                content_type,
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| VerifyError::ResponseBody(describe(&e)))?;

        debug!(bytes = body.len(), "received receipt");
        Ok(body.to_vec())
    }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {err}")
    } else {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = FetchConfig::default();
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.timeout, Duration::from_secs(120));
        assert!(cfg.accept_invalid_certs);
        assert!(cfg.user_agent.starts_with("Mozilla/5.0 (cbe-verify/"));
    }

    #[test]
    fn test_zero_timeout_keeps_default() {
        let cfg = FetchConfig::default().with_timeout_secs(0);
        assert_eq!(cfg.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        let cfg = cfg.with_timeout_secs(5);
        assert_eq!(cfg.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_receipt_endpoint_normalizes_trailing_slash() {
        let cfg = FetchConfig::default().with_base_url("http://localhost:8080/");
        assert_eq!(cfg.receipt_endpoint(), "http://localhost:8080/");
        let cfg = cfg.with_base_url("http://localhost:8080");
        assert_eq!(cfg.receipt_endpoint(), "http://localhost:8080/");
    }
}
