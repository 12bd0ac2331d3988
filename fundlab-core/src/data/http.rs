//! Blocking HTTP fetcher.

use std::time::Duration;

use super::provider::{FetchError, PageFetcher};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Fetches pages over HTTP with a per-request timeout.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    fn classify(address: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout { address: address.to_string() }
        } else {
            FetchError::Unreachable { address: address.to_string(), reason: err.to_string() }
        }
    }
}

impl PageFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch(&self, address: &str) -> Result<String, FetchError> {
        tracing::debug!(address, "fetching page");
        let resp = self.client.get(address).send().map_err(|e| Self::classify(address, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                address: address.to_string(),
                status: status.as_u16(),
            });
        }

        resp.text().map_err(|e| Self::classify(address, e))
    }
}
