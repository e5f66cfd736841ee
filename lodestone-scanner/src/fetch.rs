//! Blocking document fetch.
//!
//! The traversal is strictly sequential: one GET at a time, no retries.
//! A non-2xx status or an unparseable body is fatal to the whole run, so
//! the fetcher surfaces both as errors and nothing here recovers.

use crate::error::{Result, ScanError};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Seam between the tree walker strategies and the transport. Tests swap
/// in a canned-document fetcher.
pub trait Fetch {
    fn get_json(&self, url: &str, params: &[(&str, &str)]) -> Result<Value>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        let client = Client::builder()
            .user_agent("Lodestone/0.2 (https://github.com/trapdoorsec/lodestone)")
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetch for HttpFetcher {
    fn get_json(&self, url: &str, params: &[(&str, &str)]) -> Result<Value> {
        debug!("fetching {}", url);

        let response = self.client.get(url).query(params).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Transport {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text()?;
        serde_json::from_str(&body).map_err(|source| ScanError::Parse {
            context: format!("response from {}", url),
            source,
        })
    }
}
