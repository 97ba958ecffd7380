//! Shared HTTP client wrapper
//!
//! Thin wrapper around `reqwest::blocking::Client` that centralizes
//! USER_AGENT and timeout configuration.

use crate::config::network::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS, USER_AGENT};
use crate::error::Result;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Shared HTTP client with standard configuration
pub struct HttpClient {
    inner: reqwest::blocking::Client,
}

impl HttpClient {
    /// Create a new client with default Bookshelf settings
    pub fn new() -> Result<Self> {
        let inner = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .build()?;
        Ok(Self { inner })
    }

    /// Client for loopback test servers (ignores proxy environment)
    #[cfg(test)]
    pub(crate) fn local() -> Self {
        let inner = reqwest::blocking::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        Self { inner }
    }

    /// GET a URL with query parameters and deserialize the JSON response
    ///
    /// Parameters are URL-encoded. Non-2xx statuses are errors.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        tracing::debug!(url, "GET");
        let resp = self.inner.get(url).query(query).send()?.error_for_status()?;
        let data = resp.json::<T>()?;
        Ok(data)
    }

    /// Like [`get_json`](Self::get_json), but a 404 yields `None`
    pub fn get_json_opt<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>> {
        tracing::debug!(url, "GET");
        let resp = self.inner.get(url).query(query).send()?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let data = resp.error_for_status()?.json::<T>()?;
        Ok(Some(data))
    }
}
