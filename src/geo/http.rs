//! Shared HTTP plumbing for providers
//!
//! Every provider call is a single bounded GET; the timeout is set on the
//! client so that one unreachable backend cannot stall the resolver.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build a client with the given user agent and per-request timeout
pub fn build_client(user_agent: &str, timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(Error::from)
}

/// Send a prepared GET and decode a JSON body, mapping every failure to
/// `Error::Provider` tagged with the provider name
pub async fn get_json<T: DeserializeOwned>(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::provider(provider, format!("request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(Error::provider(
            provider,
            format!("returned status: {}", response.status()),
        ));
    }

    response
        .json()
        .await
        .map_err(|e| Error::provider(provider, format!("failed to parse response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client() {
        assert!(build_client("wayfinder-test/0.1", 5).is_ok());
    }
}
