//! HTTP GET with a browser identity and a per-call timeout.
//!
//! Every failure comes back as a [`FetchError`]; callers turn it into "zero
//! results for this unit". There are no retries.

use crate::error::FetchError;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Build a fetcher that identifies itself as `user_agent`.
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    /// Fetch `url` and return its body as text.
    #[instrument(level = "debug", skip(self), fields(%url))]
    pub async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let response = self.client.get(url).timeout(timeout).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Non-success status");
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_USER_AGENT;
    use httpmock::{Method::GET, MockServer};

    #[tokio::test]
    async fn test_fetch_sends_user_agent_and_returns_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/page")
                .header("user-agent", DEFAULT_USER_AGENT);
            then.status(200).body("<html>ok</html>");
        });

        let fetcher = Fetcher::new(DEFAULT_USER_AGENT).unwrap();
        let body = fetcher
            .fetch(&server.url("/page"), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(body, "<html>ok</html>");
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn test_non_success_status_is_http_status_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        });

        let fetcher = Fetcher::new(DEFAULT_USER_AGENT).unwrap();
        let err = fetcher
            .fetch(&server.url("/missing"), Duration::from_secs(5))
            .await
            .unwrap_err();

        assert_eq!(err, FetchError::HttpStatus(404));
    }

    #[tokio::test]
    async fn test_timeout_is_network_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_millis(500)).body("late");
        });

        let fetcher = Fetcher::new(DEFAULT_USER_AGENT).unwrap();
        let err = fetcher
            .fetch(&server.url("/slow"), Duration::from_millis(50))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Network(_)));
    }

    #[tokio::test]
    async fn test_unparseable_url_is_network_error() {
        let fetcher = Fetcher::new(DEFAULT_USER_AGENT).unwrap();
        let err = fetcher
            .fetch("not a url", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }
}
