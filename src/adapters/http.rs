//! HTTP content fetcher for candidate images.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::{header, Client, Url};
use std::time::Duration;
use tracing::debug;

use crate::domain::errors::FetchError;
use crate::domain::models::Candidate;
use crate::domain::ports::{ContentFetcher, FetchedContent};

/// Desktop browser user agents rotated across requests.
pub const USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
];

pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// `<scheme>://<host>/` of `url`, sent as the Referer so hotlink-protected
/// hosts still serve the image.
pub fn referer_for(url: &Url) -> Option<String> {
    url.host_str()
        .map(|host| format!("{}://{}/", url.scheme(), host))
}

/// Fetches candidate bytes over HTTP(S).
#[derive(Clone)]
pub struct HttpContentFetcher {
    client: Client,
}

impl HttpContentFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    async fn fetch(&self, candidate: &Candidate) -> Result<FetchedContent, FetchError> {
        let url = Url::parse(candidate.as_str()).map_err(|e| FetchError::InvalidUrl {
            url: candidate.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: candidate.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        let mut request = self
            .client
            .get(url.clone())
            .header(header::USER_AGENT, random_user_agent());
        if let Some(referer) = referer_for(&url) {
            request = request.header(header::REFERER, referer);
        }

        let network = |source: reqwest::Error| {
            if source.is_timeout() {
                FetchError::Timeout {
                    url: candidate.to_string(),
                }
            } else {
                FetchError::Network {
                    url: candidate.to_string(),
                    source,
                }
            }
        };

        let response = request.send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: candidate.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(network)?.to_vec();

        debug!(url = %candidate, bytes = bytes.len(), "fetched candidate");
        Ok(FetchedContent {
            bytes,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn fetcher() -> HttpContentFetcher {
        HttpContentFetcher::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_referer_is_site_root() {
        let url = Url::parse("https://cdn.example.com:8443/a/b.jpg?x=1").unwrap();
        assert_eq!(referer_for(&url).as_deref(), Some("https://cdn.example.com/"));
    }

    #[tokio::test]
    async fn test_fetch_returns_body_and_content_type() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/cat.png")
            .match_header("user-agent", Matcher::Regex("^Mozilla/5.0".to_string()))
            .match_header("referer", "http://127.0.0.1/")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(b"png-bytes")
            .create_async()
            .await;

        let candidate = Candidate::new(format!("{}/cat.png", server.url()));
        let content = fetcher().fetch(&candidate).await.unwrap();

        assert_eq!(content.bytes, b"png-bytes");
        assert_eq!(content.content_type.as_deref(), Some("image/png"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/gone.jpg")
            .with_status(404)
            .create_async()
            .await;

        let candidate = Candidate::new(format!("{}/gone.jpg", server.url()));
        let err = fetcher().fetch(&candidate).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_invalid_locator_is_rejected() {
        let err = fetcher()
            .fetch(&Candidate::new("not a url"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));

        let err = fetcher()
            .fetch(&Candidate::new("ftp://example.com/a.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }
}
