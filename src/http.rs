//! Page fetching.
//!
//! Documents come back as text; callers parse them with `scraper::Html`
//! synchronously so no parse tree is ever held across an await point.

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::de::DeserializeOwned;
use std::time::Instant;

use crate::config::AppConfig;
use crate::error::{Error, Result};

/// Fetches raw page bodies.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn get_text(&self, url: &str, referer: Option<&str>) -> Result<String>;
}

/// Fetch and deserialize a JSON document.
pub async fn fetch_json<T: DeserializeOwned>(
    fetcher: &dyn PageFetcher,
    url: &str,
    referer: Option<&str>,
) -> Result<T> {
    let body = fetcher.get_text(url, referer).await?;
    Ok(serde_json::from_str(&body)?)
}

/// `PageFetcher` backed by reqwest.
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn get_text(&self, url: &str, referer: Option<&str>) -> Result<String> {
        let start = Instant::now();
        let mut request = self.http.get(url);
        if let Some(referer) = referer {
            request = request.header(header::REFERER, referer);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(format!("status {} for {}", status.as_u16(), url)));
        }

        let body = response.text().await?;

        tracing::debug!("fetched {} in {}ms ({} bytes)", url, start.elapsed().as_millis(), body.len());
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeFetcher;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        id: u32,
    }

    #[test]
    fn test_http_fetcher_new() {
        assert!(HttpFetcher::new(&AppConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_json_parses_body() {
        let fetcher = FakeFetcher::default().with_page("https://x.test/a.json", r#"{"id": 7}"#);
        let payload: Payload = fetch_json(&fetcher, "https://x.test/a.json", None).await.unwrap();
        assert_eq!(payload.id, 7);
    }

    #[tokio::test]
    async fn test_fetch_json_shape_mismatch() {
        let fetcher = FakeFetcher::default().with_page("https://x.test/a.json", r#"{"name": "x"}"#);
        let result: Result<Payload> = fetch_json(&fetcher, "https://x.test/a.json", None).await;
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_json_missing_page() {
        let fetcher = FakeFetcher::default();
        let result: Result<Payload> = fetch_json(&fetcher, "https://x.test/none", None).await;
        assert!(matches!(result, Err(Error::Http(_))));
    }
}
