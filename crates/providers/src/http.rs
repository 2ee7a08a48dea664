use crate::{Downloader, ProviderError};
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0";

#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Builds the shared reqwest client. Every request carries a timeout so a
/// hung server cannot stall the pipeline.
pub fn build_client(cfg: &HttpConfig) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(cfg.timeout)
        .user_agent(cfg.user_agent.clone())
        .build()
        .map_err(|e| ProviderError::RequestFailed(e.to_string()))
}

#[derive(Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new(cfg: &HttpConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(cfg)?,
        })
    }
}

#[async_trait::async_trait]
impl Downloader for HttpDownloader {
    async fn fetch(&self, url: &str) -> Result<Bytes, ProviderError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ProviderError::RequestFailed(format!(
                "status {} for {}",
                resp.status(),
                url
            )));
        }
        resp.bytes()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::CannedServer;

    #[tokio::test]
    async fn fetch_returns_the_body() {
        let server = CannedServer::start(vec![("/bird.jpg", 200, "not really a jpeg")]).await;
        let downloader = HttpDownloader::new(&HttpConfig::default()).unwrap();
        let bytes = downloader
            .fetch(&format!("{}/bird.jpg", server.url()))
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"not really a jpeg");
    }

    #[tokio::test]
    async fn missing_image_is_a_failed_request() {
        let server = CannedServer::start(vec![]).await;
        let url = format!("{}/gone.jpg", server.url());
        match HttpDownloader::new(&HttpConfig::default()).unwrap().fetch(&url).await {
            Err(ProviderError::RequestFailed(msg)) => {
                assert!(msg.contains("404"), "{msg}");
                assert!(msg.contains(&url), "{msg}");
            }
            other => panic!("expected request failure, got {:?}", other),
        }
    }
}
