use {
    async_trait::async_trait,
    bytes::Bytes,
    secrecy::{ExposeSecret, Secret},
};

use crate::error::{Error, Result};

const OPERATION: &str = "file download";

/// Fetch the raw bytes behind a private attachment URL.
#[async_trait]
pub trait AttachmentDownloader: Send + Sync {
    async fn download(&self, url: &str, token: &Secret<String>) -> Result<Bytes>;
}

/// Downloads `url_private` files with bearer-token authorization.
pub struct SlackFileDownloader {
    http: reqwest::Client,
}

impl SlackFileDownloader {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AttachmentDownloader for SlackFileDownloader {
    async fn download(&self, url: &str, token: &Secret<String>) -> Result<Bytes> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| Error::external("slack file download", e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                operation: OPERATION,
                status,
                body,
            });
        }

        resp.bytes()
            .await
            .map_err(|e| Error::external("read slack file body", e))
    }
}
