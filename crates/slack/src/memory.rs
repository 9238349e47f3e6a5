//! In-memory fakes for the Slack capabilities.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use {
    async_trait::async_trait,
    bytes::Bytes,
    secrecy::{ExposeSecret, Secret},
};

use crate::{
    download::AttachmentDownloader,
    error::{Error, Result},
    history::MessageFetcher,
    message::SourceMessage,
};

/// Serves messages keyed by exact `(channel_id, timestamp)`.
#[derive(Default)]
pub struct InMemoryFetcher {
    messages: HashMap<(String, String), SourceMessage>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl InMemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_message(mut self, message: SourceMessage) -> Self {
        self.messages.insert(
            (message.channel_id.clone(), message.timestamp.clone()),
            message,
        );
        self
    }

    /// Make every fetch fail as if the API rejected it.
    #[must_use]
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageFetcher for InMemoryFetcher {
    async fn fetch(&self, channel_id: &str, timestamp: &str) -> Result<Option<SourceMessage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.failure {
            return Err(Error::Rejected {
                operation: "history lookup",
                reason: reason.clone(),
            });
        }
        Ok(self
            .messages
            .get(&(channel_id.to_string(), timestamp.to_string()))
            .cloned())
    }
}

/// Serves file bodies keyed by URL; unknown URLs answer 404.
#[derive(Default)]
pub struct InMemoryDownloader {
    files: HashMap<String, Bytes>,
    expected_token: Option<String>,
    calls: AtomicUsize,
}

impl InMemoryDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.files.insert(url.into(), body.into());
        self
    }

    /// Reject downloads whose bearer token differs from `token`.
    #[must_use]
    pub fn requiring_token(mut self, token: impl Into<String>) -> Self {
        self.expected_token = Some(token.into());
        self
    }

    pub fn download_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttachmentDownloader for InMemoryDownloader {
    async fn download(&self, url: &str, token: &Secret<String>) -> Result<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(expected) = &self.expected_token
            && token.expose_secret() != expected
        {
            return Err(Error::Status {
                operation: "file download",
                status: 401,
                body: "not_authed".into(),
            });
        }
        self.files.get(url).cloned().ok_or_else(|| Error::Status {
            operation: "file download",
            status: 404,
            body: "file_not_found".into(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetcher_matches_exact_key() {
        let fetcher = InMemoryFetcher::new().with_message(SourceMessage::text_only("C1", "100", "hi"));
        assert!(fetcher.fetch("C1", "100").await.unwrap().is_some());
        assert!(fetcher.fetch("C1", "101").await.unwrap().is_none());
        assert_eq!(fetcher.fetch_count(), 2);
    }

    #[tokio::test]
    async fn downloader_checks_token() {
        let downloader = InMemoryDownloader::new()
            .with_file("http://x/y.jpg", &b"jpeg"[..])
            .requiring_token("good");
        assert!(
            downloader
                .download("http://x/y.jpg", &Secret::new("bad".into()))
                .await
                .is_err()
        );
        let body = downloader
            .download("http://x/y.jpg", &Secret::new("good".into()))
            .await
            .unwrap();
        assert_eq!(body.as_ref(), b"jpeg");
    }
}
