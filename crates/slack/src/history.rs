use std::sync::Arc;

use {
    async_trait::async_trait,
    secrecy::ExposeSecret,
    tracing::debug,
};

use {courier_config::SlackConfig, courier_vault::SecretResolver};

use crate::{
    error::{Error, Result},
    message::{HistoryResponse, SourceMessage},
};

const OPERATION: &str = "history lookup";

/// Look up the exact message a webhook refers to.
#[async_trait]
pub trait MessageFetcher: Send + Sync {
    /// Return the latest message at or before `timestamp` in `channel_id`.
    ///
    /// `Ok(None)` means the lookup succeeded but no message matched.
    async fn fetch(&self, channel_id: &str, timestamp: &str) -> Result<Option<SourceMessage>>;
}

/// [`MessageFetcher`] backed by the Slack channel history API.
pub struct SlackHistoryClient {
    http: reqwest::Client,
    history_url: String,
    token_secret: String,
    secrets: Arc<dyn SecretResolver>,
}

impl SlackHistoryClient {
    pub fn new(
        http: reqwest::Client,
        config: &SlackConfig,
        secrets: Arc<dyn SecretResolver>,
    ) -> Self {
        Self {
            http,
            history_url: config.history_url.clone(),
            token_secret: config.history_token_secret.clone(),
            secrets,
        }
    }
}

#[async_trait]
impl MessageFetcher for SlackHistoryClient {
    async fn fetch(&self, channel_id: &str, timestamp: &str) -> Result<Option<SourceMessage>> {
        let token = self.secrets.resolve(&self.token_secret).await?;

        let resp = self
            .http
            .get(&self.history_url)
            .query(&[
                ("token", token.expose_secret().as_str()),
                ("channel", channel_id),
                ("latest", timestamp),
                ("inclusive", "true"),
                ("count", "1"),
            ])
            .send()
            .await
            .map_err(|e| Error::external("slack history request", e.without_url()))?;
        drop(token);

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                operation: OPERATION,
                status,
                body,
            });
        }

        let history: HistoryResponse = resp
            .json()
            .await
            .map_err(|e| Error::external("decode slack history", e.without_url()))?;
        if !history.ok {
            return Err(Error::Rejected {
                operation: OPERATION,
                reason: history.error.unwrap_or_else(|| "unknown".into()),
            });
        }

        let Some(first) = history.messages.into_iter().next() else {
            debug!(channel_id, timestamp, "no message at correlation key");
            return Ok(None);
        };
        Ok(Some(first.into_source(channel_id, timestamp)))
    }
}
