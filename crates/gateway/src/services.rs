//! Production wiring: one adapter per capability, built from config.

use std::{sync::Arc, time::Duration};

use {
    courier_config::CourierConfig,
    courier_media::{AttachmentTransfer, AzureBlobStore, BlobStore},
    courier_queue::{QueuePublisher, QueueTransport, ServiceBusQueue},
    courier_slack::{AttachmentDownloader, MessageFetcher, SlackFileDownloader, SlackHistoryClient},
    courier_vault::{KeyVaultResolver, SecretResolver},
};

use crate::pipeline::Relay;

/// The capability set the relay runs against.
#[derive(Clone)]
pub struct RelayServices {
    pub secrets: Arc<dyn SecretResolver>,
    pub fetcher: Arc<dyn MessageFetcher>,
    pub downloader: Arc<dyn AttachmentDownloader>,
    pub store: Arc<dyn BlobStore>,
    pub queue: Arc<dyn QueueTransport>,
}

impl RelayServices {
    /// Build the Azure and Slack adapters, sharing one HTTP client whose
    /// timeout bounds every external call.
    pub fn from_config(config: &CourierConfig) -> anyhow::Result<Self> {
        anyhow::ensure!(
            config.http.timeout_secs > 0,
            "http.timeout_secs must be at least 1"
        );
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .build()?;

        let secrets: Arc<dyn SecretResolver> =
            Arc::new(KeyVaultResolver::new(http.clone(), &config.vault));
        Ok(Self {
            fetcher: Arc::new(SlackHistoryClient::new(
                http.clone(),
                &config.slack,
                Arc::clone(&secrets),
            )),
            downloader: Arc::new(SlackFileDownloader::new(http.clone())),
            store: Arc::new(AzureBlobStore::new(http.clone(), &config.blob.endpoint)),
            queue: Arc::new(ServiceBusQueue::new(http, &config.queue)),
            secrets,
        })
    }

    pub fn publisher(&self, config: &CourierConfig) -> QueuePublisher {
        QueuePublisher::new(
            Arc::clone(&self.secrets),
            Arc::clone(&self.queue),
            &config.queue,
        )
    }

    pub fn relay(&self, config: &CourierConfig) -> Relay {
        let transfer = AttachmentTransfer::new(
            Arc::clone(&self.secrets),
            Arc::clone(&self.downloader),
            Arc::clone(&self.store),
            &config.slack,
            &config.blob,
        );
        Relay::new(
            Arc::clone(&self.fetcher),
            transfer,
            self.publisher(config),
            config.relay.on_attachment_failure,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_is_refused() {
        let mut config = CourierConfig::default();
        config.http.timeout_secs = 0;
        let err = RelayServices::from_config(&config).err().unwrap();
        assert!(err.to_string().contains("http.timeout_secs"));
    }

    #[test]
    fn default_config_builds() {
        assert!(RelayServices::from_config(&CourierConfig::default()).is_ok());
    }
}
