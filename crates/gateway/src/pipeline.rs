use std::{fmt, sync::Arc};

use tracing::{debug, info, warn};

use {
    courier_common::NormalizedMessage,
    courier_config::AttachmentFailurePolicy,
    courier_media::AttachmentTransfer,
    courier_queue::{PublishOutcome, QueuePublisher},
    courier_slack::{CorrelationKey, MessageFetcher, SourceMessage, WebhookEvent},
};

/// Progress of one webhook through the relay. Strictly forward-moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStage {
    Received,
    Validated,
    Fetched,
    Transferred,
    SkippedTransfer,
    Published,
    Rejected,
    /// The HTTP answer was chosen; logged by the route handler.
    Responded,
}

impl RelayStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Fetched => "fetched",
            Self::Transferred => "transferred",
            Self::SkippedTransfer => "skipped_transfer",
            Self::Published => "published",
            Self::Rejected => "rejected",
            Self::Responded => "responded",
        }
    }
}

impl fmt::Display for RelayStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a webhook was handled when nothing fatal happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The payload was malformed or lacked a correlation key.
    Rejected { reason: String },
    /// History had no message at the correlation key.
    NotFound { key: CorrelationKey },
    /// The message was built and a publish was attempted.
    Relayed {
        message: NormalizedMessage,
        publish: PublishOutcome,
    },
}

/// Failures that abort a relay before anything is published.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("source fetch failed: {0}")]
    SourceFetch(#[source] courier_slack::Error),

    #[error("attachment transfer failed: {0}")]
    AttachmentTransfer(#[source] courier_media::Error),
}

/// The webhook relay pipeline.
///
/// Each call to [`Relay::handle`] is independent. There is no deduplication:
/// two deliveries for the same correlation key both fetch, transfer and
/// publish.
pub struct Relay {
    fetcher: Arc<dyn MessageFetcher>,
    transfer: AttachmentTransfer,
    publisher: QueuePublisher,
    on_attachment_failure: AttachmentFailurePolicy,
}

impl Relay {
    pub fn new(
        fetcher: Arc<dyn MessageFetcher>,
        transfer: AttachmentTransfer,
        publisher: QueuePublisher,
        on_attachment_failure: AttachmentFailurePolicy,
    ) -> Self {
        Self {
            fetcher,
            transfer,
            publisher,
            on_attachment_failure,
        }
    }

    pub fn publisher(&self) -> &QueuePublisher {
        &self.publisher
    }

    pub async fn handle(&self, body: &str) -> Result<RelayOutcome, RelayError> {
        debug!(stage = %RelayStage::Received, bytes = body.len());

        let key = match WebhookEvent::decode(body) {
            Ok(event) => match event.correlation_key() {
                Some(key) => key,
                None => return Ok(reject("missing channel_id or timestamp".into())),
            },
            Err(e) => return Ok(reject(e.to_string())),
        };
        debug!(stage = %RelayStage::Validated, channel_id = %key.channel_id, timestamp = %key.timestamp);

        let source = self
            .fetcher
            .fetch(&key.channel_id, &key.timestamp)
            .await
            .map_err(RelayError::SourceFetch)?;
        let Some(source) = source else {
            info!(channel_id = %key.channel_id, timestamp = %key.timestamp, "no message at correlation key");
            return Ok(RelayOutcome::NotFound { key });
        };
        debug!(stage = %RelayStage::Fetched, has_attachment = source.attachment.is_some());

        let message = self.normalize(source).await?;
        let publish = self.publisher.publish(&message).await;
        if publish.is_published() {
            debug!(stage = %RelayStage::Published);
        }

        Ok(RelayOutcome::Relayed { message, publish })
    }

    async fn normalize(&self, source: SourceMessage) -> Result<NormalizedMessage, RelayError> {
        let attachment = match source.attachment {
            Some(attachment) if self.transfer.supports(&attachment) => attachment,
            Some(attachment) => {
                debug!(stage = %RelayStage::SkippedTransfer, filetype = %attachment.filetype, "unsupported attachment dropped");
                return Ok(NormalizedMessage::text_only(source.text));
            },
            None => {
                debug!(stage = %RelayStage::SkippedTransfer);
                return Ok(NormalizedMessage::text_only(source.text));
            },
        };

        match self.transfer.transfer(&attachment).await {
            Ok(locator) => {
                debug!(stage = %RelayStage::Transferred, %locator);
                Ok(NormalizedMessage::with_attachment(source.text, locator.to_string()))
            },
            Err(e) => match self.on_attachment_failure {
                AttachmentFailurePolicy::Abort => Err(RelayError::AttachmentTransfer(e)),
                AttachmentFailurePolicy::RelayText => {
                    warn!(error = %e, "attachment transfer failed, relaying text only");
                    Ok(NormalizedMessage::text_only(source.text))
                },
            },
        }
    }
}

fn reject(reason: String) -> RelayOutcome {
    debug!(stage = %RelayStage::Rejected, %reason);
    RelayOutcome::Rejected { reason }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        courier_config::{BlobConfig, QueueConfig, SlackConfig},
        courier_media::{BlobStore, InMemoryBlobStore},
        courier_queue::{InMemoryQueue, QueueTransport},
        courier_slack::{Attachment, AttachmentDownloader, InMemoryDownloader, InMemoryFetcher},
        courier_vault::{InMemorySecrets, SecretResolver},
    };

    use super::*;

    const FILE_URL: &str = "http://x/y.jpg";

    struct Harness {
        secrets: Arc<InMemorySecrets>,
        fetcher: Arc<InMemoryFetcher>,
        downloader: Arc<InMemoryDownloader>,
        store: Arc<InMemoryBlobStore>,
        queue: Arc<InMemoryQueue>,
        relay: Relay,
    }

    fn harness(fetcher: InMemoryFetcher, policy: AttachmentFailurePolicy) -> Harness {
        let secrets = Arc::new(
            InMemorySecrets::new()
                .with_secret("SlackToken", "xoxb-1")
                .with_secret("StorageSas", "sig=x")
                .with_secret("QueueConnection", "Endpoint=sb://ns/;SharedAccessKeyName=k;SharedAccessKey=v"),
        );
        let fetcher = Arc::new(fetcher);
        let downloader = Arc::new(InMemoryDownloader::new().with_file(FILE_URL, &[0xFF, 0xD8][..]));
        let store = Arc::new(InMemoryBlobStore::new());
        let queue = Arc::new(InMemoryQueue::new());

        let transfer = AttachmentTransfer::new(
            Arc::clone(&secrets) as Arc<dyn SecretResolver>,
            Arc::clone(&downloader) as Arc<dyn AttachmentDownloader>,
            Arc::clone(&store) as Arc<dyn BlobStore>,
            &SlackConfig::default(),
            &BlobConfig {
                container: "attachments".into(),
                token_secret: "StorageSas".into(),
                ..Default::default()
            },
        );
        let publisher = QueuePublisher::new(
            Arc::clone(&secrets) as Arc<dyn SecretResolver>,
            Arc::clone(&queue) as Arc<dyn QueueTransport>,
            &QueueConfig {
                connection_string_secret: "QueueConnection".into(),
                ..Default::default()
            },
        );
        let relay = Relay::new(
            Arc::clone(&fetcher) as Arc<dyn MessageFetcher>,
            transfer,
            publisher,
            policy,
        );
        Harness {
            secrets,
            fetcher,
            downloader,
            store,
            queue,
            relay,
        }
    }

    fn jpg_message() -> SourceMessage {
        SourceMessage::text_only("C1", "100", "hi").with_attachment(Attachment::new(FILE_URL, "jpg"))
    }

    #[tokio::test]
    async fn rejection_touches_nothing() {
        let h = harness(InMemoryFetcher::new().with_message(jpg_message()), AttachmentFailurePolicy::Abort);
        for body in ["foo=bar", "channel_id=C1", "channel_id=&timestamp=100", "a=b=c"] {
            let outcome = h.relay.handle(body).await.unwrap();
            assert!(matches!(outcome, RelayOutcome::Rejected { .. }), "{body}");
        }
        assert_eq!(h.secrets.resolve_count(), 0);
        assert_eq!(h.fetcher.fetch_count(), 0);
        assert_eq!(h.downloader.download_count(), 0);
        assert_eq!(h.store.call_count(), 0);
        assert_eq!(h.queue.send_count(), 0);
    }

    #[tokio::test]
    async fn jpg_is_transferred_and_published() {
        let h = harness(InMemoryFetcher::new().with_message(jpg_message()), AttachmentFailurePolicy::Abort);
        let outcome = h.relay.handle("channel_id=C1&timestamp=100").await.unwrap();

        let RelayOutcome::Relayed { message, publish } = outcome else {
            panic!("expected relayed, got {outcome:?}");
        };
        assert_eq!(publish, PublishOutcome::Published);
        assert!(message.is_file);
        let (container, name) = message.file_path.split_once('/').unwrap();
        assert_eq!(container, "attachments");
        assert!(name.ends_with(".jpg"));
        assert!(h.store.object(container, name).is_some());
        assert_eq!(h.queue.pending(), vec![message.to_json().unwrap()]);
    }

    #[tokio::test]
    async fn not_found_publishes_nothing() {
        let h = harness(InMemoryFetcher::new(), AttachmentFailurePolicy::Abort);
        let outcome = h.relay.handle("channel_id=C1&timestamp=100").await.unwrap();
        assert!(matches!(outcome, RelayOutcome::NotFound { .. }));
        assert_eq!(h.queue.send_count(), 0);
    }

    #[tokio::test]
    async fn fetch_failure_is_fatal() {
        let h = harness(InMemoryFetcher::new().failing("invalid_auth"), AttachmentFailurePolicy::Abort);
        let err = h.relay.handle("channel_id=C1&timestamp=100").await.unwrap_err();
        assert!(matches!(err, RelayError::SourceFetch(_)));
        assert_eq!(h.queue.send_count(), 0);
    }

    #[tokio::test]
    async fn transfer_failure_aborts_by_default() {
        let h = harness(InMemoryFetcher::new().with_message(jpg_message()), AttachmentFailurePolicy::Abort);
        h.store.fail_uploads(true);
        let err = h.relay.handle("channel_id=C1&timestamp=100").await.unwrap_err();
        assert!(matches!(err, RelayError::AttachmentTransfer(_)));
        assert_eq!(h.queue.send_count(), 0);
    }

    #[tokio::test]
    async fn transfer_failure_can_degrade_to_text() {
        let h = harness(InMemoryFetcher::new().with_message(jpg_message()), AttachmentFailurePolicy::RelayText);
        h.store.fail_containers(true);
        let outcome = h.relay.handle("channel_id=C1&timestamp=100").await.unwrap();
        let RelayOutcome::Relayed { message, .. } = outcome else {
            panic!("expected relayed, got {outcome:?}");
        };
        assert_eq!(message, NormalizedMessage::text_only("hi"));
    }

    #[tokio::test]
    async fn publish_failure_still_relays() {
        let h = harness(
            InMemoryFetcher::new().with_message(SourceMessage::text_only("C1", "100", "hi")),
            AttachmentFailurePolicy::Abort,
        );
        h.queue.fail_sends(true);
        let outcome = h.relay.handle("channel_id=C1&timestamp=100").await.unwrap();
        assert!(matches!(
            outcome,
            RelayOutcome::Relayed { publish: PublishOutcome::Failed { .. }, .. }
        ));
    }

    #[test]
    fn stage_names() {
        assert_eq!(RelayStage::SkippedTransfer.to_string(), "skipped_transfer");
        assert_eq!(RelayStage::Received.as_str(), "received");
        assert_eq!(RelayStage::Responded.to_string(), "responded");
    }
}
