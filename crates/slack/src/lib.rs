//! Slack source adapter for the relay.
//!
//! Decodes outgoing-webhook deliveries, looks the referenced message up with
//! the channel history API, and downloads private file attachments.

pub mod download;
pub mod error;
pub mod history;
pub mod memory;
pub mod message;
pub mod webhook;

pub use {
    download::{AttachmentDownloader, SlackFileDownloader},
    error::{Error, Result},
    history::{MessageFetcher, SlackHistoryClient},
    memory::{InMemoryDownloader, InMemoryFetcher},
    message::{Attachment, SourceMessage},
    webhook::{CorrelationKey, WebhookEvent},
};
