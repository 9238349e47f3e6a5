use std::{fmt, sync::Arc};

use {
    courier_config::{BlobConfig, SlackConfig},
    courier_slack::{Attachment, AttachmentDownloader},
    courier_vault::SecretResolver,
    tracing::{debug, info},
};

use crate::{
    error::{Error, Result},
    mime,
    store::BlobStore,
};

/// Where a transferred attachment ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLocator {
    pub container: String,
    pub name: String,
}

impl fmt::Display for BlobLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.name)
    }
}

/// Copies a chat attachment into blob storage.
///
/// Every call stores a fresh object: names are random and never derived from
/// the message, so relaying the same attachment twice yields two objects.
pub struct AttachmentTransfer {
    secrets: Arc<dyn SecretResolver>,
    downloader: Arc<dyn AttachmentDownloader>,
    store: Arc<dyn BlobStore>,
    download_token_secret: String,
    storage_token_secret: String,
    container: String,
}

impl AttachmentTransfer {
    pub fn new(
        secrets: Arc<dyn SecretResolver>,
        downloader: Arc<dyn AttachmentDownloader>,
        store: Arc<dyn BlobStore>,
        slack: &SlackConfig,
        blob: &BlobConfig,
    ) -> Self {
        Self {
            secrets,
            downloader,
            store,
            download_token_secret: slack.download_token_secret.clone(),
            storage_token_secret: blob.token_secret.clone(),
            container: blob.container.clone(),
        }
    }

    pub fn supports(&self, attachment: &Attachment) -> bool {
        mime::is_supported(&attachment.filetype)
    }

    pub async fn transfer(&self, attachment: &Attachment) -> Result<BlobLocator> {
        let Some(content_type) = mime::content_type_for(&attachment.filetype) else {
            return Err(Error::Unsupported {
                filetype: attachment.filetype.clone(),
            });
        };

        let download_token = self.secrets.resolve(&self.download_token_secret).await?;
        let data = self
            .downloader
            .download(&attachment.url_private, &download_token)
            .await
            .map_err(Error::Download)?;
        drop(download_token);
        debug!(bytes = data.len(), "downloaded attachment");

        let sas = self.secrets.resolve(&self.storage_token_secret).await?;
        self.store.ensure_container(&self.container, &sas).await?;

        let locator = BlobLocator {
            container: self.container.clone(),
            name: format!("{}.{}", uuid::Uuid::new_v4(), attachment.filetype),
        };
        self.store
            .put_object(&locator.container, &locator.name, data, content_type, &sas)
            .await?;

        info!(%locator, "stored attachment");
        Ok(locator)
    }
}
