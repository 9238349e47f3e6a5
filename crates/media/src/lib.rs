//! Attachment transfer: download a chat attachment and persist it to blob storage.

pub mod error;
pub mod memory;
pub mod mime;
pub mod store;
pub mod transfer;

pub use {
    error::{Error, Result},
    memory::InMemoryBlobStore,
    store::{AzureBlobStore, BlobStore},
    transfer::{AttachmentTransfer, BlobLocator},
};
