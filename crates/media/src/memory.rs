use std::{
    collections::{HashMap, HashSet},
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use {async_trait::async_trait, bytes::Bytes, secrecy::Secret};

use crate::{
    error::{Error, Result},
    store::BlobStore,
};

/// A stored object as the in-memory store keeps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// Blob store held in process memory.
#[derive(Default)]
pub struct InMemoryBlobStore {
    containers: Mutex<HashSet<String>>,
    objects: Mutex<HashMap<(String, String), StoredObject>>,
    fail_containers: AtomicBool,
    fail_uploads: AtomicBool,
    calls: AtomicUsize,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_containers(&self, fail: bool) {
        self.fail_containers.store(fail, Ordering::SeqCst);
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Number of `ensure_container` and `put_object` calls.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn object(&self, container: &str, name: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(container.to_string(), name.to_string()))
            .cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn has_container(&self, container: &str) -> bool {
        self.containers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(container)
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn ensure_container(&self, container: &str, _sas: &Secret<String>) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_containers.load(Ordering::SeqCst) {
            return Err(Error::Storage {
                operation: "create container",
                status: 403,
                body: "AuthorizationFailure".into(),
            });
        }
        self.containers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(container.to_string());
        Ok(())
    }

    async fn put_object(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
        _sas: &Secret<String>,
    ) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(Error::Storage {
                operation: "upload",
                status: 500,
                body: "InternalError".into(),
            });
        }
        if !self.has_container(container) {
            return Err(Error::Storage {
                operation: "upload",
                status: 404,
                body: "ContainerNotFound".into(),
            });
        }
        self.objects.lock().unwrap_or_else(|e| e.into_inner()).insert(
            (container.to_string(), name.to_string()),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}
