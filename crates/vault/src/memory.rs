use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use {async_trait::async_trait, secrecy::Secret};

use crate::{
    error::{Result, VaultError},
    traits::SecretResolver,
};

/// In-memory resolver for tests and local runs.
///
/// Records every lookup so callers can assert how many round-trips a code
/// path would have made against a real vault.
#[derive(Default)]
pub struct InMemorySecrets {
    values: HashMap<String, String>,
    lookups: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl InMemorySecrets {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Number of `resolve` calls so far, successful or not.
    pub fn resolve_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Names passed to `resolve`, in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl SecretResolver for InMemorySecrets {
    async fn resolve(&self, name: &str) -> Result<Secret<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.lookups
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(name.to_string());

        if name.is_empty() {
            return Err(VaultError::EmptyName);
        }
        self.values
            .get(name)
            .map(|v| Secret::new(v.clone()))
            .ok_or_else(|| VaultError::NotFound {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, secrecy::ExposeSecret};

    #[tokio::test]
    async fn resolves_known_and_counts_every_call() {
        let secrets = InMemorySecrets::new().with_secret("SlackToken", "xoxb");
        assert_eq!(
            secrets.resolve("SlackToken").await.unwrap().expose_secret(),
            "xoxb"
        );
        assert!(matches!(
            secrets.resolve("Other").await,
            Err(VaultError::NotFound { .. })
        ));
        assert_eq!(secrets.resolve_count(), 2);
        assert_eq!(secrets.lookups(), vec!["SlackToken", "Other"]);
    }
}
