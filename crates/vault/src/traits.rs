//! Resolver trait shared by every component that needs a credential.

use {async_trait::async_trait, secrecy::Secret};

use crate::error::Result;

/// Resolve a configured secret name to its current value.
///
/// Implementations must not cache: callers rely on each call reflecting the
/// store's current state, and they drop the returned value as soon as the
/// operation that needed it finishes.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<Secret<String>>;
}
