//! Vault error types.

use std::error::Error as StdError;

/// Errors produced while resolving a secret.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// The caller asked for a secret without naming it.
    #[error("secret name is empty")]
    EmptyName,

    /// The client-credential exchange was refused.
    #[error("token request failed ({status}): {body}")]
    TokenRequest { status: u16, body: String },

    /// The vault has no secret under this name.
    #[error("secret not found: {name}")]
    NotFound { name: String },

    /// The vault answered with an unexpected status.
    #[error("secret request for {name} failed ({status})")]
    SecretRequest { name: String, status: u16 },

    /// Transport or decoding failure talking to the authority or the vault.
    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl VaultError {
    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;
