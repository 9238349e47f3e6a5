use std::error::Error as StdError;

use courier_vault::VaultError;

/// Crate-wide result type for Slack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed Slack errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A form segment is not a single `key=value` pair.
    #[error("malformed webhook payload: segment {segment:?} is not a key=value pair")]
    MalformedPayload { segment: String },

    /// The API answered with a non-success HTTP status.
    #[error("slack {operation} failed ({status}): {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// The API answered `ok: false`.
    #[error("slack {operation} rejected: {reason}")]
    Rejected {
        operation: &'static str,
        reason: String,
    },

    /// The API token could not be resolved.
    #[error(transparent)]
    Secret(#[from] VaultError),

    /// Wrapped transport or decoding error.
    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn malformed(segment: impl Into<String>) -> Self {
        Self::MalformedPayload {
            segment: segment.into(),
        }
    }

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
