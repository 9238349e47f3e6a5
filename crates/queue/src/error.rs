use std::error::Error as StdError;

use courier_vault::VaultError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid connection string: {reason}")]
    InvalidConnectionString { reason: String },

    #[error("no queue name: connection string has no EntityPath and none is configured")]
    MissingQueueName,

    #[error("queue {operation} failed ({status}): {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error(transparent)]
    Secret(#[from] VaultError),

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConnectionString {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn external<E>(context: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
