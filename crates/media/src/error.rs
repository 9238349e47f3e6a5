use std::error::Error as StdError;

use courier_vault::VaultError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported attachment type: {filetype:?}")]
    Unsupported { filetype: String },

    #[error("attachment download failed: {0}")]
    Download(#[source] courier_slack::Error),

    #[error(transparent)]
    Secret(#[from] VaultError),

    #[error("blob {operation} failed ({status}): {body}")]
    Storage {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
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
