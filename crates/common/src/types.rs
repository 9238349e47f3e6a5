//! Wire types shared by the relay pipeline and queue consumers.

use serde::{Deserialize, Deserializer, Serialize};

use crate::Result;

/// The normalized unit published to the work queue.
///
/// `is_file` is `true` iff an attachment was stored in blob storage, in which
/// case `file_path` holds its `container/name` locator. Otherwise `file_path`
/// is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedMessage {
    pub text: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub file_path: String,
    #[serde(default)]
    pub is_file: bool,
}

impl NormalizedMessage {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            file_path: String::new(),
            is_file: false,
        }
    }

    pub fn with_attachment(text: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            file_path: locator.into(),
            is_file: true,
        }
    }

    /// Serialize to the queue wire encoding.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a queue entry body.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

// Older producers emitted `"filePath": null` for text-only messages.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
