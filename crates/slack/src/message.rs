use serde::Deserialize;

/// A message retrieved from channel history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMessage {
    pub channel_id: String,
    pub timestamp: String,
    pub text: String,
    pub attachment: Option<Attachment>,
}

impl SourceMessage {
    pub fn text_only(
        channel_id: impl Into<String>,
        timestamp: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            timestamp: timestamp.into(),
            text: text.into(),
            attachment: None,
        }
    }

    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// File metadata carried by a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Private download URL; requires a bearer token.
    pub url_private: String,
    /// Declared file type, e.g. `jpg`, `png`, `pdf`.
    pub filetype: String,
}

impl Attachment {
    pub fn new(url_private: impl Into<String>, filetype: impl Into<String>) -> Self {
        Self {
            url_private: url_private.into(),
            filetype: filetype.into(),
        }
    }
}

// ── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryResponse {
    #[serde(default = "default_ok")]
    pub ok: bool,
    pub error: Option<String>,
    #[serde(default)]
    pub messages: Vec<WireMessage>,
}

fn default_ok() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireMessage {
    #[serde(default)]
    pub text: String,
    pub ts: Option<String>,
    pub file: Option<WireFile>,
    #[serde(default)]
    pub files: Vec<WireFile>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireFile {
    pub filetype: Option<String>,
    pub url_private: Option<String>,
}

impl WireMessage {
    /// Convert to a [`SourceMessage`]. The legacy single `file` field wins
    /// over the first entry of `files`.
    pub fn into_source(self, channel_id: &str, requested_ts: &str) -> SourceMessage {
        let attachment = self
            .file
            .into_iter()
            .chain(self.files)
            .next()
            .and_then(|f| match (f.url_private, f.filetype) {
                (Some(url), Some(filetype)) => Some(Attachment::new(url, filetype)),
                (Some(url), None) => Some(Attachment::new(url, "")),
                _ => None,
            });

        SourceMessage {
            channel_id: channel_id.to_string(),
            timestamp: self.ts.unwrap_or_else(|| requested_ts.to_string()),
            text: self.text,
            attachment,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> WireMessage {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn text_only_message() {
        let msg = parse(r#"{"type":"message","text":"hi","ts":"100.1"}"#).into_source("C1", "100");
        assert_eq!(msg, SourceMessage::text_only("C1", "100.1", "hi"));
    }

    #[test]
    fn legacy_file_field() {
        let msg = parse(
            r#"{"text":"hi","file":{"filetype":"jpg","url_private":"http://x/y.jpg","name":"y.jpg"}}"#,
        )
        .into_source("C1", "100");
        assert_eq!(msg.timestamp, "100");
        assert_eq!(msg.attachment, Some(Attachment::new("http://x/y.jpg", "jpg")));
    }

    #[test]
    fn files_array_fallback() {
        let msg = parse(
            r#"{"text":"hi","files":[{"filetype":"png","url_private":"http://x/a.png"},{"filetype":"jpg","url_private":"http://x/b.jpg"}]}"#,
        )
        .into_source("C1", "100");
        assert_eq!(msg.attachment, Some(Attachment::new("http://x/a.png", "png")));
    }

    #[test]
    fn file_without_url_is_ignored() {
        let msg = parse(r#"{"text":"hi","file":{"filetype":"jpg"}}"#).into_source("C1", "1");
        assert_eq!(msg.attachment, None);
    }

    #[test]
    fn history_defaults() {
        let resp: HistoryResponse = serde_json::from_str(r#"{"messages":[]}"#).unwrap();
        assert!(resp.ok);
        assert!(resp.messages.is_empty());

        let resp: HistoryResponse =
            serde_json::from_str(r#"{"ok":false,"error":"channel_not_found"}"#).unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.error.as_deref(), Some("channel_not_found"));
    }
}
