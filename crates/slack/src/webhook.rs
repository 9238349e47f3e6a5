//! Outgoing-webhook payload decoding.
//!
//! Slack posts `application/x-www-form-urlencoded` bodies
//! (`token=…&channel_id=C1&timestamp=1700000000.000100&…`). Only the
//! correlation fields matter to the relay; everything else is kept for logging.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Decoded webhook body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookEvent {
    fields: HashMap<String, String>,
}

/// The `(channel_id, timestamp)` pair identifying one source message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationKey {
    pub channel_id: String,
    pub timestamp: String,
}

impl WebhookEvent {
    /// Decode a form body into its key/value pairs.
    ///
    /// Empty segments (empty body, trailing `&`) are skipped. Any other
    /// segment must contain exactly one `=`. A repeated key keeps its last
    /// value.
    pub fn decode(body: &str) -> Result<Self> {
        let mut fields = HashMap::new();
        for segment in body.split('&').filter(|s| !s.is_empty()) {
            let mut parts = segment.split('=');
            let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(Error::malformed(segment));
            };
            fields.insert(decode_component(key, segment)?, decode_component(value, segment)?);
        }
        Ok(Self { fields })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// The correlation key, if both fields are present and non-empty.
    pub fn correlation_key(&self) -> Option<CorrelationKey> {
        let channel_id = self.get("channel_id").filter(|v| !v.is_empty())?;
        let timestamp = self.get("timestamp").filter(|v| !v.is_empty())?;
        Some(CorrelationKey {
            channel_id: channel_id.to_string(),
            timestamp: timestamp.to_string(),
        })
    }
}

fn decode_component(raw: &str, segment: &str) -> Result<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .map_err(|_| Error::malformed(segment))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn key(channel_id: &str, timestamp: &str) -> Option<CorrelationKey> {
        Some(CorrelationKey {
            channel_id: channel_id.into(),
            timestamp: timestamp.into(),
        })
    }

    #[test]
    fn extracts_correlation_key() {
        let event = WebhookEvent::decode("channel_id=C1&timestamp=100").unwrap();
        assert_eq!(event.correlation_key(), key("C1", "100"));
    }

    #[test]
    fn order_and_extra_keys_do_not_matter() {
        let bodies = [
            "timestamp=100&channel_id=C1",
            "token=abc&team_id=T1&channel_id=C1&user_name=sam&timestamp=100&text=hello+world",
            "timestamp=100&trigger_word=go&channel_id=C1&",
        ];
        for body in bodies {
            let event = WebhookEvent::decode(body).unwrap();
            assert_eq!(event.correlation_key(), key("C1", "100"), "{body}");
        }
    }

    #[test]
    fn missing_or_empty_keys_yield_no_correlation() {
        for body in [
            "foo=bar",
            "channel_id=C1",
            "timestamp=100",
            "channel_id=&timestamp=100",
            "channel_id=C1&timestamp=",
            "",
        ] {
            let event = WebhookEvent::decode(body).unwrap();
            assert_eq!(event.correlation_key(), None, "{body}");
        }
    }

    #[test]
    fn segment_without_separator_is_malformed() {
        let err = WebhookEvent::decode("channel_id=C1&oops&timestamp=100").unwrap_err();
        assert!(matches!(err, Error::MalformedPayload { segment } if segment == "oops"));
    }

    #[test]
    fn segment_with_two_separators_is_malformed() {
        assert!(matches!(
            WebhookEvent::decode("channel_id=C1=C2&timestamp=100"),
            Err(Error::MalformedPayload { .. })
        ));
    }

    #[test]
    fn values_are_form_decoded() {
        let event =
            WebhookEvent::decode("channel_id=C1&timestamp=1700000000.000100&text=hi+there%21")
                .unwrap();
        assert_eq!(event.get("text"), Some("hi there!"));
        assert_eq!(event.get("timestamp"), Some("1700000000.000100"));
        assert_eq!(event.get("channel_id"), Some("C1"));
    }

    #[test]
    fn last_duplicate_wins() {
        let event = WebhookEvent::decode("channel_id=C1&channel_id=C2&timestamp=1").unwrap();
        assert_eq!(event.correlation_key(), key("C2", "1"));
    }

    #[test]
    fn invalid_utf8_escape_is_malformed() {
        assert!(matches!(
            WebhookEvent::decode("channel_id=%FF&timestamp=1"),
            Err(Error::MalformedPayload { .. })
        ));
    }
}
