//! Semantic checks run before the relay starts serving.

use std::path::PathBuf;

use secrecy::ExposeSecret;

use crate::schema::CourierConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "blob.container"
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.severity, self.path, self.message)
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.to_string(),
            message: message.into(),
        });
    }

    fn require(&mut self, path: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(Severity::Error, path, "is required");
        } else if value.contains("${") {
            self.push(
                Severity::Error,
                path,
                format!("contains an unresolved placeholder: {value}"),
            );
        }
    }
}

/// Check that every setting the relay needs at request time is present.
pub fn validate(config: &CourierConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    result.require("vault.vault_url", &config.vault.vault_url);
    result.require("vault.authority", &config.vault.authority);
    result.require("vault.resource", &config.vault.resource);
    result.require("vault.client_id", &config.vault.client_id);
    result.require(
        "vault.client_secret",
        config.vault.client_secret.expose_secret(),
    );

    result.require("slack.history_url", &config.slack.history_url);
    result.require("slack.history_token_secret", &config.slack.history_token_secret);
    result.require(
        "slack.download_token_secret",
        &config.slack.download_token_secret,
    );

    result.require("blob.endpoint", &config.blob.endpoint);
    result.require("blob.container", &config.blob.container);
    result.require("blob.token_secret", &config.blob.token_secret);
    if !config.blob.container.is_empty() && !is_valid_container_name(&config.blob.container) {
        result.push(
            Severity::Error,
            "blob.container",
            "must be 3-63 lowercase letters, digits, or single dashes",
        );
    }

    result.require(
        "queue.connection_string_secret",
        &config.queue.connection_string_secret,
    );

    if !config.server.route.starts_with('/') {
        result.push(Severity::Error, "server.route", "must start with '/'");
    }
    if config.http.timeout_secs == 0 {
        result.push(
            Severity::Error,
            "http.timeout_secs",
            "must be at least 1; 0 would leave outbound calls without a timeout",
        );
    }
    for (path, url) in [
        ("vault.vault_url", &config.vault.vault_url),
        ("slack.history_url", &config.slack.history_url),
        ("blob.endpoint", &config.blob.endpoint),
    ] {
        if url.starts_with("http://") {
            result.push(Severity::Warning, path, "uses plain http");
        }
    }

    result
}

fn is_valid_container_name(name: &str) -> bool {
    (3..=63).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.starts_with('-')
        && !name.ends_with('-')
        && !name.contains("--")
}
