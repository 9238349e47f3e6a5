//! Config schema types (server, vault, slack, blob, queue, relay).

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub vault: VaultConfig,
    pub slack: SlackConfig,
    pub blob: BlobConfig,
    pub queue: QueueConfig,
    pub relay: RelayConfig,
}

/// Inbound webhook server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    /// Port to listen on. Defaults to 7071.
    pub port: u16,
    /// Route that accepts webhook deliveries (GET and POST).
    pub route: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 7071,
            route: "/api/relay".into(),
        }
    }
}

/// Outbound HTTP client settings shared by every adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout; expiry fails the calling component.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Secret store (Azure Key Vault) access via AAD client credentials.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Vault base URL, e.g. `https://myvault.vault.azure.net`.
    pub vault_url: String,

    /// AAD authority including tenant, e.g. `https://login.microsoftonline.com/<tenant>`.
    pub authority: String,

    /// Resource the access token is requested for.
    pub resource: String,

    /// AAD application (client) ID.
    pub client_id: String,

    /// AAD application secret.
    #[serde(serialize_with = "serialize_secret")]
    pub client_secret: Secret<String>,
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("vault_url", &self.vault_url)
            .field("authority", &self.authority)
            .field("resource", &self.resource)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            vault_url: String::new(),
            authority: String::new(),
            resource: "https://vault.azure.net".into(),
            client_id: String::new(),
            client_secret: Secret::new(String::new()),
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Slack Web API settings. Token fields hold secret *names*, not values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Channel history endpoint.
    pub history_url: String,
    /// Secret holding the token used for history lookups.
    pub history_token_secret: String,
    /// Secret holding the bearer token used for private file downloads.
    pub download_token_secret: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            history_url: "https://slack.com/api/channels.history".into(),
            history_token_secret: "SlackToken".into(),
            download_token_secret: "SlackToken".into(),
        }
    }
}

/// Blob storage target for attachments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobConfig {
    /// Account endpoint, e.g. `https://acct.blob.core.windows.net`.
    pub endpoint: String,
    /// Container that receives attachments; created on demand.
    pub container: String,
    /// Secret holding the SAS token for the account.
    pub token_secret: String,
}

/// Durable queue (Azure Service Bus) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Secret holding the Service Bus connection string.
    pub connection_string_secret: String,
    /// Queue name used when the connection string has no `EntityPath`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_name: Option<String>,
    /// Server-side wait for a peek-lock receive.
    pub receive_timeout_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            connection_string_secret: String::new(),
            queue_name: None,
            receive_timeout_secs: 5,
        }
    }
}

/// Relay behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub on_attachment_failure: AttachmentFailurePolicy,
}

/// What to do when a supported attachment could not be transferred.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentFailurePolicy {
    /// Fail the request; nothing is published.
    #[default]
    Abort,
    /// Log the failure and publish the message as text-only.
    RelayText,
}
