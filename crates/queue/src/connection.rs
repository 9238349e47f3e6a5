//! Service Bus connection strings and shared-access signatures.

use std::fmt;

use {
    base64::{Engine, engine::general_purpose::STANDARD as BASE64},
    hmac::{Hmac, Mac},
    secrecy::{ExposeSecret, Secret},
    sha2::Sha256,
};

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Parsed `Endpoint=…;SharedAccessKeyName=…;SharedAccessKey=…[;EntityPath=…]`.
pub struct ConnectionString {
    /// HTTPS base URL of the namespace, without trailing slash.
    pub endpoint: String,
    pub key_name: String,
    key: Secret<String>,
    pub entity_path: Option<String>,
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionString")
            .field("endpoint", &self.endpoint)
            .field("key_name", &self.key_name)
            .field("key", &"[REDACTED]")
            .field("entity_path", &self.entity_path)
            .finish()
    }
}

impl ConnectionString {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut endpoint = None;
        let mut key_name = None;
        let mut key = None;
        let mut entity_path = None;

        for part in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            // Keys are base64 and may end in '='; split on the first one only.
            let Some((name, value)) = part.split_once('=') else {
                return Err(Error::invalid("segment without '='"));
            };
            match name.to_ascii_lowercase().as_str() {
                "endpoint" => endpoint = Some(value.to_string()),
                "sharedaccesskeyname" => key_name = Some(value.to_string()),
                "sharedaccesskey" => key = Some(value.to_string()),
                "entitypath" => entity_path = Some(value.to_string()).filter(|v| !v.is_empty()),
                _ => {},
            }
        }

        let endpoint = endpoint.ok_or_else(|| Error::invalid("missing Endpoint"))?;
        let endpoint = match endpoint.strip_prefix("sb://") {
            Some(rest) => format!("https://{rest}"),
            None if endpoint.starts_with("https://") || endpoint.starts_with("http://") => endpoint,
            None => return Err(Error::invalid(format!("unsupported endpoint scheme: {endpoint}"))),
        };

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key_name: key_name.ok_or_else(|| Error::invalid("missing SharedAccessKeyName"))?,
            key: Secret::new(key.ok_or_else(|| Error::invalid("missing SharedAccessKey"))?),
            entity_path,
        })
    }

    /// Build a `SharedAccessSignature` authorization value for `resource_uri`
    /// that expires at `expiry` (unix seconds).
    pub fn sas_token(&self, resource_uri: &str, expiry: u64) -> Result<String> {
        let encoded_uri = urlencoding::encode(&resource_uri.to_ascii_lowercase()).into_owned();
        let mut mac = HmacSha256::new_from_slice(self.key.expose_secret().as_bytes())
            .map_err(|e| Error::external("init sas hmac", e))?;
        mac.update(format!("{encoded_uri}\n{expiry}").as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        Ok(format!(
            "SharedAccessSignature sr={encoded_uri}&sig={}&se={expiry}&skn={}",
            urlencoding::encode(&signature),
            self.key_name,
        ))
    }
}
