use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::debug,
};

use courier_config::VaultConfig;

use crate::{
    error::{Result, VaultError},
    traits::SecretResolver,
};

const KEY_VAULT_API_VERSION: &str = "7.4";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SecretBundle {
    value: String,
}

/// Azure Key Vault resolver authenticated with AAD client credentials.
pub struct KeyVaultResolver {
    http: reqwest::Client,
    vault_url: String,
    authority: String,
    resource: String,
    client_id: String,
    client_secret: Secret<String>,
}

impl KeyVaultResolver {
    pub fn new(http: reqwest::Client, config: &VaultConfig) -> Self {
        Self {
            http,
            vault_url: config.vault_url.trim_end_matches('/').to_string(),
            authority: config.authority.trim_end_matches('/').to_string(),
            resource: config.resource.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    /// Exchange the client credentials for a vault access token.
    async fn access_token(&self) -> Result<Secret<String>> {
        let token_url = format!("{}/oauth2/token", self.authority);
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("resource", self.resource.as_str()),
        ];

        let resp = self
            .http
            .post(token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| VaultError::external("token request", e))?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(VaultError::TokenRequest { status, body });
        }

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| VaultError::external("decode token response", e))?;
        Ok(Secret::new(body.access_token))
    }
}

#[async_trait]
impl SecretResolver for KeyVaultResolver {
    async fn resolve(&self, name: &str) -> Result<Secret<String>> {
        if name.is_empty() {
            return Err(VaultError::EmptyName);
        }

        let token = self.access_token().await?;
        let url = format!(
            "{}/secrets/{}?api-version={KEY_VAULT_API_VERSION}",
            self.vault_url,
            urlencoding::encode(name)
        );
        let resp = self
            .http
            .get(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| VaultError::external(format!("fetch secret {name}"), e))?;

        match resp.status() {
            s if s.is_success() => {},
            reqwest::StatusCode::NOT_FOUND => {
                return Err(VaultError::NotFound {
                    name: name.to_string(),
                });
            },
            s => {
                return Err(VaultError::SecretRequest {
                    name: name.to_string(),
                    status: s.as_u16(),
                });
            },
        }

        let bundle: SecretBundle = resp
            .json()
            .await
            .map_err(|e| VaultError::external(format!("decode secret {name}"), e))?;
        debug!(secret = name, "resolved secret");
        Ok(Secret::new(bundle.value))
    }
}
