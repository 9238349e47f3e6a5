//! Azure Service Bus over its REST interface.

use {
    async_trait::async_trait,
    reqwest::{StatusCode, header},
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::debug,
};

use courier_config::QueueConfig;

use crate::{
    connection::ConnectionString,
    error::{Error, Result},
    transport::{QueueTransport, ReceivedEntry},
};

const TOKEN_TTL_SECS: u64 = 3600;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BrokerProperties {
    lock_token: String,
    message_id: String,
}

pub struct ServiceBusQueue {
    http: reqwest::Client,
    queue_name: Option<String>,
    receive_timeout_secs: u64,
}

/// Queue URL and authorization header for one call.
struct Target {
    queue_url: String,
    authorization: String,
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl ServiceBusQueue {
    pub fn new(http: reqwest::Client, config: &QueueConfig) -> Self {
        Self {
            http,
            queue_name: config.queue_name.clone().filter(|q| !q.is_empty()),
            receive_timeout_secs: config.receive_timeout_secs,
        }
    }

    fn target(&self, credentials: &Secret<String>) -> Result<Target> {
        let conn = ConnectionString::parse(credentials.expose_secret())?;
        let queue = conn
            .entity_path
            .as_deref()
            .or(self.queue_name.as_deref())
            .ok_or(Error::MissingQueueName)?;
        let queue_url = format!("{}/{queue}", conn.endpoint);
        let authorization = conn.sas_token(&queue_url, unix_now() + TOKEN_TTL_SECS)?;
        Ok(Target {
            queue_url,
            authorization,
        })
    }

    fn lock_url(target: &Target, entry: &ReceivedEntry) -> String {
        format!(
            "{}/messages/{}/{}",
            target.queue_url,
            urlencoding::encode(&entry.message_id),
            urlencoding::encode(&entry.lock_token),
        )
    }
}

async fn status_error(operation: &'static str, resp: reqwest::Response) -> Error {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Error::Status {
        operation,
        status,
        body,
    }
}

#[async_trait]
impl QueueTransport for ServiceBusQueue {
    async fn send(&self, body: String, credentials: &Secret<String>) -> Result<()> {
        let target = self.target(credentials)?;
        let resp = self
            .http
            .post(format!("{}/messages", target.queue_url))
            .header(header::AUTHORIZATION, &target.authorization)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::external("service bus send", e))?;

        if !resp.status().is_success() {
            return Err(status_error("send", resp).await);
        }
        Ok(())
    }

    async fn receive(&self, credentials: &Secret<String>) -> Result<Option<ReceivedEntry>> {
        let target = self.target(credentials)?;
        let resp = self
            .http
            .post(format!("{}/messages/head", target.queue_url))
            .query(&[("timeout", self.receive_timeout_secs)])
            .header(header::AUTHORIZATION, &target.authorization)
            .header(header::CONTENT_LENGTH, 0)
            .send()
            .await
            .map_err(|e| Error::external("service bus receive", e))?;

        match resp.status() {
            StatusCode::NO_CONTENT => return Ok(None),
            s if s.is_success() => {},
            _ => return Err(status_error("receive", resp).await),
        }

        let props = resp
            .headers()
            .get("BrokerProperties")
            .ok_or_else(|| Error::Status {
                operation: "receive",
                status: resp.status().as_u16(),
                body: "missing BrokerProperties header".into(),
            })?;
        let props: BrokerProperties = serde_json::from_slice(props.as_bytes())
            .map_err(|e| Error::external("decode BrokerProperties", e))?;
        let body = resp
            .text()
            .await
            .map_err(|e| Error::external("read service bus entry", e))?;

        debug!(message_id = %props.message_id, "locked queue entry");
        Ok(Some(ReceivedEntry {
            body,
            message_id: props.message_id,
            lock_token: props.lock_token,
        }))
    }

    async fn complete(&self, entry: &ReceivedEntry, credentials: &Secret<String>) -> Result<()> {
        let target = self.target(credentials)?;
        let resp = self
            .http
            .delete(Self::lock_url(&target, entry))
            .header(header::AUTHORIZATION, &target.authorization)
            .send()
            .await
            .map_err(|e| Error::external("service bus complete", e))?;

        if !resp.status().is_success() {
            return Err(status_error("complete", resp).await);
        }
        Ok(())
    }

    async fn abandon(&self, entry: &ReceivedEntry, credentials: &Secret<String>) -> Result<()> {
        let target = self.target(credentials)?;
        let resp = self
            .http
            .put(Self::lock_url(&target, entry))
            .header(header::AUTHORIZATION, &target.authorization)
            .header(header::CONTENT_LENGTH, 0)
            .send()
            .await
            .map_err(|e| Error::external("service bus abandon", e))?;

        if !resp.status().is_success() {
            return Err(status_error("abandon", resp).await);
        }
        Ok(())
    }
}
