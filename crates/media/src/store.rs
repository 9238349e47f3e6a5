use {
    async_trait::async_trait,
    bytes::Bytes,
    reqwest::{StatusCode, header},
    secrecy::{ExposeSecret, Secret},
    tracing::debug,
};

use crate::error::{Error, Result};

const API_VERSION: &str = "2021-08-06";

/// Object storage with SAS-style per-call credentials.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Create `container` if missing. Succeeds when it already exists.
    async fn ensure_container(&self, container: &str, sas: &Secret<String>) -> Result<()>;

    async fn put_object(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
        sas: &Secret<String>,
    ) -> Result<()>;
}

/// Azure Blob Storage over its REST interface.
pub struct AzureBlobStore {
    http: reqwest::Client,
    endpoint: String,
}

impl AzureBlobStore {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str, query: Option<&str>, sas: &Secret<String>) -> String {
        let sas = sas.expose_secret().trim_start_matches('?');
        match (query, sas.is_empty()) {
            (Some(q), true) => format!("{}/{path}?{q}", self.endpoint),
            (Some(q), false) => format!("{}/{path}?{q}&{sas}", self.endpoint),
            (None, true) => format!("{}/{path}", self.endpoint),
            (None, false) => format!("{}/{path}?{sas}", self.endpoint),
        }
    }
}

async fn storage_error(operation: &'static str, resp: reqwest::Response) -> Error {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Error::Storage {
        operation,
        status,
        body,
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    async fn ensure_container(&self, container: &str, sas: &Secret<String>) -> Result<()> {
        let resp = self
            .http
            .put(self.url(container, Some("restype=container"), sas))
            .header("x-ms-version", API_VERSION)
            .header(header::CONTENT_LENGTH, 0)
            .send()
            .await
            .map_err(|e| Error::external("blob container request", e.without_url()))?;

        match resp.status() {
            StatusCode::CREATED => {
                debug!(container, "created blob container");
                Ok(())
            },
            StatusCode::CONFLICT => Ok(()),
            _ => Err(storage_error("create container", resp).await),
        }
    }

    async fn put_object(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
        sas: &Secret<String>,
    ) -> Result<()> {
        let resp = self
            .http
            .put(self.url(&format!("{container}/{name}"), None, sas))
            .header("x-ms-version", API_VERSION)
            .header("x-ms-blob-type", "BlockBlob")
            .header(header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| Error::external("blob upload request", e.without_url()))?;

        if !resp.status().is_success() {
            return Err(storage_error("upload", resp).await);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, mockito::Matcher};

    fn sas() -> Secret<String> {
        Secret::new("?sv=2021&sig=abc".into())
    }

    #[tokio::test]
    async fn creates_missing_container() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/attachments")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("restype".into(), "container".into()),
                Matcher::UrlEncoded("sig".into(), "abc".into()),
            ]))
            .with_status(201)
            .create_async()
            .await;

        AzureBlobStore::new(reqwest::Client::new(), server.url())
            .ensure_container("attachments", &sas())
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn existing_container_is_fine() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PUT", "/attachments")
            .match_query(Matcher::Any)
            .with_status(409)
            .with_body("ContainerAlreadyExists")
            .create_async()
            .await;

        AzureBlobStore::new(reqwest::Client::new(), format!("{}/", server.url()))
            .ensure_container("attachments", &sas())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn container_failure_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PUT", "/attachments")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("AuthenticationFailed")
            .create_async()
            .await;

        let err = AzureBlobStore::new(reqwest::Client::new(), server.url())
            .ensure_container("attachments", &sas())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage { status: 403, .. }));
    }

    #[tokio::test]
    async fn uploads_block_blob() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/attachments/a.jpg")
            .match_query(Matcher::UrlEncoded("sig".into(), "abc".into()))
            .match_header("x-ms-blob-type", "BlockBlob")
            .match_header("content-type", "image/jpeg")
            .match_body(vec![1u8, 2, 3])
            .with_status(201)
            .create_async()
            .await;

        AzureBlobStore::new(reqwest::Client::new(), server.url())
            .put_object(
                "attachments",
                "a.jpg",
                Bytes::from_static(&[1, 2, 3]),
                "image/jpeg",
                &sas(),
            )
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upload_failure_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PUT", "/attachments/a.jpg")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let err = AzureBlobStore::new(reqwest::Client::new(), server.url())
            .put_object("attachments", "a.jpg", Bytes::new(), "image/jpeg", &sas())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage { operation: "upload", status: 500, .. }));
    }

    #[tokio::test]
    async fn transport_errors_do_not_leak_sas() {
        let store = AzureBlobStore::new(reqwest::Client::new(), "http://127.0.0.1:1");
        let sas = Secret::new("sv=1&sig=SASSECRET".into());

        let container_err = store.ensure_container("attachments", &sas).await.unwrap_err();
        let upload_err = store
            .put_object("attachments", "a.jpg", Bytes::new(), "image/jpeg", &sas)
            .await
            .unwrap_err();

        for err in [container_err, upload_err] {
            assert!(matches!(err, Error::External { .. }));
            let rendered = format!("{err} {err:?}");
            assert!(!rendered.contains("SASSECRET"), "{rendered}");
        }
    }
}
