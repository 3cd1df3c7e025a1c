//! NftStorageBackend - nft.storage の HTTP upload API
//!
//! `POST {endpoint}/upload` に生のバイト列を送り、`Authorization: Bearer` で認証します。
//! レスポンス `{"ok": true, "value": {"cid": "..."}}` の CID を gateway テンプレートに
//! 埋め込んで locator にします。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::debug;

use super::{failure_from_response, gateway_locator};
use crate::domain::{ConfigError, ContentType, StorageLocator, UploadError};
use crate::ports::StorageBackend;

pub const DEFAULT_ENDPOINT: &str = "https://api.nft.storage";
pub const DEFAULT_GATEWAY: &str = "https://{cid}.ipfs.nftstorage.link";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    ok: bool,
    #[serde(default)]
    value: Option<UploadValue>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct UploadValue {
    cid: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

pub struct NftStorageBackend {
    http_client: Client,
    endpoint: String,
    gateway: String,
    token: String,
}

impl NftStorageBackend {
    pub fn new(
        endpoint: impl Into<String>,
        gateway: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            gateway: gateway.into(),
            token: token.into(),
        })
    }

    fn locator_from(&self, response: UploadResponse) -> Result<StorageLocator, UploadError> {
        match response {
            UploadResponse {
                ok: true,
                value: Some(value),
                ..
            } => Ok(gateway_locator(&self.gateway, &value.cid)),
            UploadResponse { error, .. } => Err(UploadError::InvalidResponse(
                error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "response did not contain a cid".to_string()),
            )),
        }
    }
}

#[async_trait]
impl StorageBackend for NftStorageBackend {
    async fn upload(
        &self,
        bytes: &[u8],
        content_type: &ContentType,
    ) -> Result<StorageLocator, UploadError> {
        let url = format!("{}/upload", self.endpoint);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, content_type.as_str())
            .body(bytes.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(failure_from_response(response).await);
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))?;
        debug!(ok = body.ok, "nft.storage responded");
        self.locator_from(body)
    }

    fn name(&self) -> &'static str {
        "nft_storage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> NftStorageBackend {
        NftStorageBackend::new(DEFAULT_ENDPOINT, DEFAULT_GATEWAY, "t", Duration::from_secs(1))
            .unwrap()
    }

    #[test]
    fn cid_is_placed_into_gateway_template() {
        let body: UploadResponse =
            serde_json::from_str(r#"{"ok":true,"value":{"cid":"bafyabc","size":3}}"#).unwrap();
        let locator = backend().locator_from(body).unwrap();
        assert_eq!(locator.as_str(), "https://bafyabc.ipfs.nftstorage.link");
    }

    #[test]
    fn not_ok_response_carries_provider_message() {
        let body: UploadResponse =
            serde_json::from_str(r#"{"ok":false,"error":{"name":"x","message":"quota exceeded"}}"#)
                .unwrap();
        let err = backend().locator_from(body).unwrap_err();
        assert!(matches!(err, UploadError::InvalidResponse(m) if m == "quota exceeded"));
    }

    #[test]
    fn ok_without_value_is_invalid() {
        let body: UploadResponse = serde_json::from_str(r#"{"ok":true}"#).unwrap();
        assert!(matches!(
            backend().locator_from(body),
            Err(UploadError::InvalidResponse(_))
        ));
    }

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let b = NftStorageBackend::new(
            "https://api.nft.storage/",
            DEFAULT_GATEWAY,
            "t",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(b.endpoint, "https://api.nft.storage");
    }
}
