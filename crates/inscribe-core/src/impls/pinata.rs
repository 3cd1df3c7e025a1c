//! PinataBackend - Pinata の pinFileToIPFS API
//!
//! multipart の `file` パートで送り、`pinata_api_key` / `pinata_secret_api_key`
//! ヘッダで認証します。レスポンスの `IpfsHash` を gateway テンプレートに埋め込みます。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::{content_digest, failure_from_response, gateway_locator};
use crate::domain::{ConfigError, ContentType, StorageLocator, UploadError};
use crate::ports::StorageBackend;

pub const DEFAULT_ENDPOINT: &str = "https://api.pinata.cloud";
pub const DEFAULT_GATEWAY: &str = "https://gateway.pinata.cloud/ipfs/{cid}";

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

pub struct PinataBackend {
    http_client: Client,
    endpoint: String,
    gateway: String,
    api_key: String,
    secret_api_key: String,
}

impl PinataBackend {
    pub fn new(
        endpoint: impl Into<String>,
        gateway: impl Into<String>,
        api_key: impl Into<String>,
        secret_api_key: impl Into<String>,
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
            api_key: api_key.into(),
            secret_api_key: secret_api_key.into(),
        })
    }
}

/// pin 名はバイト列のハッシュ（元のファイル名は送らない）
fn file_name(bytes: &[u8], content_type: &ContentType) -> String {
    format!("{}.{}", &content_digest(bytes)[..16], content_type.extension())
}

#[async_trait]
impl StorageBackend for PinataBackend {
    async fn upload(
        &self,
        bytes: &[u8],
        content_type: &ContentType,
    ) -> Result<StorageLocator, UploadError> {
        let url = format!("{}/pinning/pinFileToIPFS", self.endpoint);

        let part = Part::bytes(bytes.to_vec())
            .file_name(file_name(bytes, content_type))
            .mime_str(content_type.as_str())?;
        let form = Form::new().part("file", part);

        let response = self
            .http_client
            .post(&url)
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.secret_api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(failure_from_response(response).await);
        }

        let body: PinResponse = response
            .json()
            .await
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))?;
        Ok(gateway_locator(&self.gateway, &body.ipfs_hash))
    }

    fn name(&self) -> &'static str {
        "pinata"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_response_is_parsed() {
        let body: PinResponse = serde_json::from_str(
            r#"{"IpfsHash":"QmHash","PinSize":100,"Timestamp":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(
            gateway_locator(DEFAULT_GATEWAY, &body.ipfs_hash).as_str(),
            "https://gateway.pinata.cloud/ipfs/QmHash"
        );
    }

    #[test]
    fn file_name_uses_digest_and_extension() {
        let name = file_name(b"abc", &ContentType::new("image/png"));
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), 16 + ".png".len());
    }
}
