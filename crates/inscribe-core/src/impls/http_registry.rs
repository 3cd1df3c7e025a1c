//! HttpRegistry - 署名付き JSON でレジストリの uri 更新 API を呼ぶ
//!
//! `POST {endpoint}/records/{address}/uri`
//!
//! ```json
//! { "network": "devnet", "address": "...", "uri": "...", "is_mutable": true,
//!   "authority": "<hex pubkey>", "signature": "<hex ed25519 signature>" }
//! ```
//!
//! 署名対象は [`UriUpdate::signing_payload`]。レジストリ側で authority の検証を行います。
//! address は 1 つの path segment として percent-encode されます。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{
    ConfigError, Credential, RecordAddress, RegistryError, RegistryReceipt, UriUpdate,
};
use crate::ports::{Clock, RegistryUpdater, SystemClock};

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    network: &'a str,
    address: &'a str,
    uri: &'a str,
    is_mutable: bool,
    authority: String,
    signature: String,
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    signature: String,
}

pub struct HttpRegistry {
    http_client: Client,
    endpoint: Url,
    network: String,
    clock: Arc<dyn Clock>,
}

impl HttpRegistry {
    pub fn new(
        endpoint: impl Into<String>,
        network: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        let endpoint = endpoint.into();
        let endpoint = Url::parse(&endpoint)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ConfigError::Invalid {
                key: "registry.endpoint".to_string(),
                reason: format!("not an absolute URL: {endpoint}"),
            })?;

        Ok(Self {
            http_client,
            endpoint,
            network: network.into(),
            clock: Arc::new(SystemClock),
        })
    }

    /// 受領時刻の Clock を差し替える
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// `{endpoint}/records/{address}/uri`
    fn update_url(&self, address: &RecordAddress) -> Result<Url, RegistryError> {
        // "." と ".." は URL 上で別のパスに解決されてしまう
        if matches!(address.as_str(), "" | "." | "..") {
            return Err(RegistryError::NotFound(address.clone()));
        }

        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| RegistryError::Transport(format!("unusable endpoint: {}", self.endpoint)))?
            .pop_if_empty()
            .extend(["records", address.as_str(), "uri"]);
        Ok(url)
    }

    fn receipt(&self, update: &UriUpdate, reference: String) -> RegistryReceipt {
        RegistryReceipt {
            address: update.address.clone(),
            uri: update.uri.to_string(),
            reference,
            updated_at: self.clock.now(),
        }
    }

    fn request<'a>(&'a self, update: &'a UriUpdate, authority: &Credential) -> UpdateRequest<'a> {
        UpdateRequest {
            network: &self.network,
            address: update.address.as_str(),
            uri: update.uri.as_str(),
            is_mutable: update.is_mutable,
            authority: authority.authority().to_hex(),
            signature: authority.sign_hex(&update.signing_payload()),
        }
    }
}

/// HTTP ステータスを RegistryError に写像
fn classify(
    status: StatusCode,
    body: String,
    update: &UriUpdate,
    authority: &Credential,
) -> RegistryError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RegistryError::Authority {
            address: update.address.clone(),
            presented: authority.authority().to_hex(),
            reason: if body.is_empty() {
                status.to_string()
            } else {
                body
            },
        },
        StatusCode::NOT_FOUND => RegistryError::NotFound(update.address.clone()),
        _ => RegistryError::Transport(format!("registry returned {status}: {body}")),
    }
}

#[async_trait]
impl RegistryUpdater for HttpRegistry {
    async fn update(
        &self,
        update: &UriUpdate,
        authority: &Credential,
    ) -> Result<RegistryReceipt, RegistryError> {
        let url = self.update_url(&update.address)?;

        let response = self
            .http_client
            .post(url)
            .json(&self.request(update, authority))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(address = %update.address, status = status.as_u16(), "registry rejected update");
            return Err(classify(status, body, update, authority));
        }

        let body: UpdateResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::Transport(format!("unexpected registry response: {e}")))?;

        info!(address = %update.address, signature = %body.signature, "registry update submitted");
        Ok(self.receipt(update, body.signature))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
