//! PublishPipeline - upload -> build -> re-upload -> (registry)
//!
//! ステージは厳密に直列です。前のステージが成功するまで次は始まりません。
//!
//! 1. asset 本体をアップロード（失敗: `stage=image`）
//! 2. MetadataBuilder でテンプレートに locator を差し込む
//! 3. ドキュメントを canonical JSON にしてアップロード（失敗: `stage=metadata`）
//! 4. （任意）metadata locator でレジストリの uri を更新（失敗: `stage=registry`）
//!
//! image のアップロード後に metadata が失敗しても巻き戻しはしません
//! （ストレージは追記のみで不変）。リトライはパイプライン全体のやり直しで、
//! 途中結果の再利用はしません。

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::domain::{
    AssetFile, ConfigError, ContentType, Credential, MetadataBuilder, MetadataDocument,
    PublishError, PublishReport, PublishResult, RecordAddress, RegistryError, RegistryReceipt,
    Stage, StorageLocator, UploadError, UriUpdate,
};
use crate::ports::{IdGenerator, RegistryUpdater, StorageBackend};

use super::builder::PipelineBuilder;

pub struct PublishPipeline {
    storage: Arc<dyn StorageBackend>,
    registry: Option<Arc<dyn RegistryUpdater>>,
    ids: Arc<dyn IdGenerator>,
    timeout: Duration,
}

impl PublishPipeline {
    pub(crate) fn new(
        storage: Arc<dyn StorageBackend>,
        registry: Option<Arc<dyn RegistryUpdater>>,
        ids: Arc<dyn IdGenerator>,
        timeout: Duration,
    ) -> Self {
        Self {
            storage,
            registry,
            ids,
            timeout,
        }
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn has_registry(&self) -> bool {
        self.registry.is_some()
    }

    /// asset と metadata をアップロードして両方の locator を返す
    pub async fn publish(
        &self,
        asset: &AssetFile,
        template: &MetadataDocument,
    ) -> Result<PublishResult, PublishError> {
        let run_id = self.ids.generate_run_id();
        let span = info_span!(
            "publish",
            run_id = %run_id,
            asset = asset.name(),
            backend = self.storage.name(),
        );

        async move {
            let image_locator = self
                .upload(Stage::Image, asset.bytes(), asset.content_type())
                .await?;

            let document = MetadataBuilder::build(template, &image_locator, asset.content_type());
            let encoded = document
                .to_canonical_bytes()
                .map_err(|e| PublishError::upload(Stage::Metadata, UploadError::Encode(e)))?;

            let metadata_locator = self
                .upload(Stage::Metadata, &encoded, &ContentType::json())
                .await?;

            info!(
                image = %image_locator,
                metadata = %metadata_locator,
                "publish completed"
            );
            Ok(PublishResult {
                run_id,
                image_locator,
                metadata_locator,
                document,
            })
        }
        .instrument(span)
        .await
    }

    /// 独立した複数の (asset, template) を並行に publish する
    ///
    /// 結果は入力と同じ順序。1 件の失敗は他の実行に影響しません。
    pub async fn publish_all(
        &self,
        jobs: &[(AssetFile, MetadataDocument)],
    ) -> Vec<Result<PublishResult, PublishError>> {
        join_all(
            jobs.iter()
                .map(|(asset, template)| self.publish(asset, template)),
        )
        .await
    }

    /// レジストリの uri を書き換える（1 回だけ、読み戻し確認なし）
    pub async fn update_registry(
        &self,
        update: &UriUpdate,
        authority: &Credential,
    ) -> Result<RegistryReceipt, PublishError> {
        let registry = self
            .registry
            .as_ref()
            .ok_or_else(|| ConfigError::Missing("registry".to_string()))?;

        let span = info_span!(
            "registry_update",
            address = %update.address,
            registry = registry.name(),
        );
        async move {
            debug!(uri = %update.uri, is_mutable = update.is_mutable, "submitting uri update");
            let outcome = match tokio::time::timeout(self.timeout, registry.update(update, authority))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(RegistryError::Transport(format!(
                    "registry update timed out after {:?}",
                    self.timeout
                ))),
            };

            match outcome {
                Ok(receipt) => {
                    info!(reference = %receipt.reference, "registry updated");
                    Ok(receipt)
                }
                Err(e) => {
                    warn!(error = %e, "registry update failed");
                    Err(e.into())
                }
            }
        }
        .instrument(span)
        .await
    }

    /// publish してから、その metadata locator でレジストリを更新する
    ///
    /// registry が無い場合はアップロード前に ConfigError で止まります。
    pub async fn publish_and_register(
        &self,
        asset: &AssetFile,
        template: &MetadataDocument,
        address: RecordAddress,
        is_mutable: bool,
        authority: &Credential,
    ) -> Result<PublishReport, PublishError> {
        if self.registry.is_none() {
            return Err(ConfigError::Missing("registry".to_string()).into());
        }

        let result = self.publish(asset, template).await?;
        let update = UriUpdate::new(address, result.metadata_locator.clone(), is_mutable);
        let receipt = self.update_registry(&update, authority).await?;

        Ok(PublishReport::new(&result).with_receipt(receipt))
    }

    async fn upload(
        &self,
        stage: Stage,
        bytes: &[u8],
        content_type: &ContentType,
    ) -> Result<StorageLocator, PublishError> {
        debug!(%stage, bytes = bytes.len(), %content_type, "uploading");

        let outcome = match tokio::time::timeout(self.timeout, self.storage.upload(bytes, content_type))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(UploadError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(locator) => {
                info!(%stage, locator = %locator, "uploaded");
                Ok(locator)
            }
            Err(e) => {
                warn!(%stage, error = %e, "upload failed");
                Err(PublishError::upload(stage, e))
            }
        }
    }
}
