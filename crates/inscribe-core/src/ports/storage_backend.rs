//! StorageBackend port - 永続ストレージへのアップロード
//!
//! # 実装
//! - NftStorageBackend / PinataBackend（IPFS pinning サービス）
//! - FilesystemBackend（content-addressed なローカルディレクトリ）
//! - InMemoryBackend（テスト・dry run 用）

use async_trait::async_trait;

use crate::domain::{ContentType, StorageLocator, UploadError};

/// StorageBackend はバイト列を保存して恒久的な locator を返す
///
/// # 設計原則
/// - 1 回の呼び出しにつき試行は 1 回（内部でリトライしない）
/// - 同じバイト列を 2 回送ったら、同じ locator か、同じ内容を指す別の locator が返る
/// - タイムアウトは呼び出し側（PublishPipeline）が掛ける
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn upload(
        &self,
        bytes: &[u8],
        content_type: &ContentType,
    ) -> Result<StorageLocator, UploadError>;

    /// ログ用の backend 名
    fn name(&self) -> &'static str;
}
