//! RegistryUpdater port - 外部レジストリの uri 書き換え
//!
//! レジストリ（オンチェーンの token metadata アカウントなど）は外部システムです。
//! このポートは「uri := metadata locator」の 1 回の書き込みだけを表します。

use async_trait::async_trait;

use crate::domain::{Credential, RegistryError, RegistryReceipt, UriUpdate};

/// RegistryUpdater はレコードの uri を更新する
///
/// # エラー
/// - `RegistryError::Authority`: credential がレコードの update authority と一致しない
/// - `RegistryError::NotFound`: レコードが存在しない
/// - `RegistryError::Transport`: ネットワーク・送信の失敗
///
/// リトライも書き込み後の読み戻し確認もしません。
#[async_trait]
pub trait RegistryUpdater: Send + Sync {
    async fn update(
        &self,
        update: &UriUpdate,
        authority: &Credential,
    ) -> Result<RegistryReceipt, RegistryError>;

    fn name(&self) -> &'static str;
}
