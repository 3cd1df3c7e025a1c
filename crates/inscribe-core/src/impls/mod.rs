//! Impls - ports の実装
//!
//! # ストレージ
//! - **NftStorageBackend**: nft.storage
//! - **PinataBackend**: Pinata
//! - **FilesystemBackend**: ローカルディレクトリ（静的ホスティング向け）
//! - **InMemoryBackend**: テスト・dry run
//!
//! # レジストリ
//! - **HttpRegistry**: 署名付き HTTP API
//! - **InMemoryRegistry**: テスト用

pub mod fs_storage;
pub mod http_registry;
pub mod inmem_registry;
pub mod inmem_storage;
pub mod nft_storage;
pub mod pinata;

pub use self::fs_storage::FilesystemBackend;
pub use self::http_registry::HttpRegistry;
pub use self::inmem_registry::InMemoryRegistry;
pub use self::inmem_storage::{InMemoryBackend, StoredObject};
pub use self::nft_storage::NftStorageBackend;
pub use self::pinata::PinataBackend;

use reqwest::{Response, StatusCode};
use sha2::{Digest, Sha256};

use crate::domain::{StorageLocator, UploadError};

/// sha256 の hex（content-addressed な名前に使う）
pub(crate) fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// `{cid}` を CID で置き換えて locator にする
pub(crate) fn gateway_locator(template: &str, cid: &str) -> StorageLocator {
    StorageLocator::new(template.replace("{cid}", cid))
}

/// 非 2xx レスポンスを UploadError に変換
pub(crate) async fn failure_from_response(response: Response) -> UploadError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    upload_failure(status, body)
}

fn upload_failure(status: StatusCode, body: String) -> UploadError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UploadError::Unauthorized {
            status: status.as_u16(),
        },
        _ => UploadError::Http {
            status: status.as_u16(),
            body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_sha256_hex() {
        assert_eq!(
            content_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn auth_failures_are_distinguished() {
        assert!(matches!(
            upload_failure(StatusCode::UNAUTHORIZED, String::new()),
            UploadError::Unauthorized { status: 401 }
        ));
        assert!(matches!(
            upload_failure(StatusCode::SERVICE_UNAVAILABLE, "down".into()),
            UploadError::Http { status: 503, body } if body == "down"
        ));
    }
}
