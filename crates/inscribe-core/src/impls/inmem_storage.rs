//! InMemoryBackend - テスト・dry run 用のストレージ
//!
//! sha256 で content-addressed なので、同じバイト列は同じ locator になります。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::content_digest;
use crate::domain::{ContentType, StorageLocator, UploadError};
use crate::ports::StorageBackend;

/// 保存済みオブジェクト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: ContentType,
}

/// InMemoryBackend は locator -> オブジェクトの HashMap
///
/// # 使用例
/// ```ignore
/// let storage = InMemoryBackend::new("mem://");
/// let locator = storage.upload(b"hello", &ContentType::new("text/plain")).await?;
/// let object = storage.fetch(&locator).await;
/// ```
pub struct InMemoryBackend {
    prefix: String,
    objects: RwLock<HashMap<StorageLocator, StoredObject>>,
}

impl InMemoryBackend {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub async fn fetch(&self, locator: &StorageLocator) -> Option<StoredObject> {
        self.objects.read().await.get(locator).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new("mem://")
    }
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    async fn upload(
        &self,
        bytes: &[u8],
        content_type: &ContentType,
    ) -> Result<StorageLocator, UploadError> {
        let locator = StorageLocator::new(format!("{}{}", self.prefix, content_digest(bytes)));
        self.objects.write().await.insert(
            locator.clone(),
            StoredObject {
                bytes: bytes.to_vec(),
                content_type: content_type.clone(),
            },
        );
        Ok(locator)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_then_fetch() {
        let storage = InMemoryBackend::default();
        let locator = storage
            .upload(b"hello", &ContentType::new("text/plain"))
            .await
            .unwrap();

        assert!(locator.as_str().starts_with("mem://"));
        let object = storage.fetch(&locator).await.unwrap();
        assert_eq!(object.bytes, b"hello");
        assert_eq!(object.content_type.as_str(), "text/plain");
    }

    #[tokio::test]
    async fn identical_bytes_share_a_locator() {
        let storage = InMemoryBackend::default();
        let ct = ContentType::new("image/png");
        let a = storage.upload(b"same", &ct).await.unwrap();
        let b = storage.upload(b"same", &ct).await.unwrap();
        let c = storage.upload(b"other", &ct).await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(storage.len().await, 2);
    }

    #[tokio::test]
    async fn fetch_unknown_locator_is_none() {
        let storage = InMemoryBackend::default();
        assert!(storage.is_empty().await);
        assert!(storage.fetch(&"mem://nope".into()).await.is_none());
    }
}
