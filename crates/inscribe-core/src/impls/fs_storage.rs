//! FilesystemBackend - content-addressed なローカルディレクトリ
//!
//! `{root}/{sha256}.{ext}` に書き込みます。すでに同名ファイルがあれば
//! 内容も同じなので書き込みを省略します。
//! 同じ内容の upload が並行しても、一時ファイルは呼び出しごとに別名です。
//!
//! locator は `base_url` があれば `{base_url}/{file}`、無ければ `file://` の絶対パス。
//! 静的ホスティングや Git リポジトリの raw URL に置く運用を想定しています。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::content_digest;
use crate::domain::{ContentType, StorageLocator, UploadError};
use crate::ports::StorageBackend;

pub struct FilesystemBackend {
    root: PathBuf,
    base_url: Option<String>,
}

impl FilesystemBackend {
    pub fn new(root: impl Into<PathBuf>, base_url: Option<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn locator_for(&self, path: &Path, file_name: &str) -> Result<StorageLocator, UploadError> {
        match &self.base_url {
            Some(base) => Ok(StorageLocator::new(format!("{base}/{file_name}"))),
            None => {
                let absolute = std::path::absolute(path)?;
                Ok(StorageLocator::new(format!("file://{}", absolute.display())))
            }
        }
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn upload(
        &self,
        bytes: &[u8],
        content_type: &ContentType,
    ) -> Result<StorageLocator, UploadError> {
        let file_name = format!("{}.{}", content_digest(bytes), content_type.extension());
        let path = self.root.join(&file_name);

        if fs::try_exists(&path).await? {
            debug!(path = %path.display(), "object already stored");
        } else {
            fs::create_dir_all(&self.root).await?;
            // 途中で落ちても壊れたファイルを残さないよう一時ファイル経由で置く
            let tmp = self
                .root
                .join(format!(".{file_name}.{:016x}.partial", rand::random::<u64>()));
            fs::write(&tmp, bytes).await?;
            if let Err(e) = fs::rename(&tmp, &path).await {
                let _ = fs::remove_file(&tmp).await;
                // 並行した同一 upload が先に置いていれば成功扱い
                if !fs::try_exists(&path).await? {
                    return Err(e.into());
                }
                debug!(path = %path.display(), "object stored concurrently");
            }
        }

        self.locator_for(&path, &file_name)
    }

    fn name(&self) -> &'static str {
        "filesystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_writes_content_addressed_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemBackend::new(dir.path(), Some("https://cdn.example/assets/".into()));

        let locator = storage
            .upload(b"png-bytes", &ContentType::new("image/png"))
            .await
            .unwrap();

        let expected_name = format!("{}.png", content_digest(b"png-bytes"));
        assert_eq!(
            locator.as_str(),
            format!("https://cdn.example/assets/{expected_name}")
        );
        let written = std::fs::read(dir.path().join(&expected_name)).unwrap();
        assert_eq!(written, b"png-bytes");
    }

    #[tokio::test]
    async fn upload_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemBackend::new(dir.path(), None);
        let ct = ContentType::json();

        let a = storage.upload(b"{}", &ct).await.unwrap();
        let b = storage.upload(b"{}", &ct).await.unwrap();

        assert_eq!(a, b);
        assert!(a.as_str().starts_with("file://"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_identical_uploads_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let storage = std::sync::Arc::new(FilesystemBackend::new(dir.path(), None));
        let payload: Vec<u8> = (0..4 * 1024 * 1024).map(|i| (i % 251) as u8).collect();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let storage = storage.clone();
                let payload = payload.clone();
                tokio::spawn(async move {
                    storage
                        .upload(&payload, &ContentType::new("image/png"))
                        .await
                })
            })
            .collect();

        let mut locators = Vec::new();
        for handle in handles {
            locators.push(handle.await.unwrap().unwrap());
        }
        assert!(locators.windows(2).all(|w| w[0] == w[1]));

        // 一時ファイルは残らない
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1, "{names:?}");
        let stored = std::fs::read(dir.path().join(&names[0])).unwrap();
        assert_eq!(stored, payload);
    }

    #[tokio::test]
    async fn upload_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested/out");
        let storage = FilesystemBackend::new(&root, None);

        storage
            .upload(b"x", &ContentType::new("text/plain"))
            .await
            .unwrap();
        assert!(root.is_dir());
    }
}
