//! Inputs - ローカルファイルの読み書き（asset / テンプレート / 出力 metadata）
//!
//! ここでの失敗はすべて ConfigError（ネットワーク呼び出しの前）。

use std::path::Path;

use tokio::fs;

use crate::domain::{AssetFile, ConfigError, ContentType, MetadataDocument};

/// asset ファイルを読む
///
/// content type は `content_type` があればそれ、無ければ拡張子から推定します。
pub async fn load_asset(
    path: &Path,
    content_type: Option<&str>,
) -> Result<AssetFile, ConfigError> {
    let bytes = fs::read(path).await.map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(ConfigError::Invalid {
            key: "asset".to_string(),
            reason: format!("{} is empty", path.display()),
        });
    }

    let content_type = match content_type {
        Some(explicit) => ContentType::new(explicit),
        None => ContentType::from_path(path),
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(AssetFile::new(name, bytes, content_type))
}

pub async fn load_template(path: &Path) -> Result<MetadataDocument, ConfigError> {
    let raw = fs::read(path).await.map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    MetadataDocument::from_slice(&raw).map_err(|source| ConfigError::Template {
        path: path.to_path_buf(),
        source,
    })
}

/// 書き換え後の metadata を整形 JSON で保存
pub async fn write_metadata(path: &Path, document: &MetadataDocument) -> Result<(), ConfigError> {
    let write_error = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut pretty = serde_json::to_vec_pretty(document)
        .map_err(|e| write_error(std::io::Error::other(e)))?;
    pretty.push(b'\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(write_error)?;
    }
    fs::write(path, pretty).await.map_err(write_error)
}
