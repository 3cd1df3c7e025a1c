//! AssetFile - アップロード対象のバイト列と content-type
//!
//! AssetFile は一度読み込んだら変更しません（バッファは `Arc<[u8]>` で共有）。

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// MIME type ラベル
///
/// 比較は ASCII の大文字小文字を区別しません（`image/PNG` == `image/png`）。
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentType(String);

impl ContentType {
    pub const JSON: &'static str = "application/json";
    pub const OCTET_STREAM: &'static str = "application/octet-stream";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_ascii_lowercase())
    }

    pub fn json() -> Self {
        Self::new(Self::JSON)
    }

    /// 拡張子から MIME type を推定（不明なら application/octet-stream）
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let mime = match ext.as_deref() {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("svg") => "image/svg+xml",
            Some("json") => Self::JSON,
            Some("txt") => "text/plain",
            Some("pdf") => "application/pdf",
            _ => Self::OCTET_STREAM,
        };
        Self::new(mime)
    }

    /// content-type に対応するファイル拡張子（保存名に使う）
    pub fn extension(&self) -> &'static str {
        match self.0.as_str() {
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/gif" => "gif",
            "image/svg+xml" => "svg",
            "application/json" => "json",
            "text/plain" => "txt",
            "application/pdf" => "pdf",
            _ => "bin",
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// テンプレート側の生文字列と比較
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl PartialEq for ContentType {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable byte buffer plus its content type.
#[derive(Debug, Clone)]
pub struct AssetFile {
    name: String,
    bytes: Arc<[u8]>,
    content_type: ContentType,
}

impl AssetFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>, content_type: ContentType) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            content_type,
        }
    }

    /// ログ用のファイル名（パスではない）
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
