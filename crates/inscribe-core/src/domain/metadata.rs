//! Off-chain token metadata document and the pure template rewrite.
//!
//! The JSON shape follows the common token-metadata layout:
//!
//! ```json
//! {
//!   "name": "Lokquidity",
//!   "symbol": "LOKQ",
//!   "description": "...",
//!   "image": "https://...",
//!   "external_url": "https://...",
//!   "attributes": [{ "trait_type": "Supply", "value": "Fixed" }],
//!   "properties": {
//!     "files": [{ "uri": "https://...", "type": "image/png" }],
//!     "category": "token",
//!     "creators": [{ "address": "...", "share": 100 }]
//!   }
//! }
//! ```
//!
//! Only the fields the rewrite touches are typed: `name`, `symbol`, `image`
//! and `properties.files`. Everything else (including `description`,
//! `attributes` and explicit `null`s or empty `[]` / `{}` values) lives in the
//! `extra` maps and is written back unchanged. `extra` is a `BTreeMap`, so
//! serialization order is stable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::asset::ContentType;
use super::locator::StorageLocator;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataDocument {
    pub name: String,
    pub symbol: String,

    /// 出力では必ず asset の locator が入る
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// テンプレートに無ければ出力にも無い（`{}` はそのまま残る）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// `{ "trait_type": ..., "value": ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    /// 文字列とは限らない（数値の trait もある）
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileEntry>>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub uri: String,
    #[serde(rename = "type")]
    pub content_type: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl FileEntry {
    pub fn new(uri: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            content_type: content_type.into(),
            extra: BTreeMap::new(),
        }
    }
}

impl MetadataDocument {
    /// Minimal document with only `name` and `symbol` set.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            image: None,
            properties: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_file(mut self, uri: impl Into<String>, content_type: impl Into<String>) -> Self {
        self.properties
            .get_or_insert_with(Properties::default)
            .files
            .get_or_insert_with(Vec::new)
            .push(FileEntry::new(uri, content_type));
        self
    }

    pub fn files(&self) -> &[FileEntry] {
        self.properties
            .as_ref()
            .and_then(|p| p.files.as_deref())
            .unwrap_or(&[])
    }

    pub fn description(&self) -> Option<&str> {
        self.extra.get("description").and_then(Value::as_str)
    }

    pub fn external_url(&self) -> Option<&str> {
        self.extra.get("external_url").and_then(Value::as_str)
    }

    /// `attributes` を型付きで読む。無い・`null` なら空
    pub fn attributes(&self) -> Result<Vec<Attribute>, serde_json::Error> {
        match self.extra.get("attributes") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(v) => Vec::<Attribute>::deserialize(v),
        }
    }

    /// Compact JSON with a fixed key order. Used as the uploaded bytes.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// MetadataBuilder はテンプレートに asset の locator を差し込む
///
/// # ルール
/// - `image` は無条件に locator で上書き
/// - `properties.files` のうち `type` が asset の content-type と一致する要素だけ `uri` を上書き
/// - それ以外のフィールド・要素はそのままコピー
///
/// I/O を持たない純粋関数なので、同じ入力からは常に同じバイト列が得られます。
pub struct MetadataBuilder;

impl MetadataBuilder {
    pub fn build(
        template: &MetadataDocument,
        asset_locator: &StorageLocator,
        asset_content_type: &ContentType,
    ) -> MetadataDocument {
        let mut doc = template.clone();
        doc.image = Some(asset_locator.to_string());
        let files = doc
            .properties
            .as_mut()
            .and_then(|p| p.files.as_mut())
            .into_iter()
            .flatten();
        for file in files.filter(|f| asset_content_type.matches(&f.content_type)) {
            file.uri = asset_locator.to_string();
        }
        doc
    }
}
