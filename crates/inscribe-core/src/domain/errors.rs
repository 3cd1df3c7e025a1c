//! Errors - エラー型と分類
//!
//! 境界（seam）ごとに thiserror の enum を持ち、最上位の [`PublishError`] が
//! 失敗したステージと一緒にそれらを包みます。
//!
//! # 分類
//! - [`ConfigError`]: 設定・認証情報・テンプレートの不備（ネットワーク呼び出し前に失敗）
//! - [`UploadError`]: ストレージへのアップロード失敗（image / metadata ステージ）
//! - [`RegistryError`]: レジストリ更新の失敗（Authority / NotFound / Transport）

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::record::RecordAddress;

/// パイプラインのどのステージで失敗したか
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// asset 本体のアップロード
    Image,
    /// metadata ドキュメントのアップロード
    Metadata,
    /// レジストリの uri 更新
    Registry,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Image => "image",
            Stage::Metadata => "metadata",
            Stage::Registry => "registry",
        };
        f.write_str(s)
    }
}

/// StorageBackend の 1 回のアップロードの失敗
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("authentication rejected by storage provider (status {status})")]
    Unauthorized { status: u16 },

    #[error("storage provider returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("unexpected response from storage provider: {0}")]
    InvalidResponse(String),

    #[error("upload timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to encode metadata document: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// RegistryUpdater の失敗
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("authority {presented} may not update record {address}: {reason}")]
    Authority {
        address: RecordAddress,
        presented: String,
        reason: String,
    },

    #[error("record {0} not found")]
    NotFound(RecordAddress),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        RegistryError::Transport(err.to_string())
    }
}

/// 設定・入力の読み込み失敗
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed metadata template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed credential: {0}")]
    Credential(String),

    #[error("missing setting: {0}")]
    Missing(String),

    #[error("invalid setting {key}: {reason}")]
    Invalid { key: String, reason: String },

    #[error("failed to load settings: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("failed to initialize logging: {0}")]
    Logging(String),
}

/// パイプライン実行全体のエラー
///
/// CLI はこの分類を終了コードに写像します（[`PublishError::exit_code`]）。
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("upload failed at stage={stage}: {source}")]
    Upload {
        stage: Stage,
        #[source]
        source: UploadError,
    },

    #[error("registry update failed at stage=registry: {0}")]
    Registry(#[from] RegistryError),
}

impl PublishError {
    pub fn upload(stage: Stage, source: UploadError) -> Self {
        PublishError::Upload { stage, source }
    }

    /// 失敗したステージ（Config はネットワーク前なので None）
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PublishError::Config(_) => None,
            PublishError::Upload { stage, .. } => Some(*stage),
            PublishError::Registry(_) => Some(Stage::Registry),
        }
    }

    /// CLI の終了コード: 2 = config, 3 = upload, 4 = registry
    pub fn exit_code(&self) -> u8 {
        match self {
            PublishError::Config(_) => 2,
            PublishError::Upload { .. } => 3,
            PublishError::Registry(_) => 4,
        }
    }
}
