//! Settings - `config` crate による設定の読み込み
//!
//! 優先順位（後勝ち）:
//! 1. `inscribe.toml`（カレントディレクトリ、任意）または `--config` で指定したファイル
//! 2. 環境変数 `INSCRIBE_*`（ネストは `__` 区切り、例: `INSCRIBE_STORAGE__PROVIDER=pinata`）
//! 3. CLI フラグ（呼び出し側で上書き）
//!
//! # 例
//! ```toml
//! timeout_secs = 45
//! is_mutable = true
//!
//! [storage]
//! provider = "nft_storage"
//! token = { env = "NFT_STORAGE_TOKEN" }
//!
//! [registry]
//! endpoint = "https://registry.example"
//! network = "devnet"
//! ```
//!
//! API トークンは環境変数名かファイルパスで参照します。値そのものは書きません。

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use super::builder::DEFAULT_TIMEOUT;
use super::pipeline::PublishPipeline;
use crate::domain::ConfigError;
use crate::impls::{
    FilesystemBackend, HttpRegistry, InMemoryBackend, NftStorageBackend, PinataBackend, nft_storage,
    pinata,
};
use crate::observability::LogFormat;
use crate::ports::{RegistryUpdater, StorageBackend};

pub const DEFAULT_CONFIG_NAME: &str = "inscribe";
pub const ENV_PREFIX: &str = "INSCRIBE";

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(secs))
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub registry: Option<RegistrySettings>,

    #[serde(
        rename = "timeout_secs",
        default = "default_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub timeout: Duration,

    /// レジストリ更新後のレコードの is_mutable（false で凍結）
    #[serde(default = "default_true")]
    pub is_mutable: bool,

    #[serde(default)]
    pub metadata_out: Option<PathBuf>,

    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageProvider {
    NftStorage,
    Pinata,
    #[default]
    Filesystem,
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub provider: StorageProvider,
    pub endpoint: Option<String>,
    /// `{cid}` を含む URL テンプレート
    pub gateway: Option<String>,

    pub token: Option<SecretRef>,
    pub api_key: Option<SecretRef>,
    pub secret_api_key: Option<SecretRef>,

    pub root: Option<PathBuf>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrySettings {
    pub endpoint: String,
    #[serde(default = "default_network")]
    pub network: String,
}

fn default_network() -> String {
    "devnet".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

/// 秘密値の参照（環境変数名 or ファイルパス）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretRef {
    Env(String),
    Path(PathBuf),
}

impl SecretRef {
    /// 参照先から値を読む（前後の空白は除去、空なら ConfigError）
    pub fn resolve(&self, key: &str) -> Result<String, ConfigError> {
        let value = match self {
            SecretRef::Env(var) => std::env::var(var).map_err(|_| {
                ConfigError::Missing(format!("{key} (environment variable {var} is not set)"))
            })?,
            SecretRef::Path(path) => {
                std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?
            }
        };

        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigError::Invalid {
                key: key.to_string(),
                reason: "secret is empty".to_string(),
            });
        }
        Ok(value.to_string())
    }
}

fn required_secret(secret: &Option<SecretRef>, key: &str) -> Result<String, ConfigError> {
    secret
        .as_ref()
        .ok_or_else(|| ConfigError::Missing(key.to_string()))?
        .resolve(key)
}

fn gateway_template(configured: &Option<String>, default: &str) -> Result<String, ConfigError> {
    let gateway = configured.clone().unwrap_or_else(|| default.to_string());
    if !gateway.contains("{cid}") {
        return Err(ConfigError::Invalid {
            key: "storage.gateway".to_string(),
            reason: format!("{gateway:?} has no {{cid}} placeholder"),
        });
    }
    Ok(gateway)
}

impl Settings {
    /// ファイル + 環境変数から読み込む
    ///
    /// `path` が None なら `inscribe.toml` を探し、無くてもエラーにしません。
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn parse_toml(source: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// 設定されたストレージ backend を構築（秘密値はここで解決）
    pub fn storage_backend(&self) -> Result<Arc<dyn StorageBackend>, ConfigError> {
        let storage = &self.storage;
        let backend: Arc<dyn StorageBackend> = match storage.provider {
            StorageProvider::NftStorage => Arc::new(NftStorageBackend::new(
                storage
                    .endpoint
                    .as_deref()
                    .unwrap_or(nft_storage::DEFAULT_ENDPOINT),
                gateway_template(&storage.gateway, nft_storage::DEFAULT_GATEWAY)?,
                required_secret(&storage.token, "storage.token")?,
                self.timeout,
            )?),
            StorageProvider::Pinata => Arc::new(PinataBackend::new(
                storage
                    .endpoint
                    .as_deref()
                    .unwrap_or(pinata::DEFAULT_ENDPOINT),
                gateway_template(&storage.gateway, pinata::DEFAULT_GATEWAY)?,
                required_secret(&storage.api_key, "storage.api_key")?,
                required_secret(&storage.secret_api_key, "storage.secret_api_key")?,
                self.timeout,
            )?),
            StorageProvider::Filesystem => Arc::new(FilesystemBackend::new(
                storage
                    .root
                    .clone()
                    .unwrap_or_else(|| PathBuf::from("published")),
                storage.base_url.clone(),
            )),
            StorageProvider::Memory => Arc::new(InMemoryBackend::default()),
        };
        Ok(backend)
    }

    /// `[registry]` があれば HttpRegistry を構築
    pub fn registry(&self) -> Result<Option<Arc<dyn RegistryUpdater>>, ConfigError> {
        let Some(registry) = &self.registry else {
            return Ok(None);
        };
        if registry.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "registry.endpoint".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        let updater = HttpRegistry::new(&registry.endpoint, &registry.network, self.timeout)?;
        Ok(Some(Arc::new(updater)))
    }

    /// 設定からパイプラインを組み立てる
    ///
    /// `require_registry` が true で registry が無ければ、ネットワーク前に失敗します。
    pub fn pipeline(&self, require_registry: bool) -> Result<PublishPipeline, ConfigError> {
        let mut builder = PublishPipeline::builder()
            .storage(self.storage_backend()?)
            .timeout(self.timeout);
        if let Some(registry) = self.registry()? {
            builder = builder.registry(registry);
        }
        if require_registry {
            builder = builder.expect_registry();
        }
        Ok(builder.build()?)
    }
}
