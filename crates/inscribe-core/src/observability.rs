//! Observability - tracing の初期化
//!
//! ログはすべて stderr に出します（stdout は CLI の結果 JSON 用）。
//! `RUST_LOG` があればそちらを優先し、無ければ設定の `log.level` を使います。

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::domain::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn filter(level: &str) -> Result<EnvFilter, ConfigError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).map_err(|e| ConfigError::Invalid {
            key: "log.level".to_string(),
            reason: e.to_string(),
        }),
    }
}

/// グローバル subscriber を 1 度だけ設定する
pub fn init_tracing(level: &str, format: LogFormat) -> Result<(), ConfigError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(level)?)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| ConfigError::Logging(e.to_string()))
}
