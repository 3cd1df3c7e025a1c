//! inscribe - asset と metadata を publish して、レジストリの uri を更新する CLI
//!
//! 終了コード: 0 = 成功, 2 = 設定/入力, 3 = アップロード, 4 = レジストリ
//!
//! 結果の JSON は stdout、ログとエラーは stderr に出ます。

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{debug, info};

use inscribe_core::app::{Settings, load_asset, load_template, write_metadata};
use inscribe_core::domain::{ConfigError, Credential, PublishError, PublishReport, UriUpdate};
use inscribe_core::observability::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "inscribe", version, about = "Publish an asset and its metadata document")]
struct Cli {
    /// 設定ファイル（省略時は ./inscribe.toml があれば読む）
    #[arg(long, global = true, env = "INSCRIBE_CONFIG")]
    config: Option<PathBuf>,

    /// ネットワーク呼び出し 1 回あたりのタイムアウト（秒）
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// asset をアップロードし、書き換えた metadata をアップロードする
    Publish {
        #[arg(long)]
        asset: PathBuf,

        #[arg(long)]
        template: PathBuf,

        /// 拡張子からの推定を上書き
        #[arg(long)]
        content_type: Option<String>,

        /// 書き換え後の metadata の保存先
        #[arg(long)]
        metadata_out: Option<PathBuf>,

        /// publish 後にレジストリの uri を metadata locator に更新する
        #[arg(long, requires = "record", requires = "authority")]
        update_registry: bool,

        #[arg(long)]
        record: Option<String>,

        /// keypair ファイル（64 バイトの JSON 配列）
        #[arg(long, env = "INSCRIBE_AUTHORITY")]
        authority: Option<PathBuf>,

        /// 更新後のレコードを凍結する（以後の更新は拒否される）
        #[arg(long)]
        immutable: bool,
    },

    /// レジストリの uri だけを更新する
    UpdateUri {
        #[arg(long)]
        record: String,

        #[arg(long)]
        uri: String,

        #[arg(long, env = "INSCRIBE_AUTHORITY")]
        authority: PathBuf,

        #[arg(long)]
        immutable: bool,
    },

    /// keypair ファイルの authority（hex 公開鍵）を表示する
    Authority {
        #[arg(long, env = "INSCRIBE_AUTHORITY")]
        keypair: PathBuf,
    },
}

fn load_settings(cli: &Cli) -> Result<Settings, ConfigError> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(secs) = cli.timeout_secs {
        settings.timeout = Duration::from_secs(secs);
    }
    init_tracing(&settings.log.level, settings.log.format)?;
    debug!(provider = ?settings.storage.provider, timeout = ?settings.timeout, "settings loaded");
    Ok(settings)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), PublishError> {
    let line = serde_json::to_string_pretty(value).map_err(|e| ConfigError::Write {
        path: PathBuf::from("<stdout>"),
        source: std::io::Error::other(e),
    })?;
    println!("{line}");
    Ok(())
}

async fn publish(
    settings: &Settings,
    asset: &Path,
    template: &Path,
    content_type: Option<&str>,
    metadata_out: Option<&Path>,
    registry_target: Option<(String, PathBuf)>,
    immutable: bool,
) -> Result<PublishReport, PublishError> {
    // 入力と認証情報はアップロード前にすべて検証する
    let asset = load_asset(asset, content_type).await?;
    let template = load_template(template).await?;
    let registry_target = match registry_target {
        Some((record, path)) => Some((record, Credential::load(&path)?)),
        None => None,
    };
    let pipeline = settings.pipeline(registry_target.is_some())?;

    let result = pipeline.publish(&asset, &template).await?;

    if let Some(path) = metadata_out.or(settings.metadata_out.as_deref()) {
        write_metadata(path, &result.document).await?;
        info!(path = %path.display(), "wrote metadata document");
    }

    let mut report = PublishReport::new(&result);
    if let Some((record, credential)) = registry_target {
        let update = UriUpdate::new(
            record.as_str().into(),
            result.metadata_locator.clone(),
            settings.is_mutable && !immutable,
        );
        report = report.with_receipt(pipeline.update_registry(&update, &credential).await?);
    }
    Ok(report)
}

async fn run(cli: Cli) -> Result<(), PublishError> {
    match &cli.command {
        Command::Authority { keypair } => {
            let credential = Credential::load(keypair)?;
            println!("{}", credential.authority());
            Ok(())
        }

        Command::Publish {
            asset,
            template,
            content_type,
            metadata_out,
            update_registry,
            record,
            authority,
            immutable,
        } => {
            let settings = load_settings(&cli)?;
            let registry_target = if *update_registry {
                match (record, authority) {
                    (Some(record), Some(authority)) => Some((record.clone(), authority.clone())),
                    _ => {
                        return Err(ConfigError::Missing(
                            "--record and --authority are required with --update-registry"
                                .to_string(),
                        )
                        .into());
                    }
                }
            } else {
                None
            };

            let report = publish(
                &settings,
                asset,
                template,
                content_type.as_deref(),
                metadata_out.as_deref(),
                registry_target,
                *immutable,
            )
            .await?;
            print_json(&report)
        }

        Command::UpdateUri {
            record,
            uri,
            authority,
            immutable,
        } => {
            let settings = load_settings(&cli)?;
            let credential = Credential::load(authority)?;
            let pipeline = settings.pipeline(true)?;

            let update = UriUpdate::new(
                record.as_str().into(),
                uri.as_str().into(),
                settings.is_mutable && !immutable,
            );
            let receipt = pipeline.update_registry(&update, &credential).await?;
            print_json(&receipt)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
