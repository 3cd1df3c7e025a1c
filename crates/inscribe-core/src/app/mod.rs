//! App - アプリケーション層
//!
//! ports を組み合わせて publish の流れを実装します。
//!
//! # 主要コンポーネント
//! - **PublishPipeline**: image -> metadata -> (registry) の直列実行
//! - **PipelineBuilder**: パイプラインの構築とワイヤリング
//! - **Settings**: 設定ファイル + 環境変数からの構築
//! - **inputs**: asset / テンプレートの読み込みと metadata の書き出し

pub mod builder;
pub mod inputs;
pub mod pipeline;
pub mod settings;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, DEFAULT_TIMEOUT, PipelineBuilder};
pub use self::inputs::{load_asset, load_template, write_metadata};
pub use self::pipeline::PublishPipeline;
pub use self::settings::{SecretRef, Settings, StorageProvider};
