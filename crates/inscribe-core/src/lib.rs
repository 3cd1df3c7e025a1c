//! inscribe-core
//!
//! Core building blocks for publishing an asset and its metadata document to
//! content-addressed storage, and pointing a registry record at the result.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（asset, locator, metadata, credential, record, errors）
//! - **ports**: 抽象化レイヤー（StorageBackend, RegistryUpdater, Clock, IdGenerator）
//! - **impls**: 実装（nft.storage, Pinata, filesystem, in-memory, HTTP registry）
//! - **app**: アプリケーションロジック（pipeline, builder, settings, inputs）
//! - **observability**: tracing の初期化

pub mod app;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
