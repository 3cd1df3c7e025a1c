//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」です。外部システム（IPFS pinning サービス、
//! ローカルファイル、レジストリ）への境界を trait で表し、実装は `impls` に置きます。

pub mod storage_backend;
pub mod registry;
pub mod clock;
pub mod id_generator;

pub use self::storage_backend::StorageBackend;
pub use self::registry::RegistryUpdater;
pub use self::clock::{Clock, SystemClock, FixedClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
