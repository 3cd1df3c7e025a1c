//! Domain model (asset, locator, metadata, registry record, errors).
//!
//! ここには I/O を持たない型だけを置きます。
//! ネットワーク・ファイルシステムとの境界は `ports` / `impls` 側です。

pub mod asset;
pub mod credential;
pub mod errors;
pub mod ids;
pub mod locator;
pub mod metadata;
pub mod outcome;
pub mod record;

pub use self::asset::{AssetFile, ContentType};
pub use self::credential::{AuthorityKey, Credential};
pub use self::errors::{ConfigError, PublishError, RegistryError, Stage, UploadError};
pub use self::ids::{ReceiptId, RunId};
pub use self::locator::StorageLocator;
pub use self::metadata::{Attribute, FileEntry, MetadataBuilder, MetadataDocument, Properties};
pub use self::outcome::{PublishReport, PublishResult};
pub use self::record::{RecordAddress, RegistryReceipt, RegistryRecord, UriUpdate};
