//! StorageLocator - ストレージが返す恒久的な識別子（URL / CID など）
//!
//! パイプラインは中身を解釈しません。同じバイト列を 2 回アップロードして
//! 同じ locator が返るかどうかは backend の性質であり、パイプラインは
//! 一意性を仮定しません。

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageLocator(String);

impl StorageLocator {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for StorageLocator {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for StorageLocator {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for StorageLocator {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
