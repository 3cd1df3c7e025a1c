//! Registry record model.
//!
//! The registry (an on-chain token metadata account, in practice) is owned by
//! an external system. This crate only names a record by its address and asks
//! for one conditional write of its `uri` field.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::credential::AuthorityKey;
use super::locator::StorageLocator;

/// Opaque address of a record in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordAddress(String);

impl RecordAddress {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordAddress {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A registry entry as the registry itself sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub address: RecordAddress,
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub update_authority: AuthorityKey,
    /// Once false, the registry refuses every further write.
    pub is_mutable: bool,
}

/// One requested `uri` write.
///
/// `is_mutable` is the flag the record should carry after the write. Passing
/// `false` freezes the record; it is never inferred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UriUpdate {
    pub address: RecordAddress,
    pub uri: StorageLocator,
    pub is_mutable: bool,
}

impl UriUpdate {
    pub fn new(address: RecordAddress, uri: StorageLocator, is_mutable: bool) -> Self {
        Self {
            address,
            uri,
            is_mutable,
        }
    }

    /// Bytes covered by the authority signature:
    /// `address || 0x00 || uri || 0x00 || is_mutable`.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut payload =
            Vec::with_capacity(self.address.as_str().len() + self.uri.as_str().len() + 3);
        payload.extend_from_slice(self.address.as_str().as_bytes());
        payload.push(0);
        payload.extend_from_slice(self.uri.as_str().as_bytes());
        payload.push(0);
        payload.push(u8::from(self.is_mutable));
        payload
    }
}

/// What the registry reports back after accepting a write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryReceipt {
    pub address: RecordAddress,
    pub uri: String,
    /// Registry-side reference (transaction signature, receipt id, ...).
    pub reference: String,
    pub updated_at: DateTime<Utc>,
}
