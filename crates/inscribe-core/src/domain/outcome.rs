//! Publish outcome: what one successful pipeline run reports.
//!
//! A `PublishResult` only exists when both uploads succeeded. It is not
//! persisted; the caller logs it, prints it, or hands the metadata locator to
//! a registry.

use serde::{Deserialize, Serialize};

use super::ids::RunId;
use super::locator::StorageLocator;
use super::metadata::MetadataDocument;
use super::record::RegistryReceipt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishResult {
    pub run_id: RunId,
    pub image_locator: StorageLocator,
    pub metadata_locator: StorageLocator,

    /// The rewritten document exactly as it was uploaded.
    pub document: MetadataDocument,
}

/// Summary printed by the CLI: the publish result plus the registry receipt
/// when the registry was updated in the same invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishReport {
    pub image: StorageLocator,
    pub metadata: StorageLocator,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<RegistryReceipt>,
}

impl PublishReport {
    pub fn new(result: &PublishResult) -> Self {
        Self {
            image: result.image_locator.clone(),
            metadata: result.metadata_locator.clone(),
            registry: None,
        }
    }

    pub fn with_receipt(mut self, receipt: RegistryReceipt) -> Self {
        self.registry = Some(receipt);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn report_omits_registry_when_not_updated() {
        let result = PublishResult {
            run_id: RunId::from_ulid(Ulid::new()),
            image_locator: "loc://abc".into(),
            metadata_locator: "loc://def".into(),
            document: MetadataDocument::new("X", "X"),
        };
        let v = serde_json::to_value(PublishReport::new(&result)).unwrap();
        assert_eq!(v["image"], "loc://abc");
        assert_eq!(v["metadata"], "loc://def");
        assert!(v.get("registry").is_none());
    }
}
