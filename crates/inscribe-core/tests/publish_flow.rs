//! End-to-end publish flows against scripted and in-memory backends.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use inscribe_core::app::PublishPipeline;
use inscribe_core::domain::{
    AssetFile, ContentType, Credential, MetadataDocument, PublishError, RegistryError,
    RegistryRecord, Stage, StorageLocator, UploadError, UriUpdate,
};
use inscribe_core::impls::{InMemoryBackend, InMemoryRegistry};
use inscribe_core::ports::StorageBackend;

/// Hands out a fixed sequence of locators and keeps what was uploaded.
struct ScriptedBackend {
    locators: Mutex<VecDeque<&'static str>>,
    stored: Mutex<HashMap<StorageLocator, Vec<u8>>>,
}

impl ScriptedBackend {
    fn new(locators: &[&'static str]) -> Self {
        Self {
            locators: Mutex::new(locators.iter().copied().collect()),
            stored: Mutex::new(HashMap::new()),
        }
    }

    async fn fetch(&self, locator: &str) -> Option<Vec<u8>> {
        self.stored.lock().await.get(&StorageLocator::from(locator)).cloned()
    }
}

#[async_trait]
impl StorageBackend for ScriptedBackend {
    async fn upload(
        &self,
        bytes: &[u8],
        _content_type: &ContentType,
    ) -> Result<StorageLocator, UploadError> {
        let next = self
            .locators
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| UploadError::Other("script exhausted".into()))?;
        let locator = StorageLocator::from(next);
        self.stored.lock().await.insert(locator.clone(), bytes.to_vec());
        Ok(locator)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

fn logo() -> AssetFile {
    AssetFile::new("logo.png", vec![7u8; 100], ContentType::new("image/png"))
}

fn template() -> MetadataDocument {
    MetadataDocument::new("X", "X").with_file("placeholder", "image/png")
}

fn record(owner: &Credential, is_mutable: bool) -> RegistryRecord {
    RegistryRecord {
        address: "mint-1".into(),
        name: "X".into(),
        symbol: "X".into(),
        uri: "loc://old".into(),
        update_authority: owner.authority(),
        is_mutable,
    }
}

#[tokio::test]
async fn logo_is_published_and_metadata_points_at_it() {
    let storage = Arc::new(ScriptedBackend::new(&["loc://abc", "loc://def"]));
    let pipeline = PublishPipeline::builder()
        .storage(storage.clone())
        .build()
        .unwrap();

    let result = pipeline.publish(&logo(), &template()).await.unwrap();

    assert_eq!(result.image_locator.as_str(), "loc://abc");
    assert_eq!(result.metadata_locator.as_str(), "loc://def");

    let uploaded = storage.fetch("loc://def").await.unwrap();
    let doc = MetadataDocument::from_slice(&uploaded).unwrap();
    assert_eq!(doc.image.as_deref(), Some("loc://abc"));
    assert_eq!(doc.files()[0].uri, "loc://abc");
    assert_eq!(doc.name, "X");

    // 100-byte asset went up first, untouched
    assert_eq!(storage.fetch("loc://abc").await.unwrap(), vec![7u8; 100]);
}

#[tokio::test]
async fn full_flow_updates_the_registry_record() {
    let owner = Credential::from_seed([11u8; 32]);
    let registry = Arc::new(InMemoryRegistry::new());
    registry.insert(record(&owner, true)).await;

    let storage = Arc::new(InMemoryBackend::new("loc://"));
    let pipeline = PublishPipeline::builder()
        .storage(storage.clone())
        .registry(registry.clone())
        .expect_registry()
        .build()
        .unwrap();

    let report = pipeline
        .publish_and_register(&logo(), &template(), "mint-1".into(), false, &owner)
        .await
        .unwrap();

    let updated = registry.get(&"mint-1".into()).await.unwrap();
    assert_eq!(updated.uri, report.metadata.as_str());
    assert!(!updated.is_mutable);

    let stored = storage.fetch(&report.metadata).await.unwrap();
    let doc = MetadataDocument::from_slice(&stored.bytes).unwrap();
    assert_eq!(doc.image.as_deref(), Some(report.image.as_str()));

    // frozen: a second write is refused even from the owner
    let again = UriUpdate::new("mint-1".into(), "loc://other".into(), true);
    let err = pipeline.update_registry(&again, &owner).await.unwrap_err();
    assert_eq!(err.exit_code(), 4);
}

#[tokio::test]
async fn wrong_authority_is_rejected_without_mutation() {
    let owner = Credential::from_seed([11u8; 32]);
    let intruder = Credential::from_seed([12u8; 32]);
    let registry = Arc::new(InMemoryRegistry::new());
    registry.insert(record(&owner, true)).await;

    let pipeline = PublishPipeline::builder()
        .storage(Arc::new(InMemoryBackend::default()))
        .registry(registry.clone())
        .build()
        .unwrap();

    let err = pipeline
        .publish_and_register(&logo(), &template(), "mint-1".into(), true, &intruder)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PublishError::Registry(RegistryError::Authority { .. })
    ));
    assert_eq!(err.stage(), Some(Stage::Registry));
    assert_eq!(registry.get(&"mint-1".into()).await.unwrap(), record(&owner, true));
}

#[tokio::test]
async fn unknown_record_is_not_found() {
    let owner = Credential::from_seed([11u8; 32]);
    let pipeline = PublishPipeline::builder()
        .storage(Arc::new(InMemoryBackend::default()))
        .registry(Arc::new(InMemoryRegistry::new()))
        .build()
        .unwrap();

    let update = UriUpdate::new("missing".into(), "loc://m".into(), true);
    let err = pipeline.update_registry(&update, &owner).await.unwrap_err();

    assert!(matches!(
        err,
        PublishError::Registry(RegistryError::NotFound(a)) if a.as_str() == "missing"
    ));
}

#[tokio::test]
async fn publish_all_keeps_input_order() {
    let storage = Arc::new(InMemoryBackend::default());
    let pipeline = PublishPipeline::builder()
        .storage(storage.clone())
        .build()
        .unwrap();

    let jobs = vec![
        (logo(), template()),
        (
            AssetFile::new("doc.pdf", b"%PDF-1.7".to_vec(), ContentType::new("application/pdf")),
            MetadataDocument::new("Y", "Y").with_file("placeholder", "application/pdf"),
        ),
    ];

    let results = pipeline.publish_all(&jobs).await;

    assert_eq!(results.len(), 2);
    let first = results[0].as_ref().unwrap();
    let second = results[1].as_ref().unwrap();
    assert_eq!(first.document.name, "X");
    assert_eq!(second.document.name, "Y");
    assert_eq!(second.document.files()[0].uri, second.image_locator.as_str());
    assert_eq!(storage.len().await, 4);
}
