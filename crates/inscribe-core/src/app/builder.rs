//! PipelineBuilder - PublishPipeline の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - storage が無ければ build() で失敗
//! - expect_registry() を呼んだのに registry が無ければ build() で失敗
//! - timeout = 0 は build() で失敗
//!
//! どれもネットワーク呼び出しの前に検出されます。

use std::sync::Arc;
use std::time::Duration;

use crate::domain::ConfigError;
use crate::ports::{IdGenerator, RegistryUpdater, StorageBackend, SystemClock, UlidGenerator};

use super::pipeline::PublishPipeline;

/// ネットワーク呼び出し 1 回あたりの既定タイムアウト
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);

/// PipelineBuilder はパイプラインを構築
///
/// # 使用例
/// ```ignore
/// let pipeline = PublishPipeline::builder()
///     .storage(Arc::new(InMemoryBackend::default()))
///     .registry(Arc::new(InMemoryRegistry::new()))
///     .expect_registry()
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub struct PipelineBuilder {
    storage: Option<Arc<dyn StorageBackend>>,
    registry: Option<Arc<dyn RegistryUpdater>>,
    ids: Option<Arc<dyn IdGenerator>>,
    timeout: Duration,
    expect_registry: bool,
}

/// BuildError はパイプライン構築時のエラー
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("no storage backend configured")]
    MissingStorage,

    #[error("registry update requested but no registry is configured")]
    MissingRegistry,

    #[error("timeout must be greater than zero")]
    ZeroTimeout,
}

impl From<BuildError> for ConfigError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::MissingStorage => ConfigError::Missing("storage".to_string()),
            BuildError::MissingRegistry => ConfigError::Missing("registry".to_string()),
            BuildError::ZeroTimeout => ConfigError::Invalid {
                key: "timeout_secs".to_string(),
                reason: err.to_string(),
            },
        }
    }
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            storage: None,
            registry: None,
            ids: None,
            timeout: DEFAULT_TIMEOUT,
            expect_registry: false,
        }
    }

    pub fn storage(mut self, storage: Arc<dyn StorageBackend>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn registry(mut self, registry: Arc<dyn RegistryUpdater>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// registry が必須であることを宣言（build() で検証）
    pub fn expect_registry(mut self) -> Self {
        self.expect_registry = true;
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<PublishPipeline, BuildError> {
        let storage = self.storage.ok_or(BuildError::MissingStorage)?;
        if self.expect_registry && self.registry.is_none() {
            return Err(BuildError::MissingRegistry);
        }
        if self.timeout.is_zero() {
            return Err(BuildError::ZeroTimeout);
        }
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(SystemClock)));

        Ok(PublishPipeline::new(storage, self.registry, ids, self.timeout))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InMemoryBackend, InMemoryRegistry};

    #[test]
    fn build_success() {
        let pipeline = PipelineBuilder::new()
            .storage(Arc::new(InMemoryBackend::default()))
            .build();
        assert!(pipeline.is_ok());
    }

    #[test]
    fn build_without_storage_fails() {
        let err = PipelineBuilder::new().build().err();
        assert_eq!(err, Some(BuildError::MissingStorage));
    }

    #[test]
    fn build_with_expected_but_missing_registry_fails() {
        let err = PipelineBuilder::new()
            .storage(Arc::new(InMemoryBackend::default()))
            .expect_registry()
            .build()
            .err();
        assert_eq!(err, Some(BuildError::MissingRegistry));
    }

    #[test]
    fn build_with_expected_registry() {
        let pipeline = PipelineBuilder::new()
            .storage(Arc::new(InMemoryBackend::default()))
            .registry(Arc::new(InMemoryRegistry::new()))
            .expect_registry()
            .build();
        assert!(pipeline.is_ok());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = PipelineBuilder::new()
            .storage(Arc::new(InMemoryBackend::default()))
            .timeout(Duration::ZERO)
            .build()
            .err();
        assert_eq!(err, Some(BuildError::ZeroTimeout));
        assert!(matches!(
            ConfigError::from(BuildError::ZeroTimeout),
            ConfigError::Invalid { key, .. } if key == "timeout_secs"
        ));
    }
}
