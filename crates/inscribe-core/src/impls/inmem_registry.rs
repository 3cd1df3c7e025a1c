//! InMemoryRegistry - 開発・テスト用のレジストリ
//!
//! 外部レジストリと同じ規則で書き込みを受け付けます。
//! - レコードが無ければ NotFound
//! - credential の公開鍵が update_authority と違えば Authority
//! - is_mutable = false のレコードは常に Authority（一度凍結したら戻せない）

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::{
    Credential, RecordAddress, RegistryError, RegistryReceipt, RegistryRecord, UriUpdate,
};
use crate::ports::{Clock, IdGenerator, RegistryUpdater, SystemClock, UlidGenerator};

pub struct InMemoryRegistry {
    records: Mutex<HashMap<RecordAddress, RegistryRecord>>,
    clock: Arc<dyn Clock>,
    ids: UlidGenerator<Arc<dyn Clock>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            ids: UlidGenerator::new(clock.clone()),
            clock,
        }
    }

    /// レコードを登録（既存なら上書き）
    pub async fn insert(&self, record: RegistryRecord) {
        self.records
            .lock()
            .await
            .insert(record.address.clone(), record);
    }

    pub async fn get(&self, address: &RecordAddress) -> Option<RegistryRecord> {
        self.records.lock().await.get(address).cloned()
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistryUpdater for InMemoryRegistry {
    async fn update(
        &self,
        update: &UriUpdate,
        authority: &Credential,
    ) -> Result<RegistryReceipt, RegistryError> {
        let presented = authority.authority();
        let mut records = self.records.lock().await;

        let record = records
            .get_mut(&update.address)
            .ok_or_else(|| RegistryError::NotFound(update.address.clone()))?;

        let deny = |reason: &str| RegistryError::Authority {
            address: update.address.clone(),
            presented: presented.to_hex(),
            reason: reason.to_string(),
        };
        if record.update_authority != presented {
            return Err(deny("credential does not match the record's update authority"));
        }
        if !record.is_mutable {
            return Err(deny("record is immutable"));
        }

        record.uri = update.uri.to_string();
        record.is_mutable = update.is_mutable;

        let receipt = RegistryReceipt {
            address: record.address.clone(),
            uri: record.uri.clone(),
            reference: self.ids.generate_receipt_id().to_string(),
            updated_at: self.clock.now(),
        };
        info!(address = %receipt.address, uri = %receipt.uri, "registry record updated");
        Ok(receipt)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
