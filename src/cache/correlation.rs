// src/cache/correlation.rs
use std::sync::Arc;
use tracing::{debug, error};
use crate::cache::{CacheKeys, CALL_TTL_SECS};
use crate::error::Result;
use crate::models::CallAttempt;
use crate::traits::KeyValueStore;

/// Typed view of the correlation entries for in-flight calls.
///
/// Values are whole `CallAttempt` copies; callers fetch, mutate and
/// [`save`](Self::save) again. There is no field-level update.
#[derive(Clone)]
pub struct CorrelationStore {
    backend: Arc<dyn KeyValueStore>,
    ttl_secs: u64,
}

impl CorrelationStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            ttl_secs: CALL_TTL_SECS,
        }
    }

    pub async fn by_channel(&self, channel_id: &str) -> Option<CallAttempt> {
        self.load(&CacheKeys::call(channel_id)).await
    }

    pub async fn by_bridge(&self, bridge_id: &str) -> Option<CallAttempt> {
        self.load(&CacheKeys::bridge_info(bridge_id)).await
    }

    /// Writes the attempt under the bridge key and both channel keys.
    ///
    /// Every key is attempted even after a failed write, so one bad write
    /// leaves at most one stale copy. The first error is returned.
    pub async fn save(&self, attempt: &CallAttempt) -> Result<()> {
        let value = serde_json::to_string(attempt)?;
        let mut first_error = None;

        for key in Self::keys(attempt) {
            if let Err(e) = self.backend.set(&key, &value, self.ttl_secs).await {
                error!("❌ Correlation store write failed for {}: {}", key, e);
                first_error.get_or_insert(e);
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        debug!(
            "Stored call {} ({}) under bridge {}",
            attempt.inbound_channel_id,
            attempt.state.name(),
            attempt.bridge_id
        );
        Ok(())
    }

    /// Removes `call:<inbound>` and `call:<outbound>`, keeping the bridge key.
    pub async fn forget_channels(&self, attempt: &CallAttempt) {
        self.forget(&CacheKeys::call(&attempt.inbound_channel_id)).await;
        self.forget(&CacheKeys::call(&attempt.outbound_channel_id)).await;
    }

    pub async fn forget_bridge(&self, bridge_id: &str) {
        self.forget(&CacheKeys::bridge_info(bridge_id)).await;
    }

    pub async fn forget_all(&self, attempt: &CallAttempt) {
        self.forget_channels(attempt).await;
        self.forget_bridge(&attempt.bridge_id).await;
    }

    fn keys(attempt: &CallAttempt) -> [String; 3] {
        [
            CacheKeys::bridge_info(&attempt.bridge_id),
            CacheKeys::call(&attempt.inbound_channel_id),
            CacheKeys::call(&attempt.outbound_channel_id),
        ]
    }

    // A backend failure reads as "no entry": the event is then treated like
    // any other stale correlation.
    async fn load(&self, key: &str) -> Option<CallAttempt> {
        let raw = match self.backend.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!("❌ Correlation store read failed for {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(attempt) => Some(attempt),
            Err(e) => {
                error!("❌ Corrupt correlation entry {}: {}", key, e);
                None
            }
        }
    }

    async fn forget(&self, key: &str) {
        if let Err(e) = self.backend.delete(key).await {
            error!("❌ Correlation store delete failed for {}: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::error::CallControlError;
    use crate::traits::MockKeyValueStore;
    use chrono::Utc;

    fn attempt() -> CallAttempt {
        CallAttempt::new("B1".into(), "C1".into(), "C2".into(), "105".into(), "1000".into())
    }

    #[tokio::test]
    async fn test_save_writes_three_keys() {
        let memory = MemoryStore::new();
        let store = CorrelationStore::new(Arc::new(memory.clone()));
        store.save(&attempt()).await.unwrap();

        assert_eq!(memory.len().await, 3);
        assert_eq!(store.by_channel("C1").await, Some(attempt()));
        assert_eq!(store.by_channel("C2").await, Some(attempt()));
        assert_eq!(store.by_bridge("B1").await, Some(attempt()));
        assert!(memory.get("call:C1").await.unwrap().is_some());
        assert!(memory.get("bridge_info:B1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_save_overwrites_all_copies() {
        let store = CorrelationStore::new(Arc::new(MemoryStore::new()));
        let mut call = attempt();
        store.save(&call).await.unwrap();

        call.connect(Utc::now()).unwrap();
        store.save(&call).await.unwrap();

        for found in [
            store.by_channel("C1").await,
            store.by_channel("C2").await,
            store.by_bridge("B1").await,
        ] {
            assert_eq!(found.unwrap().state.name(), "connected");
        }
    }

    #[tokio::test]
    async fn test_forget_channels_keeps_bridge() {
        let store = CorrelationStore::new(Arc::new(MemoryStore::new()));
        store.save(&attempt()).await.unwrap();

        store.forget_channels(&attempt()).await;
        assert!(store.by_channel("C1").await.is_none());
        assert!(store.by_channel("C2").await.is_none());
        assert!(store.by_bridge("B1").await.is_some());

        store.forget_bridge("B1").await;
        assert!(store.by_bridge("B1").await.is_none());
    }

    #[tokio::test]
    async fn test_forget_all() {
        let memory = MemoryStore::new();
        let store = CorrelationStore::new(Arc::new(memory.clone()));
        store.save(&attempt()).await.unwrap();

        store.forget_all(&attempt()).await;
        assert_eq!(memory.len().await, 0);
    }

    #[tokio::test]
    async fn test_corrupt_entry_reads_as_absent() {
        let memory = MemoryStore::new();
        memory.set("call:C1", "not json", 60).await.unwrap();
        let store = CorrelationStore::new(Arc::new(memory));

        assert!(store.by_channel("C1").await.is_none());
    }

    #[tokio::test]
    async fn test_backend_error_reads_as_absent() {
        let mut backend = MockKeyValueStore::new();
        backend
            .expect_get()
            .returning(|_| Err(CallControlError::Cache("connection refused".into())));
        let store = CorrelationStore::new(Arc::new(backend));

        assert!(store.by_bridge("B1").await.is_none());
    }

    #[tokio::test]
    async fn test_entries_use_call_ttl() {
        let mut backend = MockKeyValueStore::new();
        backend
            .expect_set()
            .withf(|_, _, ttl| *ttl == CALL_TTL_SECS)
            .times(3)
            .returning(|_, _, _| Ok(()));
        let store = CorrelationStore::new(Arc::new(backend));

        store.save(&attempt()).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_write_does_not_stop_remaining_keys() {
        let mut backend = MockKeyValueStore::new();
        backend
            .expect_set()
            .withf(|key, _, _| key == "call:C1")
            .times(1)
            .returning(|_, _, _| Err(CallControlError::Cache("READONLY".into())));
        backend
            .expect_set()
            .withf(|key, _, _| key == "bridge_info:B1" || key == "call:C2")
            .times(2)
            .returning(|_, _, _| Ok(()));
        let store = CorrelationStore::new(Arc::new(backend));

        assert!(matches!(store.save(&attempt()).await, Err(CallControlError::Cache(_))));
    }
}
