//! Short-lived in-memory cache in front of the payment record store.
//!
//! Absorbs repeated lookups during the status-polling window. Populated
//! lazily (read-through); entries are invalidated explicitly after a record
//! update and otherwise age out at the configured TTL.

pub mod keys;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use crate::config::CacheConfig;
use crate::model::PaymentRecord;

struct Entry {
    record: PaymentRecord,
    inserted_at: Instant,
}

/// TTL map over payment records, keyed by the typed key builders in
/// [`keys`].
pub struct PaymentCache {
    ttl: Duration,
    max_entries: usize,
    entries: RwLock<HashMap<String, Entry>>,
}

impl PaymentCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            ttl: config.ttl,
            max_entries: config.max_entries,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, lifecycle_id: &str) -> Option<PaymentRecord> {
        let key = keys::payment::RecordKey::new(lifecycle_id).to_string();
        let entries = self.entries.read().await;
        match entries.get(&key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.record.clone()),
            _ => None,
        }
    }

    pub async fn put(&self, record: PaymentRecord) {
        let key = keys::payment::RecordKey::new(&record.lifecycle_id).to_string();
        let mut entries = self.entries.write().await;

        // Evict expired entries once the map is full.
        if entries.len() >= self.max_entries {
            let ttl = self.ttl;
            entries.retain(|_, e| e.inserted_at.elapsed() < ttl);
        }

        entries.insert(
            key,
            Entry {
                record,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drops the entry for a lifecycle id. Called after record updates so the
    /// cache never serves a stale sent-flag during the polling window.
    pub async fn invalidate(&self, lifecycle_id: &str) {
        let key = keys::payment::RecordKey::new(lifecycle_id).to_string();
        if self.entries.write().await.remove(&key).is_some() {
            debug!(lifecycle_id = %lifecycle_id, "Invalidated cached payment record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(lifecycle_id: &str) -> PaymentRecord {
        PaymentRecord {
            lifecycle_id: lifecycle_id.to_string(),
            distributor_id: "D1".into(),
            merchant_id: "M1".into(),
            destination_id: "dest".into(),
            provider_payment_id: String::new(),
            provider_payment_url: String::new(),
            merchant_return_url: "https://merchant.example/return".into(),
            advice_sent: false,
            advice_sent_at: None,
            created_at: Utc::now(),
        }
    }

    fn config(ttl: Duration) -> CacheConfig {
        CacheConfig {
            ttl,
            max_entries: 16,
        }
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let cache = PaymentCache::new(&config(Duration::from_secs(60)));
        cache.put(record("L1")).await;
        assert!(cache.get("L1").await.is_some());
        assert!(cache.get("L2").await.is_none());
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache = PaymentCache::new(&config(Duration::from_secs(60)));
        cache.put(record("L1")).await;
        cache.invalidate("L1").await;
        assert!(cache.get("L1").await.is_none());
    }

    #[tokio::test]
    async fn expired_entries_are_not_served() {
        let cache = PaymentCache::new(&config(Duration::ZERO));
        cache.put(record("L1")).await;
        assert!(cache.get("L1").await.is_none());
    }
}
