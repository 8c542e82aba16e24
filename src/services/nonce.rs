//! Nonce cache used for replay protection.
//!
//! Records expire on their own and are never deleted explicitly. Expired
//! records are ignored on read and removed lazily, plus by a periodic sweep.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::services::ServiceError;

#[async_trait]
pub trait NonceStore: Send + Sync {
    /// Read a live record.
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError>;

    /// Unconditionally write a record with the given lifetime.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), ServiceError>;

    /// Write a record only if no live record exists for `key`.
    ///
    /// Returns `true` when this call created the record. Implementations must
    /// make the check and the write a single atomic step.
    async fn insert_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, ServiceError>;
}

#[derive(Debug, Clone)]
struct NonceRecord {
    value: String,
    expires_at: Instant,
}

impl NonceRecord {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Nonce cache held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryNonceStore {
    records: DashMap<String, NonceRecord>,
}

impl InMemoryNonceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired record. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.records.len();
        self.records.retain(|_, record| record.is_live(now));
        before.saturating_sub(self.records.len())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Periodically purge expired records until shutdown is signalled.
    pub fn spawn_sweeper(self: Arc<Self>, interval: Duration, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = self.purge_expired();
                        if removed > 0 {
                            tracing::debug!(removed, remaining = self.len(), "Swept expired nonces");
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("Nonce sweeper stopping");
                        break;
                    }
                }
            }
        })
    }
}

#[async_trait]
impl NonceStore for InMemoryNonceStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        let now = Instant::now();
        let live = self
            .records
            .get(key)
            .filter(|r| r.is_live(now))
            .map(|r| r.value.clone());
        if live.is_none() {
            self.records.remove_if(key, |_, r| !r.is_live(now));
        }
        Ok(live)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), ServiceError> {
        self.records.insert(
            key.to_string(),
            NonceRecord {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn insert_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, ServiceError> {
        let now = Instant::now();
        let record = NonceRecord {
            value: value.to_string(),
            expires_at: now + ttl,
        };
        // The entry guard holds the shard lock across the check and the write.
        match self.records.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live(now) {
                    Ok(false)
                } else {
                    occupied.insert(record);
                    Ok(true)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(record);
                Ok(true)
            }
        }
    }
}
