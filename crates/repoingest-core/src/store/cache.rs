//! Typed, best-effort facade over a [`KeyValueStore`]

use super::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

/// JSON-encoding wrapper that never fails: store errors are logged and read
/// as a miss, writes become no-ops.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn KeyValueStore>,
}

impl Cache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get(key).await {
            Ok(raw) => decode(key, raw?),
            Err(e) => {
                error!(key, error = %e, "Cache get failed");
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let Some(raw) = encode(key, value) else {
            return;
        };
        if let Err(e) = self.store.set(key, &raw, ttl).await {
            error!(key, error = %e, "Cache set failed");
        }
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.store.delete(key).await.unwrap_or_else(|e| {
            error!(key, error = %e, "Cache delete failed");
            false
        })
    }

    pub async fn delete_pattern(&self, pattern: &str) -> usize {
        self.store.delete_pattern(pattern).await.unwrap_or_else(|e| {
            error!(pattern, error = %e, "Cache pattern delete failed");
            0
        })
    }

    pub async fn exists(&self, key: &str) -> bool {
        self.store.exists(key).await.unwrap_or_else(|e| {
            error!(key, error = %e, "Cache exists check failed");
            false
        })
    }

    pub async fn hget<T: DeserializeOwned>(&self, key: &str, field: &str) -> Option<T> {
        match self.store.hget(key, field).await {
            Ok(raw) => decode(key, raw?),
            Err(e) => {
                error!(key, field, error = %e, "Cache hget failed");
                None
            }
        }
    }

    pub async fn hset<T: Serialize>(&self, key: &str, field: &str, value: &T) {
        let Some(raw) = encode(key, value) else {
            return;
        };
        if let Err(e) = self.store.hset(key, field, &raw).await {
            error!(key, field, error = %e, "Cache hset failed");
        }
    }

    /// Every decodable field of a hash; undecodable entries are logged and dropped
    pub async fn hgetall<T: DeserializeOwned>(&self, key: &str) -> HashMap<String, T> {
        match self.store.hgetall(key).await {
            Ok(raw) => raw
                .into_iter()
                .filter_map(|(field, value)| decode(key, value).map(|v| (field, v)))
                .collect(),
            Err(e) => {
                error!(key, error = %e, "Cache hgetall failed");
                HashMap::new()
            }
        }
    }

    pub async fn sadd(&self, key: &str, member: &str) {
        if let Err(e) = self.store.sadd(key, member).await {
            error!(key, member, error = %e, "Cache sadd failed");
        }
    }

    pub async fn srem(&self, key: &str, member: &str) {
        if let Err(e) = self.store.srem(key, member).await {
            error!(key, member, error = %e, "Cache srem failed");
        }
    }

    pub async fn smembers(&self, key: &str) -> Vec<String> {
        self.store.smembers(key).await.unwrap_or_else(|e| {
            error!(key, error = %e, "Cache smembers failed");
            Vec::new()
        })
    }

    pub async fn sismember(&self, key: &str, member: &str) -> bool {
        self.store.sismember(key, member).await.unwrap_or_else(|e| {
            error!(key, member, error = %e, "Cache sismember failed");
            false
        })
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> Option<String> {
    serde_json::to_string(value)
        .map_err(|e| error!(key, error = %e, "Cache encode failed"))
        .ok()
}

fn decode<T: DeserializeOwned>(key: &str, raw: String) -> Option<T> {
    serde_json::from_str(&raw)
        .map_err(|e| error!(key, error = %e, "Cache decode failed"))
        .ok()
}
