//! In-process store

use super::KeyValueStore;
use crate::error::Result;
use async_trait::async_trait;
use glob::Pattern;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Default)]
struct Maps {
    plain: HashMap<String, (String, Option<Instant>)>,
    hashes: HashMap<String, HashMap<String, String>>,
    sets: HashMap<String, HashSet<String>>,
}

impl Maps {
    fn live_plain(&self, key: &str) -> Option<&String> {
        match self.plain.get(key) {
            Some((_, Some(expires))) if *expires <= Instant::now() => None,
            Some((value, _)) => Some(value),
            None => None,
        }
    }

    fn remove(&mut self, key: &str) -> bool {
        let plain = self.plain.remove(key).is_some();
        let hash = self.hashes.remove(key).is_some();
        let set = self.sets.remove(key).is_some();
        plain || hash || set
    }
}

/// Store that lives only as long as the process
#[derive(Default)]
pub struct MemoryStore {
    maps: RwLock<Maps>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.maps.read().await.live_plain(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let expires = ttl.map(|t| Instant::now() + t);
        self.maps
            .write()
            .await
            .plain
            .insert(key.to_string(), (value.to_string(), expires));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.maps.write().await.remove(key))
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize> {
        let pattern = Pattern::new(pattern)?;
        let mut maps = self.maps.write().await;

        let mut keys: HashSet<String> = maps.plain.keys().cloned().collect();
        keys.extend(maps.hashes.keys().cloned());
        keys.extend(maps.sets.keys().cloned());

        let mut removed = 0;
        for key in keys.iter().filter(|k| pattern.matches(k)) {
            if maps.remove(key) {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let maps = self.maps.read().await;
        Ok(maps.live_plain(key).is_some()
            || maps.hashes.contains_key(key)
            || maps.sets.contains_key(key))
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        Ok(self
            .maps
            .read()
            .await
            .hashes
            .get(key)
            .and_then(|h| h.get(field))
            .cloned())
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
        self.maps
            .write()
            .await
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        Ok(self
            .maps
            .read()
            .await
            .hashes
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        Ok(self
            .maps
            .write()
            .await
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    async fn srem(&self, key: &str, member: &str) -> Result<bool> {
        let mut maps = self.maps.write().await;
        let Some(set) = maps.sets.get_mut(key) else {
            return Ok(false);
        };
        let removed = set.remove(member);
        if set.is_empty() {
            maps.sets.remove(key);
        }
        Ok(removed)
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        Ok(self
            .maps
            .read()
            .await
            .sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        Ok(self
            .maps
            .read()
            .await
            .sets
            .get(key)
            .is_some_and(|s| s.contains(member)))
    }
}
