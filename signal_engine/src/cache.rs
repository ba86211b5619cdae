//! Short-lived memoisation of analysis results.
//!
//! Entries expire a fixed time after insertion and are never invalidated
//! early. Errors are never stored.

use std::{
    collections::HashMap,
    future::Future,
    hash::Hash,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use market_data_ingestor::models::{asset::Symbol, timeframe::Timeframe};
use tokio::time::Instant;

use crate::{analyzer::SignalReport, sentiment::SentimentScore};

/// What makes two analysis requests interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    /// Whether a real-time credential was supplied, not the credential itself.
    pub premium: bool,
    pub sentiment: Option<SentimentScore>,
}

pub type SignalCache = TtlCache<CacheKey, SignalReport>;

pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (Instant, Arc<V>)>>,
}

impl<K: Eq + Hash + Clone, V> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The live entry for `key`, dropping it if it has expired.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some((stored, value)) if stored.elapsed() < self.ttl => Some(Arc::clone(value)),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, (stored, _)| stored.elapsed() < self.ttl);
        entries.insert(key, (Instant::now(), Arc::clone(&value)));
        value
    }

    /// Returns the cached value or computes, stores and returns a fresh one.
    ///
    /// The lock is not held while `compute` runs, so two concurrent misses on
    /// the same key may both compute; the later insert wins.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, compute: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        let value = compute().await?;
        Ok(self.insert(key, value))
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
