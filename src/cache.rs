//! Response cache for GET documents, keyed by resource type and canonical request URL.

use crate::error::AppError;
use crate::resource::ResourceType;
use crate::response::Document;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Default)]
struct Entries {
    by_type: HashMap<ResourceType, HashMap<String, Document>>,
    /// Bumped on every invalidation; a document computed under an older generation is not stored.
    generation: u64,
}

impl Entries {
    fn len(&self) -> usize {
        self.by_type.values().map(HashMap::len).sum()
    }
}

pub struct ResponseCache {
    enabled: bool,
    max_entries: usize,
    entries: RwLock<Entries>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    pub fn new(enabled: bool, max_entries: usize) -> Self {
        ResponseCache {
            enabled,
            max_entries,
            entries: RwLock::new(Entries::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached document for `key`, or the result of `compute` (stored when it succeeds).
    pub async fn get_or_insert_with<F, Fut>(&self, kind: ResourceType, key: String, compute: F) -> Result<Document, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Document, AppError>>,
    {
        if !self.enabled {
            return compute().await;
        }

        let generation = {
            let entries = self.read();
            if let Some(doc) = entries.by_type.get(&kind).and_then(|m| m.get(&key)) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(resource = %kind, key = %key, "cache hit");
                return Ok(doc.clone());
            }
            entries.generation
        };
        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(resource = %kind, key = %key, "cache miss");

        let doc = compute().await?;

        let mut entries = self.write();
        if entries.generation == generation {
            if entries.len() >= self.max_entries {
                tracing::debug!(resource = %kind, entries = entries.len(), "cache full, dropping cached documents");
                entries.by_type.clear();
            }
            if self.max_entries > 0 {
                entries.by_type.entry(kind).or_default().insert(key, doc.clone());
            }
        }
        Ok(doc)
    }

    /// Drop every cached document for the given types.
    pub fn invalidate(&self, kinds: &[ResourceType]) {
        if !self.enabled {
            return;
        }
        let mut entries = self.write();
        entries.generation += 1;
        for kind in kinds {
            entries.by_type.remove(kind);
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.read().len(),
        }
    }
}
