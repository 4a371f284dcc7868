// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Attribute caches keyed by absolute, normalized path strings

use crate::attributes::FileAttributes;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Cache of fetched attributes shared by every user of one filesystem
pub trait AttributesCache: Send + Sync {
    fn get(&self, key: &str) -> Option<FileAttributes>;

    fn put(&self, key: &str, attributes: FileAttributes);

    fn invalidate(&self, key: &str);

    /// Remove `prefix` and every key below it.
    fn invalidate_subtree(&self, prefix: &str);

    fn clear(&self);
}

/// Choose the cache for a filesystem: zero TTL disables caching.
#[must_use]
pub fn for_ttl(ttl: Duration, separator: char) -> Box<dyn AttributesCache> {
    if ttl.is_zero() {
        Box::new(NoOpAttributesCache)
    } else {
        Box::new(TtlAttributesCache::new(ttl, separator))
    }
}

#[derive(Debug)]
struct Entry {
    attributes: FileAttributes,
    inserted_at: Instant,
}

/// Time-to-live cache; expired entries are dropped when next looked up
#[derive(Debug)]
pub struct TtlAttributesCache {
    ttl: Duration,
    separator: char,
    entries: RwLock<HashMap<String, Entry>>,
}

impl TtlAttributesCache {
    #[must_use]
    pub fn new(ttl: Duration, separator: char) -> Self {
        Self {
            ttl,
            separator,
            entries: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookup as of `now`.
    pub fn get_at(&self, key: &str, now: Instant) -> Option<FileAttributes> {
        {
            let guard = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match guard.get(key) {
                None => return None,
                Some(entry) if now.saturating_duration_since(entry.inserted_at) < self.ttl => {
                    return Some(entry.attributes.clone());
                }
                Some(_) => {}
            }
        }
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if guard
            .get(key)
            .is_some_and(|e| now.saturating_duration_since(e.inserted_at) >= self.ttl)
        {
            _ = guard.remove(key);
        }
        None
    }

    /// Insert as of `now`.
    pub fn put_at(&self, key: &str, attributes: FileAttributes, now: Instant) {
        _ = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                key.to_string(),
                Entry {
                    attributes,
                    inserted_at: now,
                },
            );
    }
}

impl AttributesCache for TtlAttributesCache {
    fn get(&self, key: &str) -> Option<FileAttributes> {
        self.get_at(key, Instant::now())
    }

    fn put(&self, key: &str, attributes: FileAttributes) {
        self.put_at(key, attributes, Instant::now());
    }

    fn invalidate(&self, key: &str) {
        _ = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    fn invalidate_subtree(&self, prefix: &str) {
        let mut below = prefix.trim_end_matches(self.separator).to_string();
        below.push(self.separator);
        let exact = prefix.trim_end_matches(self.separator);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|key, _| key != prefix && key != exact && !key.starts_with(&below));
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Cache that never stores anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpAttributesCache;

impl AttributesCache for NoOpAttributesCache {
    fn get(&self, _key: &str) -> Option<FileAttributes> {
        None
    }

    fn put(&self, _key: &str, _attributes: FileAttributes) {}

    fn invalidate(&self, _key: &str) {}

    fn invalidate_subtree(&self, _prefix: &str) {}

    fn clear(&self) {}
}
