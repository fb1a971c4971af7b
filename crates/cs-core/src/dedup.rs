//! In-process fast path for duplicate detection.
//!
//! `SeenHashes` remembers which content hashes were recently captured and
//! which record they belong to, so the hot dedup path can resolve a
//! re-capture with a primary-key lookup instead of a hash scan. It is a
//! probabilistic accelerator, not a source of truth: absence here says
//! nothing about the store, and the authoritative store lookup must still
//! run on every miss.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::ids::RecordId;

pub const DEFAULT_SEEN_CAPACITY: usize = 1_000;

struct Inner {
    by_hash: HashMap<i64, RecordId>,
    insertion_order: VecDeque<i64>,
}

/// Bounded insertion-ordered hash→record map.
///
/// All operations take a single lock, so lookup-then-remember sequences from
/// concurrent captures cannot interleave into duplicate inserts. Overflow
/// drops the oldest half of the entries; exactness is not required.
pub struct SeenHashes {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl SeenHashes {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(2),
            inner: Mutex::new(Inner {
                by_hash: HashMap::new(),
                insertion_order: VecDeque::new(),
            }),
        }
    }

    pub fn lookup(&self, content_hash: i64) -> Option<RecordId> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.by_hash.get(&content_hash).cloned()
    }

    /// Remember a hash→record association, evicting the oldest half of the
    /// set when capacity is exceeded.
    pub fn remember(&self, content_hash: i64, id: RecordId) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.by_hash.insert(content_hash, id).is_none() {
            inner.insertion_order.push_back(content_hash);
        }

        if inner.insertion_order.len() > self.capacity {
            let drop_count = self.capacity / 2;
            for _ in 0..drop_count {
                if let Some(old) = inner.insertion_order.pop_front() {
                    inner.by_hash.remove(&old);
                }
            }
        }
    }

    /// Drop everything. Used when history is cleared wholesale.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.by_hash.clear();
        inner.insertion_order.clear();
    }

    /// Drop a stale association (record deleted, or its content edited).
    pub fn forget(&self, content_hash: i64) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.by_hash.remove(&content_hash).is_some() {
            inner.insertion_order.retain(|h| *h != content_hash);
        }
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SeenHashes {
    fn default() -> Self {
        Self::new(DEFAULT_SEEN_CAPACITY)
    }
}
