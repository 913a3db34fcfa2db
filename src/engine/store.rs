//! In-memory result store.
//!
//! Keyed by validation id, bounded in size. When full, the oldest entry is
//! evicted. Lookups return the stored `Arc`, never a recomputed copy.

use crate::engine::result::ValidationResult;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Default)]
struct StoreInner {
    order: VecDeque<String>,
    entries: HashMap<String, Arc<ValidationResult>>,
}

pub struct ResultStore {
    capacity: usize,
    inner: Mutex<StoreInner>,
}

impl ResultStore {
    pub fn new(capacity: usize) -> Self {
        ResultStore {
            capacity: capacity.max(1),
            inner: Mutex::new(StoreInner::default()),
        }
    }

    /// Store a result, evicting the oldest entries if over capacity.
    pub fn insert(&self, result: Arc<ValidationResult>) {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let id = result.validation_id.clone();

        if inner.entries.insert(id.clone(), result).is_none() {
            inner.order.push_back(id);
        }

        while inner.order.len() > self.capacity {
            if let Some(evicted) = inner.order.pop_front() {
                inner.entries.remove(&evicted);
                debug!(validation_id = %evicted, "evicted stored validation result");
            }
        }
    }

    pub fn get(&self, validation_id: &str) -> Option<Arc<ValidationResult>> {
        let inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        inner.entries.get(validation_id).cloned()
    }

    /// Stored ids, oldest first.
    pub fn ids(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        inner.order.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
