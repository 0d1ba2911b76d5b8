//! A bounded set of live [`GetFile`] handles, one per file URI.
//!
//! Each handle holds its decoded bytes behind an object URL. When the set is
//! full the least recently requested handle is dropped, which revokes its URL.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use hof_core::files::GetFile;
use tracing::debug;

pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Default)]
struct Inner {
    handles: HashMap<String, Arc<GetFile>>,
    /// Least recently requested first
    order: VecDeque<String>,
}

pub struct LiveFiles {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl LiveFiles {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Returns the handle for `uri`, creating it with `make` when absent.
    pub fn get_or_insert_with(&self, uri: &str, make: impl FnOnce() -> GetFile) -> Arc<GetFile> {
        let mut evicted = Vec::new();
        let handle = {
            let mut inner = self.lock();
            inner.order.retain(|u| u != uri);
            inner.order.push_back(uri.to_string());

            let handle = inner
                .handles
                .entry(uri.to_string())
                .or_insert_with(|| Arc::new(make()))
                .clone();

            while inner.handles.len() > self.capacity {
                let Some(oldest) = inner.order.pop_front() else {
                    break;
                };
                if let Some(old) = inner.handles.remove(&oldest) {
                    debug!(uri = %oldest, "evicting live file");
                    evicted.push(old);
                }
            }
            handle
        };
        // Revocation happens here, outside the lock
        drop(evicted);
        handle
    }

    pub fn remove(&self, uri: &str) {
        let removed = {
            let mut inner = self.lock();
            inner.order.retain(|u| u != uri);
            inner.handles.remove(uri)
        };
        drop(removed);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
