use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::render::Artifact;

pub fn generate_batch_id() -> String {
    format!(
        "{}_{}",
        Utc::now().format("%Y%m%d"),
        Uuid::new_v4().to_string()[..8].to_string()
    )
}

/// One completed generation run: the rendered certificates plus the
/// prebuilt zip bundle. Held in memory only, never written to disk.
pub struct Batch {
    pub artifacts: Vec<Artifact>,
    pub bundle: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// In-memory store for completed batches, keyed by batch id. Bounded:
/// the oldest batch is evicted once capacity is reached.
pub struct BatchStore {
    capacity: usize,
    inner: Mutex<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    batches: HashMap<String, Batch>,
    order: VecDeque<String>,
}

impl BatchStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(StoreInner::default()),
        }
    }

    pub fn insert(&self, artifacts: Vec<Artifact>, bundle: Vec<u8>) -> String {
        let id = generate_batch_id();
        let batch = Batch {
            artifacts,
            bundle,
            created_at: Utc::now(),
        };

        let mut inner = self.inner.lock().expect("batch store lock poisoned");
        while inner.order.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.batches.remove(&oldest);
            }
        }
        inner.order.push_back(id.clone());
        inner.batches.insert(id.clone(), batch);
        id
    }

    /// Filenames of every artifact in the batch, in render order.
    pub fn filenames(&self, id: &str) -> Option<Vec<String>> {
        let inner = self.inner.lock().expect("batch store lock poisoned");
        inner
            .batches
            .get(id)
            .map(|b| b.artifacts.iter().map(|a| a.filename.clone()).collect())
    }

    /// PNG bytes for one artifact, looked up by filename. Filenames
    /// are unique within a batch (the renderer disambiguates).
    pub fn artifact(&self, id: &str, filename: &str) -> Option<Vec<u8>> {
        let inner = self.inner.lock().expect("batch store lock poisoned");
        inner
            .batches
            .get(id)?
            .artifacts
            .iter()
            .find(|a| a.filename == filename)
            .map(|a| a.bytes.clone())
    }

    pub fn created_at(&self, id: &str) -> Option<DateTime<Utc>> {
        let inner = self.inner.lock().expect("batch store lock poisoned");
        inner.batches.get(id).map(|b| b.created_at)
    }

    pub fn bundle(&self, id: &str) -> Option<Vec<u8>> {
        let inner = self.inner.lock().expect("batch store lock poisoned");
        inner.batches.get(id).map(|b| b.bundle.clone())
    }
}
