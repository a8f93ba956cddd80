//! Document store boundary.
//!
//! The translation engine only needs `list`/`get`; `put`/`delete` exist for the management
//! surface. Implementations must replace their document map as a whole on mutation so readers
//! never observe a half-updated catalog.

use crate::document::ApiDocument;
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Immutable snapshot of all documents, keyed (and therefore ordered) by id.
pub type DocumentMap = BTreeMap<String, Arc<ApiDocument>>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents, ordered by id.
    async fn list(&self) -> Result<Vec<Arc<ApiDocument>>>;

    async fn get(&self, id: &str) -> Result<Option<Arc<ApiDocument>>>;

    /// Insert or replace a document.
    async fn put(&self, doc: ApiDocument) -> Result<()>;

    /// Remove a document. Returns whether it existed.
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Copy-on-write snapshot cell shared by store implementations.
///
/// Readers clone the current `Arc` and drop the lock immediately; writers build a new map and
/// swap it in.
#[derive(Debug, Default)]
pub struct SnapshotCell {
    inner: RwLock<Arc<DocumentMap>>,
}

impl SnapshotCell {
    #[must_use]
    pub fn new(map: DocumentMap) -> Self {
        Self {
            inner: RwLock::new(Arc::new(map)),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<DocumentMap> {
        self.inner.read().clone()
    }

    /// Replace the whole map.
    pub fn replace(&self, map: DocumentMap) {
        *self.inner.write() = Arc::new(map);
    }

    /// Apply `f` to a copy of the current map and swap the result in. Returns `f`'s output.
    pub fn update<R>(&self, f: impl FnOnce(&mut DocumentMap) -> R) -> R {
        let mut guard = self.inner.write();
        let mut next = (**guard).clone();
        let out = f(&mut next);
        *guard = Arc::new(next);
        out
    }
}

/// In-memory store. Used by tests and by embedders that load documents themselves.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    docs: SnapshotCell,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_documents(docs: impl IntoIterator<Item = ApiDocument>) -> Self {
        let map = docs
            .into_iter()
            .map(|d| (d.id.clone(), Arc::new(d)))
            .collect();
        Self {
            docs: SnapshotCell::new(map),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list(&self) -> Result<Vec<Arc<ApiDocument>>> {
        Ok(self.docs.snapshot().values().cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Arc<ApiDocument>>> {
        Ok(self.docs.snapshot().get(id).cloned())
    }

    async fn put(&self, doc: ApiDocument) -> Result<()> {
        self.docs.update(|m| {
            m.insert(doc.id.clone(), Arc::new(doc));
        });
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.docs.update(|m| m.remove(id).is_some()))
    }
}
