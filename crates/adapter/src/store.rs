//! File-backed document store: one `<id>.json` per document in a directory.
//!
//! The in-memory map is a snapshot replaced as a whole on every mutation or rescan. Writers
//! (put/delete/reload) are serialized so a rescan never races a half-written file.

use async_trait::async_trait;
use openapi_mcp_tools::document::ApiDocument;
use openapi_mcp_tools::error::{OpenApiToolsError, Result};
use openapi_mcp_tools::store::{DocumentMap, DocumentStore, SnapshotCell};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct FileDocumentStore {
    dir: PathBuf,
    docs: SnapshotCell,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileDocumentStore {
    /// Create the directory if missing and load every document in it.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or listed. Individual unreadable or
    /// invalid files are skipped with a warning.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        let docs = scan_dir(&dir).await?;
        tracing::info!(dir = %dir.display(), count = docs.len(), "loaded API documents");
        Ok(Self {
            dir,
            docs: SnapshotCell::new(docs),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Rescan the directory and swap in the new map. Returns the number of loaded documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed; the previous map is kept.
    pub async fn reload(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let docs = scan_dir(&self.dir).await?;
        let count = docs.len();

        if *self.docs.snapshot() != docs {
            tracing::info!(count, "API documents changed on disk; reloaded");
        }
        self.docs.replace(docs);
        Ok(count)
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        // Ids persisted before validation may contain '_'; anything that could escape the
        // directory is refused.
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(OpenApiToolsError::Store(format!(
                "invalid document id for file storage: '{id}'"
            )));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn list(&self) -> Result<Vec<Arc<ApiDocument>>> {
        Ok(self.docs.snapshot().values().cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Arc<ApiDocument>>> {
        Ok(self.docs.snapshot().get(id).cloned())
    }

    async fn put(&self, doc: ApiDocument) -> Result<()> {
        let path = self.path_for(&doc.id)?;
        let json = serde_json::to_vec_pretty(&doc)?;

        let _guard = self.write_lock.lock().await;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::info!(document = %doc.id, "stored API document");
        self.docs.update(|m| {
            m.insert(doc.id.clone(), Arc::new(doc));
        });
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let path = self.path_for(id)?;

        let _guard = self.write_lock.lock().await;
        let removed_file = match tokio::fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        let removed_entry = self.docs.update(|m| m.remove(id).is_some());

        if removed_file || removed_entry {
            tracing::info!(document = %id, "deleted API document");
        }
        Ok(removed_file || removed_entry)
    }
}

async fn scan_dir(dir: &Path) -> Result<DocumentMap> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut paths: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut docs = DocumentMap::new();
    for path in paths {
        match load_document(&path).await {
            Ok(doc) => {
                if docs.contains_key(&doc.id) {
                    tracing::warn!(
                        path = %path.display(),
                        document = %doc.id,
                        "duplicate document id; keeping the first file"
                    );
                    continue;
                }
                docs.insert(doc.id.clone(), Arc::new(doc));
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable API document");
            }
        }
    }
    Ok(docs)
}

async fn load_document(path: &Path) -> Result<ApiDocument> {
    let text = tokio::fs::read_to_string(path).await?;
    let doc: ApiDocument = serde_json::from_str(&text)?;
    if doc.id.is_empty() {
        return Err(OpenApiToolsError::InvalidDocument(
            "document id must not be empty".to_string(),
        ));
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn doc(id: &str) -> ApiDocument {
        ApiDocument::new(
            id,
            format!("{id} API"),
            "https://example.com/",
            json!({"openapi": "3.0.0", "paths": {"/a": {"get": {}}}}),
            None,
        )
        .expect("valid document")
    }

    #[tokio::test]
    async fn open_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let specs = dir.path().join("data").join("specs");
        let store = FileDocumentStore::open(&specs).await.unwrap();
        assert!(specs.is_dir());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn put_persists_and_reopen_loads() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).await.unwrap();
        store.put(doc("petstore")).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("petstore.json")).unwrap();
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v["baseUrl"], "https://example.com");
        assert!(v["createdAt"].is_string());

        let reopened = FileDocumentStore::open(dir.path()).await.unwrap();
        let loaded = reopened.get("petstore").await.unwrap().expect("loaded");
        assert_eq!(loaded.name, "petstore API");
    }

    #[tokio::test]
    async fn invalid_files_are_skipped() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("partial.json"), r#"{"id": "x"}"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::write(
            dir.path().join("ok.json"),
            serde_json::to_string(&doc("ok")).unwrap(),
        )
        .unwrap();

        let store = FileDocumentStore::open(dir.path()).await.unwrap();
        let ids: Vec<_> = store
            .list()
            .await
            .unwrap()
            .iter()
            .map(|d| d.id.clone())
            .collect();
        assert_eq!(ids, ["ok"]);
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).await.unwrap();
        store.put(doc("gone")).await.unwrap();

        assert!(store.delete("gone").await.unwrap());
        assert!(!dir.path().join("gone.json").exists());
        assert!(!store.delete("gone").await.unwrap());
    }

    #[tokio::test]
    async fn reload_picks_up_out_of_band_changes() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).await.unwrap();
        assert_eq!(store.reload().await.unwrap(), 0);

        std::fs::write(
            dir.path().join("late.json"),
            serde_json::to_string(&doc("late")).unwrap(),
        )
        .unwrap();
        assert_eq!(store.reload().await.unwrap(), 1);
        assert!(store.get("late").await.unwrap().is_some());

        std::fs::remove_file(dir.path().join("late.json")).unwrap();
        assert_eq!(store.reload().await.unwrap(), 0);
        assert!(store.get("late").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn path_traversal_ids_are_refused() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).await.unwrap();
        assert!(store.delete("../escape").await.is_err());
        assert!(store.delete("").await.is_err());
    }
}
