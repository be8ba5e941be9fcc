//! Flat-file vector store.
//!
//! The whole collection lives in one JSON array which is read in full for
//! every operation and rewritten in full after every mutation. Mutations are
//! serialized by an in-process mutex plus an advisory lock on a sidecar
//! `.lock` file, so concurrent writers (threads or processes) cannot drop
//! each other's records.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;

use super::store::{ChunkRecord, VectorStore};
use crate::core::errors::ApiError;

pub struct JsonVectorStore {
    path: PathBuf,
    lock_path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonVectorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = sidecar_path(&path, "lock");
        Self {
            path,
            lock_path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_lock_file(&self) -> Result<File, ApiError> {
        if let Some(parent) = self.lock_path.parent() {
            fs::create_dir_all(parent).map_err(ApiError::storage)?;
        }
        OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(ApiError::storage)
    }

    fn read_records(&self) -> Result<Vec<ChunkRecord>, ApiError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(ApiError::Storage(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    err
                )))
            }
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents).map_err(|err| {
            ApiError::Storage(format!(
                "malformed vector store {}: {}",
                self.path.display(),
                err
            ))
        })
    }

    fn write_records(&self, records: &[ChunkRecord]) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(ApiError::storage)?;
        }
        let data = serde_json::to_vec(records).map_err(ApiError::storage)?;

        // Write a sibling file first so readers never observe a half-written store.
        let tmp_path = sidecar_path(&self.path, "tmp");
        fs::write(&tmp_path, data).map_err(|err| {
            ApiError::Storage(format!("failed to write {}: {}", tmp_path.display(), err))
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|err| {
            let _ = fs::remove_file(&tmp_path);
            ApiError::Storage(format!(
                "failed to replace {}: {}",
                self.path.display(),
                err
            ))
        })
    }

    /// Load, modify and save under the exclusive lock. Nothing is written if
    /// `apply` fails.
    fn mutate<T, F>(&self, apply: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Vec<ChunkRecord>) -> Result<T, ApiError>,
    {
        let _guard = self.write_lock.lock().map_err(ApiError::internal)?;
        let lock_file = self.open_lock_file()?;
        lock_file.lock_exclusive().map_err(ApiError::storage)?;

        let result = self.read_records().and_then(|mut records| {
            let value = apply(&mut records)?;
            self.write_records(&records)?;
            Ok(value)
        });

        let _ = lock_file.unlock();
        result
    }
}

impl VectorStore for JsonVectorStore {
    fn load(&self) -> Result<Vec<ChunkRecord>, ApiError> {
        let lock_file = self.open_lock_file()?;
        lock_file.lock_shared().map_err(ApiError::storage)?;
        let records = self.read_records();
        let _ = lock_file.unlock();
        records
    }

    fn append_document(
        &self,
        parent_identifier: &str,
        segments: Vec<(String, Vec<f32>)>,
    ) -> Result<Vec<String>, ApiError> {
        if segments.is_empty() {
            return Ok(Vec::new());
        }

        self.mutate(|records| {
            let dimension = records
                .first()
                .map(|record| record.embedding.len())
                .unwrap_or_else(|| segments[0].1.len());

            if let Some((_, embedding)) = segments
                .iter()
                .find(|(_, embedding)| embedding.is_empty() || embedding.len() != dimension)
            {
                return Err(ApiError::Embedding(format!(
                    "embedding dimension {} does not match store dimension {}",
                    embedding.len(),
                    dimension
                )));
            }

            let next_sequence = records
                .iter()
                .filter(|record| record.parent_identifier == parent_identifier)
                .filter_map(ChunkRecord::sequence_index)
                .max()
                .map_or(0, |max| max + 1);

            let mut identifiers = Vec::with_capacity(segments.len());
            for (offset, (text, embedding)) in segments.into_iter().enumerate() {
                let record = ChunkRecord::new(parent_identifier, next_sequence + offset, text, embedding);
                if records.iter().any(|existing| existing.identifier == record.identifier) {
                    return Err(ApiError::Storage(format!(
                        "duplicate chunk identifier {}",
                        record.identifier
                    )));
                }
                identifiers.push(record.identifier.clone());
                records.push(record);
            }

            tracing::debug!(
                parent = parent_identifier,
                added = identifiers.len(),
                total = records.len(),
                "Appending chunks to vector store"
            );
            Ok(identifiers)
        })
    }

    fn delete_document(&self, parent_identifier: &str) -> Result<usize, ApiError> {
        self.mutate(|records| {
            let before = records.len();
            records.retain(|record| record.parent_identifier != parent_identifier);
            let removed = before - records.len();
            if removed == 0 {
                return Err(ApiError::NotFound(format!(
                    "document '{}' is not indexed",
                    parent_identifier
                )));
            }
            Ok(removed)
        })
    }
}

fn sidecar_path(path: &Path, extension: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "vector_store.json".into());
    name.push(".");
    name.push(extension);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn test_store() -> (tempfile::TempDir, JsonVectorStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonVectorStore::new(dir.path().join("vector_store.json"));
        (dir, store)
    }

    fn segment(text: &str, embedding: &[f32]) -> (String, Vec<f32>) {
        (text.to_string(), embedding.to_vec())
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let (_dir, store) = test_store();
        assert!(store.load().unwrap().is_empty());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn persist_and_reload_preserves_records_exactly() {
        let (_dir, store) = test_store();
        store
            .append_document(
                "contract",
                vec![
                    segment("Termination requires 30 days notice.", &[0.125, -0.5, 0.0625]),
                    segment("Payment is due monthly.", &[1.0, 0.75, -2.5]),
                ],
            )
            .unwrap();

        let first = store.load().unwrap();
        let reopened = JsonVectorStore::new(store.path().to_path_buf());
        let second = reopened.load().unwrap();

        assert_eq!(first, second);
        assert_eq!(second[0].identifier, "contract::0");
        assert_eq!(second[1].identifier, "contract::1");
        assert_eq!(second[1].embedding, vec![1.0, 0.75, -2.5]);
    }

    #[test]
    fn reappending_a_document_continues_numbering() {
        let (_dir, store) = test_store();
        let first = store
            .append_document("a", vec![segment("one", &[1.0]), segment("two", &[2.0])])
            .unwrap();
        let second = store
            .append_document("a", vec![segment("one", &[1.0]), segment("two", &[2.0])])
            .unwrap();

        assert_eq!(first, vec!["a::0", "a::1"]);
        assert_eq!(second, vec!["a::2", "a::3"]);
        assert_eq!(store.count().unwrap(), 4);
    }

    #[test]
    fn dimension_mismatch_leaves_store_untouched() {
        let (_dir, store) = test_store();
        store.append_document("a", vec![segment("one", &[1.0, 0.0])]).unwrap();

        let err = store
            .append_document("b", vec![segment("ok", &[0.0, 1.0]), segment("bad", &[1.0])])
            .unwrap_err();

        assert!(matches!(err, ApiError::Embedding(_)));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn malformed_file_is_a_storage_failure() {
        let (_dir, store) = test_store();
        fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.load(), Err(ApiError::Storage(_))));
    }

    #[test]
    fn delete_document_removes_only_its_chunks() {
        let (_dir, store) = test_store();
        store.append_document("a", vec![segment("x", &[1.0]), segment("y", &[1.0])]).unwrap();
        store.append_document("b", vec![segment("z", &[1.0])]).unwrap();

        assert_eq!(store.delete_document("a").unwrap(), 2);
        let remaining = store.load().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].parent_identifier, "b");

        assert!(matches!(store.delete_document("a"), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn concurrent_appends_are_not_lost() {
        let (_dir, store) = test_store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .append_document(&format!("doc{}", i), vec![segment("text", &[1.0, 0.0])])
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.count().unwrap(), 8);
        assert_eq!(store.documents().unwrap().len(), 8);
    }
}
