//! Snapshot-per-write table.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Serialize, de::DeserializeOwned};

use crate::repository::table::TableStore;
use crate::repository::{RepositoryError, Result};

/// Table mirrored to a single JSON file.
///
/// Rows live in memory; every write replaces the file through a temp file
/// and an atomic rename, so a reader never sees a half-written table. The
/// file holds `[key, row]` pairs so keys need not be strings.
///
/// The in-memory rows are authoritative. A failed snapshot is logged and the
/// write still succeeds; the next successful write catches the file up.
pub struct FileTable<K, V> {
    path: PathBuf,
    rows: RwLock<BTreeMap<K, V>>,
}

impl<K, V> FileTable<K, V>
where
    K: Ord + Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    /// Opens `base_dir/filename`, loading existing rows.
    pub fn open(base_dir: impl AsRef<Path>, filename: impl AsRef<str>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        fs::create_dir_all(base_dir).map_err(RepositoryError::Io)?;
        let path = base_dir.join(filename.as_ref());

        let rows = if path.exists() {
            let bytes = fs::read(&path).map_err(RepositoryError::Io)?;
            let pairs: Vec<(K, V)> = serde_json::from_slice(&bytes).map_err(|e| {
                RepositoryError::CorruptedData(format!("{}: {}", path.display(), e))
            })?;
            pairs.into_iter().collect()
        } else {
            BTreeMap::new()
        };

        tracing::debug!("Loaded {} rows from {}", rows.len(), path.display());

        Ok(Self {
            path,
            rows: RwLock::new(rows),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, rows: &BTreeMap<K, V>) -> Result<()> {
        let pairs: Vec<(&K, &V)> = rows.iter().collect();
        let bytes = serde_json::to_vec(&pairs)?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, bytes).map_err(RepositoryError::Io)?;
        fs::rename(&temp_path, &self.path).map_err(RepositoryError::Io)?;

        tracing::debug!("Saved {} rows to {}", rows.len(), self.path.display());
        Ok(())
    }
}

impl<K, V> TableStore<K, V> for FileTable<K, V>
where
    K: Ord + Serialize + DeserializeOwned + Send + Sync,
    V: Serialize + DeserializeOwned + Send + Sync,
{
    fn read<R>(&self, f: impl FnOnce(&BTreeMap<K, V>) -> R) -> Result<R> {
        let rows = self.rows.read().map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(f(&rows))
    }

    fn write<R>(&self, f: impl FnOnce(&mut BTreeMap<K, V>) -> R) -> Result<R> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let out = f(&mut rows);
        if let Err(e) = self.persist(&rows) {
            tracing::warn!("Failed to save {}: {}", self.path.display(), e);
        }
        Ok(out)
    }
}
