use crate::models::Database;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed store document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Flat JSON document holding every collection.
///
/// Each operation reads the whole file; each write rewrites the whole file.
/// Read-modify-write cycles are serialized so concurrent admin requests
/// cannot drop each other's changes, and the file is replaced by rename so
/// readers never observe a half-written document.
pub struct JsonStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStore {
    /// Opens the store, creating an empty document (and its directory) if needed.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        };

        if let Some(parent) = store.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        if tokio::fs::metadata(&store.path).await.is_err() {
            tracing::info!("Initializing empty store at {:?}", store.path);
            store.write(&Database::default()).await?;
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<Database, StoreError> {
        let raw = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Runs `f` against a fresh copy of the document and persists the result.
    /// Nothing is written when `f` fails.
    pub async fn update<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Database) -> Result<T, StoreError>,
    {
        let _guard = self.write_lock.lock().await;

        let mut db = self.read().await?;
        let out = f(&mut db)?;
        self.write(&db).await?;

        Ok(out)
    }

    async fn write(&self, db: &Database) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(db)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!("Wrote {} bytes to {:?}", body.len(), self.path);
        Ok(())
    }
}
