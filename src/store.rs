use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::Review;

/// Flat-file store holding the entire review collection as one JSON array.
///
/// Every save rewrites the full document through a sibling temp file followed
/// by a rename, so a crash at any point leaves the previous version intact.
pub struct ReviewStore {
    path: PathBuf,
}

impl ReviewStore {
    /// Open the store at `path`, creating the containing directory and an
    /// empty collection file on first run.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        store.ensure()?;

        info!(path = %store.path.display(), "Opened review store");

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn ensure(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|source| StoreError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        if !self.path.exists() {
            fs::write(&self.path, "[]").map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
            info!(path = %self.path.display(), "Initialized empty review collection");
        }

        Ok(())
    }

    /// Load the entire collection.
    pub fn load(&self) -> Result<Vec<Review>, StoreError> {
        self.ensure()?;

        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;

        let reviews: Vec<Review> =
            serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        debug!(count = reviews.len(), "Loaded review collection");

        Ok(reviews)
    }

    /// Persist the full collection.
    ///
    /// The new content is written to `<file>.tmp` and renamed over the
    /// target; the rename is the only point where the new state becomes
    /// visible.
    pub fn save(&self, reviews: &[Review]) -> Result<(), StoreError> {
        self.ensure()?;

        let content = serde_json::to_string_pretty(reviews).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source: std::io::Error::other(source),
        })?;

        let tmp = self.tmp_path();
        fs::write(&tmp, content).map_err(|source| StoreError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(count = reviews.len(), "Persisted review collection");

        Ok(())
    }
}
