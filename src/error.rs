use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Failures of the on-disk review store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("corrupt review store at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read review store at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write review store at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures surfaced by repository operations
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("no review with id {0}")]
    NotFound(Uuid),

    #[error("failed to persist reviews: {0}")]
    Persistence(#[from] StoreError),

    #[error("attachment error: {0}")]
    Attachment(#[from] AttachmentError),
}

/// Failures while validating or storing an uploaded attachment
#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("unsupported upload content type: {0}")]
    Rejected(String),

    #[error("upload of {size} bytes exceeds limit of {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("failed to write upload {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
