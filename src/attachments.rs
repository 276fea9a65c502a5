use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::AttachmentError;

/// An uploaded file as received from the HTTP layer
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A stored attachment: the public URL paired with its on-disk location
#[derive(Debug, Clone)]
pub struct StoredAttachment {
    pub url: String,
    pub path: PathBuf,
}

/// Manages uploaded hero images on disk.
///
/// Files are kept under a single upload directory and exposed read-only
/// through a public URL prefix; the directory is distinct from the review
/// data directory.
pub struct AttachmentStore {
    upload_dir: PathBuf,
    public_prefix: String,
    max_bytes: usize,
}

impl AttachmentStore {
    pub fn open(
        upload_dir: impl AsRef<Path>,
        public_prefix: &str,
        max_bytes: usize,
    ) -> Result<Self, AttachmentError> {
        let upload_dir = upload_dir.as_ref().to_path_buf();
        fs::create_dir_all(&upload_dir).map_err(|source| AttachmentError::Io {
            path: upload_dir.clone(),
            source,
        })?;

        info!(path = %upload_dir.display(), "Opened upload directory");

        Ok(Self {
            upload_dir,
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
            max_bytes,
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Validate and write an upload, returning its public URL and disk path.
    ///
    /// Non-image content and oversized uploads are rejected before anything
    /// touches disk.
    pub fn store(&self, upload: Upload) -> Result<StoredAttachment, AttachmentError> {
        if !upload.content_type.starts_with("image/") {
            return Err(AttachmentError::Rejected(upload.content_type));
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(AttachmentError::TooLarge {
                size: upload.bytes.len(),
                limit: self.max_bytes,
            });
        }

        let name = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            sanitize(&upload.filename)
        );
        let path = self.upload_dir.join(&name);

        fs::write(&path, &upload.bytes).map_err(|source| AttachmentError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(file = %name, size = upload.bytes.len(), "Stored attachment");

        Ok(StoredAttachment {
            url: format!("{}/{}", self.public_prefix, name),
            path,
        })
    }

    /// Best-effort removal of the file behind a deleted review.
    ///
    /// Runs on a detached thread so the caller never blocks on it; failure is
    /// logged and never surfaced.
    pub fn remove_detached(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        thread::spawn(move || {
            if let Err(error) = fs::remove_file(&path) {
                warn!(path = %path.display(), %error, "Failed to remove detached attachment");
            }
        });
    }
}

/// Collapse whitespace runs to `-` and drop anything outside `[A-Za-z0-9._-]`.
fn sanitize(filename: &str) -> String {
    let mut out = String::with_capacity(filename.len());
    let mut gap = false;
    for c in filename.chars() {
        if c.is_whitespace() {
            gap = true;
            continue;
        }
        if gap {
            out.push('-');
            gap = false;
        }
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
            out.push(c);
        }
    }
    out
}
