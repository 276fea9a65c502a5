use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};
use uuid::Uuid;

use crate::attachments::{AttachmentStore, Upload};
use crate::error::{RepoError, StoreError};
use crate::identity;
use crate::models::{Review, ReviewDraft};
use crate::store::ReviewStore;

/// Authoritative in-memory review collection, kept in sync with the durable
/// store.
///
/// Every mutating operation holds one lock around both the in-memory
/// collection and the store call, so the read-modify-write-persist sequence
/// is atomic across concurrent requests. The guard is never held across an
/// await point; saves complete synchronously inside the critical section.
///
/// A failed save does not roll back the in-memory change: memory runs ahead
/// of disk until the next successful save converges the two.
pub struct ReviewRepository {
    reviews: Mutex<Vec<Review>>,
    store: ReviewStore,
    attachments: AttachmentStore,
}

impl ReviewRepository {
    /// Load the collection, backfill missing identifiers, and re-persist
    /// immediately if the backfill changed anything.
    pub fn open(store: ReviewStore, attachments: AttachmentStore) -> Result<Self, StoreError> {
        let mut reviews = store.load()?;

        if identity::backfill(&mut reviews) {
            store.save(&reviews)?;
            info!(count = reviews.len(), "Backfilled review identifiers");
        }

        info!(count = reviews.len(), "Loaded review repository");

        Ok(Self {
            reviews: Mutex::new(reviews),
            store,
            attachments,
        })
    }

    fn guard(&self) -> MutexGuard<'_, Vec<Review>> {
        self.reviews.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All reviews in current order, most recently created first.
    pub fn list_all(&self) -> Vec<Review> {
        self.guard().clone()
    }

    pub fn find_by_id(&self, id: &Uuid) -> Option<Review> {
        self.guard().iter().find(|r| r.id == *id).cloned()
    }

    /// Create a review from a draft, storing the upload (if any) through the
    /// attachment manager first so a rejected upload never creates a record.
    ///
    /// The new record is prepended: the collection displays most recent
    /// first.
    pub fn insert(
        &self,
        draft: ReviewDraft,
        upload: Option<Upload>,
    ) -> Result<Review, RepoError> {
        let stored = upload.map(|u| self.attachments.store(u)).transpose()?;

        let mut review = Review::new(draft);
        if let Some(attachment) = stored {
            review.hero_image_url = attachment.url;
            review.hero_image_path = attachment.path.to_string_lossy().into_owned();
        }

        let mut reviews = self.guard();
        reviews.insert(0, review.clone());
        self.store.save(&reviews)?;

        debug!(id = %review.id, "Inserted review");

        Ok(review)
    }

    /// Merge edited fields into an existing record, preserving its
    /// identifier, creation date, and image references.
    pub fn update(&self, id: &Uuid, draft: ReviewDraft) -> Result<Review, RepoError> {
        let mut reviews = self.guard();
        let review = reviews
            .iter_mut()
            .find(|r| r.id == *id)
            .ok_or(RepoError::NotFound(*id))?;

        review.apply(draft);
        let updated = review.clone();

        self.store.save(&reviews)?;

        debug!(id = %updated.id, "Updated review");

        Ok(updated)
    }

    /// Remove a record and persist the shrunken collection, then request
    /// best-effort cleanup of its attachment file. The record deletion is
    /// final whether or not the cleanup succeeds.
    pub fn delete(&self, id: &Uuid) -> Result<Review, RepoError> {
        let mut reviews = self.guard();
        let position = reviews
            .iter()
            .position(|r| r.id == *id)
            .ok_or(RepoError::NotFound(*id))?;

        let removed = reviews.remove(position);
        self.store.save(&reviews)?;

        if removed.has_attachment() {
            self.attachments.remove_detached(&removed.hero_image_path);
        }

        debug!(id = %removed.id, "Deleted review");

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::time::Duration;

    use super::*;
    use tempfile::tempdir;

    fn open_repo(root: &Path) -> ReviewRepository {
        let store = ReviewStore::open(root.join("data/reviews.json")).unwrap();
        let attachments =
            AttachmentStore::open(root.join("uploads"), "/uploads", 5 * 1024 * 1024).unwrap();
        ReviewRepository::open(store, attachments).unwrap()
    }

    fn draft(author: &str, title: &str, text: &str) -> ReviewDraft {
        ReviewDraft {
            author: Some(author.to_string()),
            title: Some(title.to_string()),
            text: Some(text.to_string()),
        }
    }

    fn image(name: &str) -> Upload {
        Upload {
            filename: name.to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, 0x50, 0x4E, 0x47],
        }
    }

    #[test]
    fn test_insert_update_delete_scenario() {
        let dir = tempdir().unwrap();
        let repo = open_repo(dir.path());

        let review = repo
            .insert(draft("Ann", "Great", "Loved it"), None)
            .unwrap();
        assert!(!review.id.is_nil());
        assert_eq!(review.hero_image_url, "");
        assert_eq!(repo.list_all()[0].id, review.id);

        let updated = repo
            .update(
                &review.id,
                ReviewDraft {
                    author: Some("Ann".to_string()),
                    title: Some("Updated".to_string()),
                    text: Some("Loved it".to_string()),
                },
            )
            .unwrap();
        assert_eq!(updated.title, "Updated");
        assert_eq!(repo.list_all()[0].title, "Updated");
        assert_eq!(repo.list_all()[0].id, review.id);

        let before = repo.list_all().len();
        repo.delete(&review.id).unwrap();
        assert_eq!(repo.list_all().len(), before - 1);
        assert!(repo.find_by_id(&review.id).is_none());
    }

    #[test]
    fn test_insert_prepends() {
        let dir = tempdir().unwrap();
        let repo = open_repo(dir.path());

        repo.insert(draft("Ann", "First", ""), None).unwrap();
        repo.insert(draft("Ben", "Second", ""), None).unwrap();

        let titles: Vec<String> = repo.list_all().into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["Second", "First"]);
    }

    #[test]
    fn test_update_preserves_id_date_and_image_fields() {
        let dir = tempdir().unwrap();
        let repo = open_repo(dir.path());

        let review = repo
            .insert(draft("Ann", "Great", "Loved it"), Some(image("hero.png")))
            .unwrap();
        assert!(review.has_attachment());

        let updated = repo
            .update(
                &review.id,
                ReviewDraft {
                    title: Some("X".to_string()),
                    ..ReviewDraft::default()
                },
            )
            .unwrap();

        assert_eq!(updated.id, review.id);
        assert_eq!(updated.date, review.date);
        assert_eq!(updated.hero_image_url, review.hero_image_url);
        assert_eq!(updated.hero_image_path, review.hero_image_path);
        assert_eq!(updated.title, "X");
    }

    #[test]
    fn test_update_missing_review_is_not_found() {
        let dir = tempdir().unwrap();
        let repo = open_repo(dir.path());

        let result = repo.update(&Uuid::new_v4(), ReviewDraft::default());

        assert!(matches!(result, Err(RepoError::NotFound(_))));
    }

    #[test]
    fn test_delete_is_terminal() {
        let dir = tempdir().unwrap();
        let repo = open_repo(dir.path());

        let review = repo.insert(draft("Ann", "Great", ""), None).unwrap();

        repo.delete(&review.id).unwrap();
        assert!(repo.find_by_id(&review.id).is_none());
        assert!(matches!(
            repo.delete(&review.id),
            Err(RepoError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_cleans_up_attachment_file() {
        let dir = tempdir().unwrap();
        let repo = open_repo(dir.path());

        let review = repo
            .insert(draft("Ann", "Great", ""), Some(image("hero.png")))
            .unwrap();
        let path = Path::new(&review.hero_image_path).to_path_buf();
        assert!(path.exists());

        repo.delete(&review.id).unwrap();

        for _ in 0..100 {
            if !path.exists() {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("attachment file was not cleaned up");
    }

    #[test]
    fn test_rejected_upload_creates_no_record() {
        let dir = tempdir().unwrap();
        let repo = open_repo(dir.path());

        let result = repo.insert(
            draft("Ann", "Great", ""),
            Some(Upload {
                filename: "notes.txt".to_string(),
                content_type: "text/plain".to_string(),
                bytes: vec![1, 2, 3],
            }),
        );

        assert!(matches!(result, Err(RepoError::Attachment(_))));
        assert!(repo.list_all().is_empty());
    }

    #[test]
    fn test_collection_survives_reopen() {
        let dir = tempdir().unwrap();

        let review = {
            let repo = open_repo(dir.path());
            repo.insert(draft("Ann", "Great", "Loved it"), None).unwrap()
        };

        let repo = open_repo(dir.path());
        let reviews = repo.list_all();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0], review);
    }

    #[test]
    fn test_open_backfills_legacy_records_and_persists() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("data/reviews.json");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(
            &file,
            r#"[{"author":"Old","title":"Legacy","text":"","date":"1/2/2020"}]"#,
        )
        .unwrap();

        let assigned = {
            let repo = open_repo(dir.path());
            let reviews = repo.list_all();
            assert!(!reviews[0].id.is_nil());
            reviews[0].id
        };

        // Identifier is stable across the next restart.
        let repo = open_repo(dir.path());
        assert_eq!(repo.list_all()[0].id, assigned);
    }
}
