use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity;

/// Author shown when a submission leaves the field blank
pub const DEFAULT_AUTHOR: &str = "Anonymous";

/// Title shown when a submission leaves the field blank
pub const DEFAULT_TITLE: &str = "Untitled";

/// A single user-submitted review record
///
/// Serialized field names stay camelCase so the on-disk collection matches
/// documents written by earlier versions of the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Review {
    /// Unique identifier, assigned once at creation. Nil marks a legacy
    /// record awaiting backfill.
    pub id: Uuid,
    pub author: String,
    pub title: String,
    pub text: String,
    /// Creation date, rendered once as M/D/YYYY; edits never touch it.
    pub date: String,
    /// Public URL of the hero image, empty if none
    pub hero_image_url: String,
    /// On-disk location paired with the URL, used only for cleanup
    pub hero_image_path: String,
}

impl Default for Review {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            author: String::new(),
            title: String::new(),
            text: String::new(),
            date: String::new(),
            hero_image_url: String::new(),
            hero_image_path: String::new(),
        }
    }
}

/// Submitted or edited review fields, prior to normalization
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewDraft {
    pub author: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
}

impl Review {
    /// Build a new record from a draft: assign an identifier, normalize the
    /// text fields, and stamp the creation date.
    pub fn new(draft: ReviewDraft) -> Self {
        let mut review = Self {
            id: identity::assign(),
            date: Local::now().format("%-m/%-d/%Y").to_string(),
            ..Self::default()
        };
        review.apply(draft);
        review
    }

    /// Overwrite the editable fields from a draft, preserving `id`, `date`,
    /// and both image references.
    pub fn apply(&mut self, draft: ReviewDraft) {
        self.author = normalize(draft.author, DEFAULT_AUTHOR);
        self.title = normalize(draft.title, DEFAULT_TITLE);
        self.text = normalize(draft.text, "");
    }

    pub fn has_attachment(&self) -> bool {
        !self.hero_image_path.is_empty()
    }
}

/// Trim a submitted value, substituting the placeholder when the field is
/// absent or blank.
fn normalize(value: Option<String>, placeholder: &str) -> String {
    match value {
        Some(v) => {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                placeholder.to_string()
            } else {
                trimmed.to_string()
            }
        }
        None => placeholder.to_string(),
    }
}
