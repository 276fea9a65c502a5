pub mod attachments;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod models;
pub mod repository;
pub mod store;

pub use attachments::{AttachmentStore, StoredAttachment, Upload};
pub use config::Config;
pub use error::{AttachmentError, RepoError, StoreError};
pub use models::{Review, ReviewDraft};
pub use repository::ReviewRepository;
pub use store::ReviewStore;
