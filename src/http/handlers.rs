use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use super::AppState;
use crate::attachments::Upload;
use crate::error::{AttachmentError, RepoError};
use crate::models::{Review, ReviewDraft};

/// HTTP-facing error mapping domain failures onto status codes
pub enum ApiError {
    Repo(RepoError),
    BadRequest(String),
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        Self::Repo(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Repo(RepoError::NotFound(id)) => {
                (StatusCode::NOT_FOUND, format!("no review with id {id}"))
            }
            ApiError::Repo(RepoError::Attachment(err @ AttachmentError::Io { .. })) => {
                error!(error = %err, "Failed to store attachment");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to store attachment".to_string(),
                )
            }
            ApiError::Repo(RepoError::Attachment(err)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            ApiError::Repo(RepoError::Persistence(err)) => {
                error!(error = %err, "Failed to persist reviews");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to persist review".to_string(),
                )
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn list(State(state): State<AppState>) -> Json<Vec<Review>> {
    Json(state.repo.list_all())
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Review>, ApiError> {
    state
        .repo
        .find_by_id(&id)
        .map(Json)
        .ok_or_else(|| RepoError::NotFound(id).into())
}

/// Create a review from a multipart form: `author`, `title`, `text`, and an
/// optional `heroImage` file part.
pub async fn submit(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let mut draft = ReviewDraft::default();
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "author" => draft.author = Some(read_text(field).await?),
            "title" => draft.title = Some(read_text(field).await?),
            "text" => draft.text = Some(read_text(field).await?),
            "heroImage" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::BadRequest(err.to_string()))?;

                // Browsers submit an empty file part when no image was chosen.
                if !bytes.is_empty() {
                    upload = Some(Upload {
                        filename,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    let review = state.repo.insert(draft, upload)?;

    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<ReviewDraft>,
) -> Result<Json<Review>, ApiError> {
    Ok(Json(state.repo.update(&id, draft)?))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Review>, ApiError> {
    Ok(Json(state.repo.delete(&id)?))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))
}
