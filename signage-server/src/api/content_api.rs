use crate::api::DeleteResponse;
use crate::error::{ApiContext, ApiError};
use crate::media::Upload;
use crate::models::{Content, ContentForm};
use crate::AppState;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    Json,
};

#[derive(Debug, thiserror::Error)]
enum FormError {
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Invalid field '{field}': {reason}")]
    Field { field: String, reason: String },
}

/// Splits a content form into its text fields and the optional `file` part.
async fn read_content_form(
    mut multipart: Multipart,
) -> Result<(ContentForm, Option<Upload>), FormError> {
    let mut form = ContentForm::default();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name == "file" {
            let original_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?;

            // Browsers send an empty part when no file was picked.
            if bytes.is_empty() {
                continue;
            }

            upload = Some(Upload {
                original_name,
                content_type,
                bytes,
            });
        } else {
            let value = field.text().await?;
            form.set_field(&field_name, value)
                .map_err(|reason| FormError::Field {
                    field: field_name,
                    reason,
                })?;
        }
    }

    Ok((form, upload))
}

pub async fn list_content(State(state): State<AppState>) -> Result<Json<Vec<Content>>, ApiError> {
    let items = state
        .content
        .list()
        .await
        .api_context("Failed to fetch content")?;
    Ok(Json(items))
}

pub async fn get_content(
    State(state): State<AppState>,
    Path(content_id): Path<String>,
) -> Result<Json<Content>, ApiError> {
    let item = state
        .content
        .get(&content_id)
        .await
        .api_context("Failed to fetch content")?;
    Ok(Json(item))
}

pub async fn create_content(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Content>, ApiError> {
    const CONTEXT: &str = "Failed to create content";

    let multipart = multipart.map_err(|e| ApiError::internal(e, CONTEXT))?;
    let (form, upload) = read_content_form(multipart)
        .await
        .map_err(|e| ApiError::internal(e, CONTEXT))?;

    let item = state
        .content
        .create(form, upload)
        .await
        .api_context(CONTEXT)?;

    tracing::info!(
        "Created {} content '{}' ({})",
        item.kind,
        item.name,
        item.id
    );
    Ok(Json(item))
}

pub async fn update_content(
    State(state): State<AppState>,
    Path(content_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Content>, ApiError> {
    const CONTEXT: &str = "Failed to update content";

    let multipart = multipart.map_err(|e| ApiError::internal(e, CONTEXT))?;
    let (form, upload) = read_content_form(multipart)
        .await
        .map_err(|e| ApiError::internal(e, CONTEXT))?;

    let item = state
        .content
        .update(&content_id, form, upload)
        .await
        .api_context(CONTEXT)?;
    Ok(Json(item))
}

pub async fn delete_content(
    State(state): State<AppState>,
    Path(content_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    // Playlists keep the id; the resolver skips it from now on.
    state
        .content
        .delete(&content_id)
        .await
        .api_context("Failed to delete content")?;

    tracing::info!("Deleted content {}", content_id);
    Ok(DeleteResponse::ok())
}
