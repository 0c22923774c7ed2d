use crate::api::DeleteResponse;
use crate::error::{ApiContext, ApiError};
use crate::models::{NewScreen, Screen, UpdateScreen};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

pub async fn list_screens(State(state): State<AppState>) -> Result<Json<Vec<Screen>>, ApiError> {
    let screens = state
        .screens
        .list()
        .await
        .api_context("Failed to fetch screens")?;
    Ok(Json(screens))
}

pub async fn get_screen(
    State(state): State<AppState>,
    Path(screen_id): Path<String>,
) -> Result<Json<Screen>, ApiError> {
    let screen = state
        .screens
        .get(&screen_id)
        .await
        .api_context("Failed to fetch screen")?;
    Ok(Json(screen))
}

pub async fn create_screen(
    State(state): State<AppState>,
    payload: Result<Json<NewScreen>, JsonRejection>,
) -> Result<Json<Screen>, ApiError> {
    let Json(new_screen) = payload.map_err(|e| ApiError::internal(e, "Failed to create screen"))?;

    let screen = state
        .screens
        .create(new_screen)
        .await
        .api_context("Failed to create screen")?;

    tracing::info!("Created screen '{}' ({})", screen.name, screen.id);
    Ok(Json(screen))
}

pub async fn update_screen(
    State(state): State<AppState>,
    Path(screen_id): Path<String>,
    payload: Result<Json<UpdateScreen>, JsonRejection>,
) -> Result<Json<Screen>, ApiError> {
    let Json(updates) = payload.map_err(|e| ApiError::internal(e, "Failed to update screen"))?;

    let screen = state
        .screens
        .update(&screen_id, updates)
        .await
        .api_context("Failed to update screen")?;
    Ok(Json(screen))
}

pub async fn delete_screen(
    State(state): State<AppState>,
    Path(screen_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state
        .screens
        .delete(&screen_id)
        .await
        .api_context("Failed to delete screen")?;

    tracing::info!("Deleted screen {}", screen_id);
    Ok(DeleteResponse::ok())
}
