use crate::api::DeleteResponse;
use crate::error::{ApiContext, ApiError};
use crate::models::{NewPlaylist, Playlist, UpdatePlaylist};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

pub async fn list_playlists(
    State(state): State<AppState>,
) -> Result<Json<Vec<Playlist>>, ApiError> {
    let playlists = state
        .playlists
        .list()
        .await
        .api_context("Failed to fetch playlists")?;
    Ok(Json(playlists))
}

pub async fn get_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> Result<Json<Playlist>, ApiError> {
    let playlist = state
        .playlists
        .get(&playlist_id)
        .await
        .api_context("Failed to fetch playlist")?;
    Ok(Json(playlist))
}

pub async fn create_playlist(
    State(state): State<AppState>,
    payload: Result<Json<NewPlaylist>, JsonRejection>,
) -> Result<Json<Playlist>, ApiError> {
    let Json(new_playlist) =
        payload.map_err(|e| ApiError::internal(e, "Failed to create playlist"))?;

    let playlist = state
        .playlists
        .create(new_playlist)
        .await
        .api_context("Failed to create playlist")?;

    tracing::info!(
        "Created playlist '{}' ({}) with {} item(s)",
        playlist.name,
        playlist.id,
        playlist.content_ids.len()
    );
    Ok(Json(playlist))
}

pub async fn update_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
    payload: Result<Json<UpdatePlaylist>, JsonRejection>,
) -> Result<Json<Playlist>, ApiError> {
    let Json(updates) = payload.map_err(|e| ApiError::internal(e, "Failed to update playlist"))?;

    let playlist = state
        .playlists
        .update(&playlist_id, updates)
        .await
        .api_context("Failed to update playlist")?;
    Ok(Json(playlist))
}

pub async fn delete_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    // Screens still pointing here resolve to "no playlist".
    state
        .playlists
        .delete(&playlist_id)
        .await
        .api_context("Failed to delete playlist")?;

    tracing::info!("Deleted playlist {}", playlist_id);
    Ok(DeleteResponse::ok())
}
