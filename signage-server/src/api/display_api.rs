use crate::error::{ApiContext, ApiError};
use crate::resolver::DisplayBundle;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};

pub async fn get_display(
    State(state): State<AppState>,
    Path(screen_id): Path<String>,
) -> Result<Json<DisplayBundle>, ApiError> {
    let bundle = state
        .resolver
        .resolve(&screen_id)
        .await
        .api_context("Failed to fetch display data")?;
    Ok(Json(bundle))
}
