pub mod content_api;
pub mod display_api;
pub mod playlists_api;
pub mod screens_api;

use crate::AppState;
use axum::{
    routing::get,
    Json, Router,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

impl DeleteResponse {
    pub fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        // Screens
        .route(
            "/screens",
            get(screens_api::list_screens).post(screens_api::create_screen),
        )
        .route(
            "/screens/:id",
            get(screens_api::get_screen)
                .patch(screens_api::update_screen)
                .delete(screens_api::delete_screen),
        )
        // Playlists
        .route(
            "/playlists",
            get(playlists_api::list_playlists).post(playlists_api::create_playlist),
        )
        .route(
            "/playlists/:id",
            get(playlists_api::get_playlist)
                .patch(playlists_api::update_playlist)
                .delete(playlists_api::delete_playlist),
        )
        // Content
        .route(
            "/content",
            get(content_api::list_content).post(content_api::create_content),
        )
        .route(
            "/content/:id",
            get(content_api::get_content)
                .patch(content_api::update_content)
                .delete(content_api::delete_content),
        )
        // Display (public, polled by screens)
        .route("/display/:id", get(display_api::get_display))
}
