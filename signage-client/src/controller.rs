use crate::api_client::{ApiClient, ClientError, FilePart};
use crate::models::{
    Content, ContentFields, NewPlaylist, NewScreen, Playlist, PlaylistChanges, Screen,
    ScreenChanges,
};
use std::future::Future;

/// Everything the admin console knows about the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub screens: Vec<Screen>,
    pub playlists: Vec<Playlist>,
    pub content: Vec<Content>,
    pub loading: bool,
    pub error: Option<String>,
}

impl AppState {
    pub fn active_screens(&self) -> usize {
        self.screens.iter().filter(|s| s.is_active).count()
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    SetLoading(bool),
    SetError(Option<String>),
    SetScreens(Vec<Screen>),
    SetPlaylists(Vec<Playlist>),
    SetContent(Vec<Content>),
    AddScreen(Screen),
    UpdateScreen(Screen),
    DeleteScreen(String),
    AddPlaylist(Playlist),
    UpdatePlaylist(Playlist),
    DeletePlaylist(String),
    AddContent(Content),
    UpdateContent(Content),
    DeleteContent(String),
}

fn replace_by_id<T>(items: &mut [T], updated: T, id: impl Fn(&T) -> &str) {
    if let Some(pos) = items.iter().position(|item| id(item) == id(&updated)) {
        items[pos] = updated;
    }
}

pub fn reduce(state: &mut AppState, action: Action) {
    match action {
        Action::SetLoading(loading) => state.loading = loading,
        Action::SetError(error) => state.error = error,
        Action::SetScreens(screens) => state.screens = screens,
        Action::SetPlaylists(playlists) => state.playlists = playlists,
        Action::SetContent(content) => state.content = content,
        Action::AddScreen(screen) => state.screens.push(screen),
        Action::UpdateScreen(screen) => replace_by_id(&mut state.screens, screen, |s| &s.id),
        Action::DeleteScreen(id) => state.screens.retain(|s| s.id != id),
        Action::AddPlaylist(playlist) => state.playlists.push(playlist),
        Action::UpdatePlaylist(playlist) => {
            replace_by_id(&mut state.playlists, playlist, |p| &p.id)
        }
        Action::DeletePlaylist(id) => state.playlists.retain(|p| p.id != id),
        Action::AddContent(item) => state.content.push(item),
        Action::UpdateContent(item) => replace_by_id(&mut state.content, item, |c| &c.id),
        Action::DeleteContent(id) => state.content.retain(|c| c.id != id),
    }
}

/// Runs one API call with the loading flag raised. A failure lands in the
/// error slot as the server's message, or `fallback` when it sent none.
async fn track<T, F>(state: &mut AppState, fallback: &str, call: F) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    reduce(state, Action::SetLoading(true));
    let result = call.await;

    if let Err(e) = &result {
        tracing::error!("{}: {}", fallback, e);
        let message = e.server_message().unwrap_or(fallback).to_string();
        reduce(state, Action::SetError(Some(message)));
    }

    reduce(state, Action::SetLoading(false));
    result
}

/// Admin controller: the only owner of `AppState`.
pub struct Console {
    api: ApiClient,
    state: AppState,
}

impl Console {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: AppState::default(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn dismiss_error(&mut self) {
        reduce(&mut self.state, Action::SetError(None));
    }

    /// Loads all three collections, continuing past individual failures.
    pub async fn refresh(&mut self) {
        let _ = self.fetch_screens().await;
        let _ = self.fetch_playlists().await;
        let _ = self.fetch_content().await;
    }

    // Screens

    pub async fn fetch_screens(&mut self) -> Result<(), ClientError> {
        let screens = track(
            &mut self.state,
            "Failed to fetch screens",
            self.api.list_screens(),
        )
        .await?;
        reduce(&mut self.state, Action::SetScreens(screens));
        Ok(())
    }

    pub async fn get_screen(&mut self, id: &str) -> Result<Screen, ClientError> {
        let screen = track(
            &mut self.state,
            "Failed to fetch screen",
            self.api.get_screen(id),
        )
        .await?;
        reduce(&mut self.state, Action::UpdateScreen(screen.clone()));
        Ok(screen)
    }

    pub async fn create_screen(&mut self, screen: &NewScreen) -> Result<Screen, ClientError> {
        let created = track(
            &mut self.state,
            "Failed to create screen",
            self.api.create_screen(screen),
        )
        .await?;
        reduce(&mut self.state, Action::AddScreen(created.clone()));
        Ok(created)
    }

    pub async fn update_screen(
        &mut self,
        id: &str,
        changes: &ScreenChanges,
    ) -> Result<Screen, ClientError> {
        let updated = track(
            &mut self.state,
            "Failed to update screen",
            self.api.update_screen(id, changes),
        )
        .await?;
        reduce(&mut self.state, Action::UpdateScreen(updated.clone()));
        Ok(updated)
    }

    pub async fn delete_screen(&mut self, id: &str) -> Result<(), ClientError> {
        track(
            &mut self.state,
            "Failed to delete screen",
            self.api.delete_screen(id),
        )
        .await?;
        reduce(&mut self.state, Action::DeleteScreen(id.to_string()));
        Ok(())
    }

    // Playlists

    pub async fn fetch_playlists(&mut self) -> Result<(), ClientError> {
        let playlists = track(
            &mut self.state,
            "Failed to fetch playlists",
            self.api.list_playlists(),
        )
        .await?;
        reduce(&mut self.state, Action::SetPlaylists(playlists));
        Ok(())
    }

    pub async fn get_playlist(&mut self, id: &str) -> Result<Playlist, ClientError> {
        let playlist = track(
            &mut self.state,
            "Failed to fetch playlist",
            self.api.get_playlist(id),
        )
        .await?;
        reduce(&mut self.state, Action::UpdatePlaylist(playlist.clone()));
        Ok(playlist)
    }

    pub async fn create_playlist(&mut self, playlist: &NewPlaylist) -> Result<Playlist, ClientError> {
        let created = track(
            &mut self.state,
            "Failed to create playlist",
            self.api.create_playlist(playlist),
        )
        .await?;
        reduce(&mut self.state, Action::AddPlaylist(created.clone()));
        Ok(created)
    }

    pub async fn update_playlist(
        &mut self,
        id: &str,
        changes: &PlaylistChanges,
    ) -> Result<Playlist, ClientError> {
        let updated = track(
            &mut self.state,
            "Failed to update playlist",
            self.api.update_playlist(id, changes),
        )
        .await?;
        reduce(&mut self.state, Action::UpdatePlaylist(updated.clone()));
        Ok(updated)
    }

    pub async fn delete_playlist(&mut self, id: &str) -> Result<(), ClientError> {
        track(
            &mut self.state,
            "Failed to delete playlist",
            self.api.delete_playlist(id),
        )
        .await?;
        reduce(&mut self.state, Action::DeletePlaylist(id.to_string()));
        Ok(())
    }

    // Content

    pub async fn fetch_content(&mut self) -> Result<(), ClientError> {
        let items = track(
            &mut self.state,
            "Failed to fetch content",
            self.api.list_content(),
        )
        .await?;
        reduce(&mut self.state, Action::SetContent(items));
        Ok(())
    }

    pub async fn get_content(&mut self, id: &str) -> Result<Content, ClientError> {
        let item = track(
            &mut self.state,
            "Failed to fetch content",
            self.api.get_content(id),
        )
        .await?;
        reduce(&mut self.state, Action::UpdateContent(item.clone()));
        Ok(item)
    }

    pub async fn create_content(
        &mut self,
        fields: &ContentFields,
        file: Option<FilePart>,
    ) -> Result<Content, ClientError> {
        let created = track(
            &mut self.state,
            "Failed to create content",
            self.api.create_content(fields, file),
        )
        .await?;
        reduce(&mut self.state, Action::AddContent(created.clone()));
        Ok(created)
    }

    pub async fn update_content(
        &mut self,
        id: &str,
        fields: &ContentFields,
        file: Option<FilePart>,
    ) -> Result<Content, ClientError> {
        let updated = track(
            &mut self.state,
            "Failed to update content",
            self.api.update_content(id, fields, file),
        )
        .await?;
        reduce(&mut self.state, Action::UpdateContent(updated.clone()));
        Ok(updated)
    }

    pub async fn delete_content(&mut self, id: &str) -> Result<(), ClientError> {
        track(
            &mut self.state,
            "Failed to delete content",
            self.api.delete_content(id),
        )
        .await?;
        reduce(&mut self.state, Action::DeleteContent(id.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    fn screen(id: &str, name: &str, active: bool) -> Screen {
        Screen {
            id: id.to_string(),
            name: name.to_string(),
            location: String::new(),
            playlist_id: None,
            is_active: active,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_reduce_add_update_delete_by_id() {
        let mut state = AppState::default();
        reduce(&mut state, Action::AddScreen(screen("s1", "Lobby", true)));
        reduce(&mut state, Action::AddScreen(screen("s2", "Cafe", false)));
        assert_eq!(state.active_screens(), 1);

        reduce(&mut state, Action::UpdateScreen(screen("s2", "Cafeteria", true)));
        assert_eq!(state.screens[1].name, "Cafeteria");
        assert_eq!(state.active_screens(), 2);

        // Unknown ids are ignored.
        reduce(&mut state, Action::UpdateScreen(screen("s9", "Ghost", true)));
        assert_eq!(state.screens.len(), 2);

        reduce(&mut state, Action::DeleteScreen("s1".to_string()));
        assert_eq!(state.screens.len(), 1);
        assert_eq!(state.screens[0].id, "s2");
    }

    #[test]
    fn test_reduce_flags() {
        let mut state = AppState::default();
        reduce(&mut state, Action::SetLoading(true));
        reduce(&mut state, Action::SetError(Some("boom".to_string())));
        assert!(state.loading);
        assert_eq!(state.error.as_deref(), Some("boom"));

        reduce(&mut state, Action::SetError(None));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_failed_call_fills_error_slot_and_clears_loading() {
        // Nothing listens on port 1.
        let api = ApiClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let mut console = Console::new(api);

        assert!(console.fetch_screens().await.is_err());
        assert!(!console.state().loading);
        assert_eq!(
            console.state().error.as_deref(),
            Some("Failed to fetch screens")
        );

        assert!(console.delete_content("c1").await.is_err());
        assert_eq!(
            console.state().error.as_deref(),
            Some("Failed to delete content")
        );

        console.dismiss_error();
        assert!(console.state().error.is_none());
    }

    #[tokio::test]
    async fn test_server_message_wins_over_fallback() {
        let mut state = AppState::default();
        let result: Result<(), ClientError> = track(&mut state, "Failed to fetch screens", async {
            Err(ClientError::NotFound("Screen not found".to_string()))
        })
        .await;

        assert!(result.is_err());
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Screen not found"));
    }
}
