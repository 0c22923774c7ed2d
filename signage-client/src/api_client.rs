use crate::models::{
    Content, ContentFields, DisplayBundle, NewPlaylist, NewScreen, Playlist, PlaylistChanges,
    Screen, ScreenChanges,
};
use reqwest::{multipart, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    NotFound(String),
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("cannot read upload: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid server URL '{0}'")]
    InvalidUrl(String),
}

impl ClientError {
    /// The `{error}` message the server sent, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::NotFound(message) | ClientError::Server { message, .. } => {
                Some(message)
            }
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct DeleteBody {
    #[allow(dead_code)]
    success: bool,
}

/// File attached to a content create/update.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub async fn read(path: &Path) -> Result<Self, ClientError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self {
            file_name,
            mime_type,
            bytes,
        })
    }
}

/// HTTP client for the signage REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    origin: String,
}

impl ApiClient {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let origin = server_url.trim_end_matches('/').to_string();
        let base = Url::parse(&origin)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ClientError::InvalidUrl(server_url.to_string()))?;

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base, origin })
    }

    /// Scheme, host and port of the server; stored-file URLs are relative to it.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// `<origin>/api/<segments...>`, each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // `new` rejects URLs that cannot take path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string(),
        };

        if status == StatusCode::NOT_FOUND {
            Err(ClientError::NotFound(message))
        } else {
            Err(ClientError::Server {
                status: status.as_u16(),
                message,
            })
        }
    }

    fn content_form(fields: &ContentFields, file: Option<FilePart>) -> Result<multipart::Form, ClientError> {
        let mut form = multipart::Form::new();
        for (key, value) in fields.pairs() {
            form = form.text(key, value);
        }
        if let Some(file) = file {
            let part = multipart::Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.mime_type)?;
            form = form.part("file", part);
        }
        Ok(form)
    }

    // Screens

    pub async fn list_screens(&self) -> Result<Vec<Screen>, ClientError> {
        self.send(self.http.get(self.url(&["screens"]))).await
    }

    pub async fn get_screen(&self, id: &str) -> Result<Screen, ClientError> {
        self.send(self.http.get(self.url(&["screens", id])))
            .await
    }

    pub async fn create_screen(&self, screen: &NewScreen) -> Result<Screen, ClientError> {
        self.send(self.http.post(self.url(&["screens"])).json(screen))
            .await
    }

    pub async fn update_screen(
        &self,
        id: &str,
        changes: &ScreenChanges,
    ) -> Result<Screen, ClientError> {
        self.send(
            self.http
                .patch(self.url(&["screens", id]))
                .json(changes),
        )
        .await
    }

    pub async fn delete_screen(&self, id: &str) -> Result<(), ClientError> {
        self.send::<DeleteBody>(self.http.delete(self.url(&["screens", id])))
            .await
            .map(|_| ())
    }

    // Playlists

    pub async fn list_playlists(&self) -> Result<Vec<Playlist>, ClientError> {
        self.send(self.http.get(self.url(&["playlists"]))).await
    }

    pub async fn get_playlist(&self, id: &str) -> Result<Playlist, ClientError> {
        self.send(self.http.get(self.url(&["playlists", id])))
            .await
    }

    pub async fn create_playlist(&self, playlist: &NewPlaylist) -> Result<Playlist, ClientError> {
        self.send(self.http.post(self.url(&["playlists"])).json(playlist))
            .await
    }

    pub async fn update_playlist(
        &self,
        id: &str,
        changes: &PlaylistChanges,
    ) -> Result<Playlist, ClientError> {
        self.send(
            self.http
                .patch(self.url(&["playlists", id]))
                .json(changes),
        )
        .await
    }

    pub async fn delete_playlist(&self, id: &str) -> Result<(), ClientError> {
        self.send::<DeleteBody>(self.http.delete(self.url(&["playlists", id])))
            .await
            .map(|_| ())
    }

    // Content

    pub async fn list_content(&self) -> Result<Vec<Content>, ClientError> {
        self.send(self.http.get(self.url(&["content"]))).await
    }

    pub async fn get_content(&self, id: &str) -> Result<Content, ClientError> {
        self.send(self.http.get(self.url(&["content", id])))
            .await
    }

    pub async fn create_content(
        &self,
        fields: &ContentFields,
        file: Option<FilePart>,
    ) -> Result<Content, ClientError> {
        let form = Self::content_form(fields, file)?;
        self.send(self.http.post(self.url(&["content"])).multipart(form))
            .await
    }

    pub async fn update_content(
        &self,
        id: &str,
        fields: &ContentFields,
        file: Option<FilePart>,
    ) -> Result<Content, ClientError> {
        let form = Self::content_form(fields, file)?;
        self.send(
            self.http
                .patch(self.url(&["content", id]))
                .multipart(form),
        )
        .await
    }

    pub async fn delete_content(&self, id: &str) -> Result<(), ClientError> {
        self.send::<DeleteBody>(self.http.delete(self.url(&["content", id])))
            .await
            .map(|_| ())
    }

    // Display

    pub async fn get_display(&self, screen_id: &str) -> Result<DisplayBundle, ClientError> {
        self.send(self.http.get(self.url(&["display", screen_id])))
            .await
    }
}
