use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub playlist_id: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content_ids: Vec<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Content type as sent by the server. Types this client does not know are
/// kept verbatim so the player can name them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentKind {
    Image,
    Video,
    Text,
    Url,
    Other(String),
}

impl From<String> for ContentKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "image" => ContentKind::Image,
            "video" => ContentKind::Video,
            "text" => ContentKind::Text,
            "url" => ContentKind::Url,
            _ => ContentKind::Other(value),
        }
    }
}

impl From<ContentKind> for String {
    fn from(kind: ContentKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Image => f.write_str("image"),
            ContentKind::Video => f.write_str("video"),
            ContentKind::Text => f.write_str("text"),
            ContentKind::Url => f.write_str("url"),
            ContentKind::Other(other) => f.write_str(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub file_name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Response of `GET /api/display/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayBundle {
    pub screen: Screen,
    pub playlist: Option<Playlist>,
    #[serde(default)]
    pub content: Vec<Content>,
}

// Request payloads

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScreen {
    pub name: String,
    pub location: String,
    pub playlist_id: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// `Some(None)` clears the assignment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlaylist {
    pub name: String,
    pub description: String,
    pub content_ids: Vec<String>,
    pub duration: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

/// Text fields of a content form; absent fields are not sent.
#[derive(Debug, Clone, Default)]
pub struct ContentFields {
    pub name: Option<String>,
    pub kind: Option<ContentKind>,
    pub url: Option<String>,
    pub duration: Option<u32>,
}

impl ContentFields {
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(name) = &self.name {
            pairs.push(("name", name.clone()));
        }
        if let Some(kind) = &self.kind {
            pairs.push(("type", kind.to_string()));
        }
        if let Some(url) = &self.url {
            pairs.push(("url", url.clone()));
        }
        if let Some(duration) = self.duration {
            pairs.push(("duration", duration.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kind_round_trips_verbatim() {
        let raw = r#"{"id":"c1","name":"Clip","type":"hologram","url":"x","createdAt":"2024-05-01T10:00:00Z"}"#;
        let content: Content = serde_json::from_str(raw).unwrap();
        assert_eq!(content.kind, ContentKind::Other("hologram".to_string()));
        assert_eq!(content.duration, None);

        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(value["type"], "hologram");
    }

    #[test]
    fn test_screen_changes_serialize_explicit_null() {
        let clear = ScreenChanges {
            playlist_id: Some(None),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&clear).unwrap(),
            serde_json::json!({ "playlistId": null })
        );
        assert_eq!(
            serde_json::to_value(ScreenChanges::default()).unwrap(),
            serde_json::json!({})
        );
    }

    #[test]
    fn test_display_bundle_with_null_playlist() {
        let raw = r#"{
            "screen": {"id":"s1","name":"Lobby","location":"","playlistId":null,"isActive":true,"createdAt":"2024-05-01T10:00:00Z"},
            "playlist": null,
            "content": []
        }"#;
        let bundle: DisplayBundle = serde_json::from_str(raw).unwrap();
        assert!(bundle.playlist.is_none());
        assert!(bundle.content.is_empty());
    }

    #[test]
    fn test_screen_without_active_flag_is_active() {
        let raw = r#"{"id":"s1","name":"Lobby","createdAt":"2024-05-01T10:00:00Z"}"#;
        let screen: Screen = serde_json::from_str(raw).unwrap();
        assert!(screen.is_active);
        assert_eq!(screen.playlist_id, None);
    }

    #[test]
    fn test_content_fields_only_send_given_values() {
        let fields = ContentFields {
            kind: Some(ContentKind::Video),
            duration: Some(15),
            ..Default::default()
        };
        assert_eq!(
            fields.pairs(),
            vec![("type", "video".to_string()), ("duration", "15".to_string())]
        );
    }
}
