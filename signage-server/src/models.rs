use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-item display time used when neither the item nor the request says otherwise.
pub const DEFAULT_DURATION_SECS: u32 = 30;

fn default_duration() -> u32 {
    DEFAULT_DURATION_SECS
}

fn default_active() -> bool {
    true
}

/// Distinguishes an absent key from an explicit `null` in a partial update.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// An empty playlist reference means "no playlist".
fn normalize_ref(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// The whole persisted document: three top-level collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub screens: Vec<Screen>,
    #[serde(default)]
    pub playlists: Vec<Playlist>,
    #[serde(default)]
    pub content: Vec<Content>,
}

// Screen models
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScreen {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub playlist_id: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScreen {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub playlist_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl NewScreen {
    pub fn into_screen(self, id: String, now: DateTime<Utc>) -> Screen {
        Screen {
            id,
            name: self.name,
            location: self.location.unwrap_or_default(),
            playlist_id: normalize_ref(self.playlist_id),
            is_active: self.is_active.unwrap_or(true),
            created_at: now,
            updated_at: None,
        }
    }
}

impl UpdateScreen {
    pub fn apply_to(self, screen: &mut Screen) {
        if let Some(name) = self.name {
            screen.name = name;
        }
        if let Some(location) = self.location {
            screen.location = location;
        }
        if let Some(playlist_id) = self.playlist_id {
            screen.playlist_id = normalize_ref(playlist_id);
        }
        if let Some(is_active) = self.is_active {
            screen.is_active = is_active;
        }
    }
}

// Playlist models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content_ids: Vec<String>,
    #[serde(default = "default_duration")]
    pub duration: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlaylist {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content_ids: Option<Vec<String>>,
    #[serde(default)]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlaylist {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

impl NewPlaylist {
    pub fn into_playlist(self, id: String, now: DateTime<Utc>) -> Playlist {
        Playlist {
            id,
            name: self.name,
            description: self.description.unwrap_or_default(),
            content_ids: self.content_ids.unwrap_or_default(),
            duration: positive_or_default(self.duration),
            created_at: now,
            updated_at: None,
        }
    }
}

impl UpdatePlaylist {
    pub fn apply_to(self, playlist: &mut Playlist) {
        if let Some(name) = self.name {
            playlist.name = name;
        }
        if let Some(description) = self.description {
            playlist.description = description;
        }
        if let Some(content_ids) = self.content_ids {
            playlist.content_ids = content_ids;
        }
        if let Some(duration) = self.duration.filter(|d| *d > 0) {
            playlist.duration = duration;
        }
    }
}

fn positive_or_default(duration: Option<u32>) -> u32 {
    duration.filter(|d| *d > 0).unwrap_or(DEFAULT_DURATION_SECS)
}

// Content models

/// Content type. Forms only accept the four known types; records written
/// by other tools may carry anything, which is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentKind {
    Image,
    Video,
    Text,
    Url,
    Other(String),
}

impl ContentKind {
    pub fn as_str(&self) -> &str {
        match self {
            ContentKind::Image => "image",
            ContentKind::Video => "video",
            ContentKind::Text => "text",
            ContentKind::Url => "url",
            ContentKind::Other(other) => other,
        }
    }
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
        match kind {
            ContentKind::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match ContentKind::from(s.trim().to_string()) {
            ContentKind::Other(other) => Err(format!("unknown content type '{}'", other)),
            known => Ok(known),
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
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Text fields of a content multipart form. Every field is optional here;
/// `create` decides which ones it requires.
#[derive(Debug, Clone, Default)]
pub struct ContentForm {
    pub name: Option<String>,
    pub kind: Option<ContentKind>,
    pub url: Option<String>,
    pub duration: Option<u32>,
}

impl ContentForm {
    /// Accepts a form field by name, ignoring fields the record does not own.
    pub fn set_field(&mut self, field: &str, value: String) -> Result<(), String> {
        match field {
            "name" => self.name = Some(value),
            "type" => self.kind = Some(value.parse()?),
            "url" => self.url = Some(value),
            // Non-numeric or zero durations count as "not given".
            "duration" => self.duration = value.trim().parse::<u32>().ok().filter(|d| *d > 0),
            _ => {}
        }
        Ok(())
    }

    pub fn apply_to(self, content: &mut Content) {
        if let Some(name) = self.name {
            content.name = name;
        }
        if let Some(kind) = self.kind {
            content.kind = kind;
        }
        if let Some(url) = self.url {
            content.url = url;
        }
        if let Some(duration) = self.duration {
            content.duration = duration;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Screen {
        NewScreen {
            name: "Lobby".to_string(),
            location: Some("Ground floor".to_string()),
            playlist_id: Some("p1".to_string()),
            is_active: None,
        }
        .into_screen("s1".to_string(), Utc::now())
    }

    #[test]
    fn test_new_screen_defaults() {
        let s = screen();
        assert!(s.is_active);
        assert_eq!(s.playlist_id.as_deref(), Some("p1"));
        assert!(s.updated_at.is_none());

        let blank = NewScreen {
            name: "Blank".to_string(),
            location: None,
            playlist_id: Some(String::new()),
            is_active: Some(false),
        }
        .into_screen("s2".to_string(), Utc::now());
        assert_eq!(blank.location, "");
        assert_eq!(blank.playlist_id, None);
        assert!(!blank.is_active);
    }

    #[test]
    fn test_update_screen_distinguishes_null_from_absent() {
        let mut s = screen();
        let keep: UpdateScreen = serde_json::from_str(r#"{"name":"Renamed"}"#).unwrap();
        keep.apply_to(&mut s);
        assert_eq!(s.name, "Renamed");
        assert_eq!(s.playlist_id.as_deref(), Some("p1"));

        let clear: UpdateScreen = serde_json::from_str(r#"{"playlistId":null}"#).unwrap();
        clear.apply_to(&mut s);
        assert_eq!(s.playlist_id, None);
        assert_eq!(s.location, "Ground floor");
    }

    #[test]
    fn test_playlist_duration_falls_back_to_default() {
        let p = NewPlaylist {
            name: "Morning".to_string(),
            description: None,
            content_ids: None,
            duration: Some(0),
        }
        .into_playlist("p1".to_string(), Utc::now());
        assert_eq!(p.duration, DEFAULT_DURATION_SECS);
        assert!(p.content_ids.is_empty());
        assert_eq!(p.description, "");
    }

    #[test]
    fn test_content_serializes_with_wire_names() {
        let content = Content {
            id: "c1".to_string(),
            name: "Logo".to_string(),
            kind: ContentKind::Image,
            url: "/uploads/logo.png".to_string(),
            duration: 5,
            file_name: Some("logo.png".to_string()),
            created_at: Utc::now(),
            updated_at: None,
        };
        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(value["type"], "image");
        assert_eq!(value["fileName"], "logo.png");
        assert!(value.get("updatedAt").is_none());
    }

    #[test]
    fn test_unknown_stored_type_is_kept() {
        let raw = r#"{"id":"c1","name":"Jingle","type":"audio","url":"x","createdAt":"2024-05-01T10:00:00Z"}"#;
        let content: Content = serde_json::from_str(raw).unwrap();
        assert_eq!(content.kind, ContentKind::Other("audio".to_string()));
        assert_eq!(content.duration, DEFAULT_DURATION_SECS);

        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(value["type"], "audio");
    }

    #[test]
    fn test_content_form_fields() {
        let mut form = ContentForm::default();
        form.set_field("type", "video".to_string()).unwrap();
        form.set_field("duration", "abc".to_string()).unwrap();
        form.set_field("createdAt", "ignored".to_string()).unwrap();
        assert_eq!(form.kind, Some(ContentKind::Video));
        assert_eq!(form.duration, None);
        assert!(form.set_field("type", "audio".to_string()).is_err());
    }
}
