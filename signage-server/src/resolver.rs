use crate::models::{Content, Database, Playlist, Screen};
use crate::store::{JsonStore, StoreError};
use serde::Serialize;
use std::sync::Arc;

/// Everything a screen needs to render its loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayBundle {
    pub screen: Screen,
    pub playlist: Option<Playlist>,
    pub content: Vec<Content>,
}

/// Joins screen → playlist → content within one snapshot of the store.
///
/// Dangling references are skipped: a missing playlist yields `playlist: None`
/// and missing content ids are dropped from the list. Duplicate ids repeat.
pub fn resolve_in(db: &Database, screen_id: &str) -> Option<DisplayBundle> {
    let screen = db.screens.iter().find(|s| s.id == screen_id)?.clone();

    let playlist = screen
        .playlist_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .and_then(|id| db.playlists.iter().find(|p| p.id == id))
        .cloned();

    let content = playlist
        .as_ref()
        .map(|p| {
            p.content_ids
                .iter()
                .filter_map(|id| db.content.iter().find(|c| &c.id == id))
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    Some(DisplayBundle {
        screen,
        playlist,
        content,
    })
}

#[derive(Clone)]
pub struct DisplayResolver {
    store: Arc<JsonStore>,
}

impl DisplayResolver {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, screen_id: &str) -> Result<DisplayBundle, StoreError> {
        let db = self.store.read().await?;
        let bundle = resolve_in(&db, screen_id).ok_or(StoreError::NotFound("Screen"))?;

        tracing::debug!(
            "Resolved screen {} to {} content item(s)",
            screen_id,
            bundle.content.len()
        );
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentKind, DEFAULT_DURATION_SECS};
    use chrono::Utc;

    fn screen(id: &str, playlist_id: Option<&str>) -> Screen {
        Screen {
            id: id.to_string(),
            name: format!("Screen {}", id),
            location: String::new(),
            playlist_id: playlist_id.map(str::to_string),
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn playlist(id: &str, content_ids: &[&str]) -> Playlist {
        Playlist {
            id: id.to_string(),
            name: format!("Playlist {}", id),
            description: String::new(),
            content_ids: content_ids.iter().map(|c| c.to_string()).collect(),
            duration: DEFAULT_DURATION_SECS,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn content(id: &str) -> Content {
        Content {
            id: id.to_string(),
            name: format!("Content {}", id),
            kind: ContentKind::Text,
            url: "hello".to_string(),
            duration: 10,
            file_name: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_unknown_screen() {
        assert!(resolve_in(&Database::default(), "missing").is_none());
    }

    #[test]
    fn test_screen_without_playlist() {
        let db = Database {
            screens: vec![screen("s1", None), screen("s2", Some(""))],
            ..Default::default()
        };

        for id in ["s1", "s2"] {
            let bundle = resolve_in(&db, id).unwrap();
            assert_eq!(bundle.screen.id, id);
            assert!(bundle.playlist.is_none());
            assert!(bundle.content.is_empty());
        }
    }

    #[test]
    fn test_dangling_playlist() {
        let db = Database {
            screens: vec![screen("s1", Some("gone"))],
            ..Default::default()
        };
        let bundle = resolve_in(&db, "s1").unwrap();
        assert!(bundle.playlist.is_none());
        assert!(bundle.content.is_empty());
    }

    #[test]
    fn test_missing_content_is_skipped_in_order() {
        let db = Database {
            screens: vec![screen("s1", Some("p1"))],
            playlists: vec![playlist("p1", &["c2", "missing", "c1"])],
            content: vec![content("c1"), content("c2")],
        };

        let bundle = resolve_in(&db, "s1").unwrap();
        assert_eq!(bundle.playlist.as_ref().unwrap().id, "p1");
        let ids: Vec<_> = bundle.content.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
    }

    #[test]
    fn test_duplicates_repeat() {
        let db = Database {
            screens: vec![screen("s1", Some("p1"))],
            playlists: vec![playlist("p1", &["c1", "c1"])],
            content: vec![content("c1")],
        };
        assert_eq!(resolve_in(&db, "s1").unwrap().content.len(), 2);
    }

    #[test]
    fn test_bundle_serializes_null_playlist() {
        let db = Database {
            screens: vec![screen("s1", None)],
            ..Default::default()
        };
        let value = serde_json::to_value(resolve_in(&db, "s1").unwrap()).unwrap();
        assert!(value["playlist"].is_null());
        assert_eq!(value["content"], serde_json::json!([]));
        assert_eq!(value["screen"]["id"], "s1");
    }
}
