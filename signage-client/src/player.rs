use crate::models::{Content, DisplayBundle};
use std::time::Duration;

/// Why the last poll produced nothing to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayFailure {
    ScreenNotFound,
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerState {
    Loading,
    Playing { index: usize },
    Empty,
    Error(DisplayFailure),
}

/// Playback state for one screen. Owned by the display task; every
/// transition goes through `apply_poll` or `advance`.
#[derive(Debug)]
pub struct Player {
    bundle: Option<DisplayBundle>,
    failure: Option<DisplayFailure>,
    index: usize,
    last_count: usize,
    default_item: Duration,
}

/// What the screen currently shows; two equal views render identically.
#[derive(Debug, PartialEq)]
enum View {
    Loading,
    Item(usize, Content),
    Empty(String),
    Error(DisplayFailure),
}

impl Player {
    pub fn new(default_item: Duration) -> Self {
        Self {
            bundle: None,
            failure: None,
            index: 0,
            last_count: 0,
            default_item,
        }
    }

    pub fn state(&self) -> PlayerState {
        if let Some(failure) = &self.failure {
            return PlayerState::Error(failure.clone());
        }
        match &self.bundle {
            None => PlayerState::Loading,
            Some(bundle) if bundle.content.is_empty() => PlayerState::Empty,
            Some(_) => PlayerState::Playing { index: self.index },
        }
    }

    pub fn bundle(&self) -> Option<&DisplayBundle> {
        self.bundle.as_ref()
    }

    pub fn failure(&self) -> Option<&DisplayFailure> {
        self.failure.as_ref()
    }

    /// Item on screen, if playing.
    pub fn current(&self) -> Option<&Content> {
        if self.failure.is_some() {
            return None;
        }
        self.bundle.as_ref()?.content.get(self.index)
    }

    /// The item's own duration, else the playlist default, else the
    /// configured fallback.
    pub fn item_duration(&self) -> Option<Duration> {
        let item = self.current()?;
        let playlist_default = self
            .bundle
            .as_ref()
            .and_then(|b| b.playlist.as_ref())
            .and_then(|p| p.duration);

        let secs = item
            .duration
            .filter(|d| *d > 0)
            .or(playlist_default.filter(|d| *d > 0));

        Some(match secs {
            Some(secs) => Duration::from_secs(u64::from(secs)),
            None => self.default_item,
        })
    }

    /// Moves to the next item, wrapping after the last. Returns false when
    /// there is nothing playing.
    pub fn advance(&mut self) -> bool {
        if self.current().is_none() {
            return false;
        }
        let len = self.bundle.as_ref().map_or(0, |b| b.content.len());
        self.index = (self.index + 1) % len;
        true
    }

    /// Applies the outcome of a poll. Returns true when the screen must be
    /// redrawn, i.e. the visible item or state changed.
    pub fn apply_poll(&mut self, result: Result<DisplayBundle, DisplayFailure>) -> bool {
        let before = self.view();

        match result {
            Ok(bundle) => {
                let count = bundle.content.len();
                if count != self.last_count {
                    self.last_count = count;
                    self.index = 0;
                }
                if self.index >= count {
                    self.index = 0;
                }
                self.bundle = Some(bundle);
                self.failure = None;
            }
            Err(failure) => {
                self.failure = Some(failure);
            }
        }

        before != self.view()
    }

    fn view(&self) -> View {
        if let Some(failure) = &self.failure {
            return View::Error(failure.clone());
        }
        match &self.bundle {
            None => View::Loading,
            Some(bundle) => match bundle.content.get(self.index) {
                Some(item) => View::Item(self.index, item.clone()),
                None => View::Empty(bundle.screen.name.clone()),
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{ContentKind, Playlist, Screen};
    use chrono::Utc;

    pub(crate) fn content(id: &str, duration: Option<u32>) -> Content {
        Content {
            id: id.to_string(),
            name: id.to_string(),
            kind: ContentKind::Image,
            url: format!("/uploads/{}.png", id),
            duration,
            file_name: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub(crate) fn bundle(items: Vec<Content>, playlist_duration: Option<u32>) -> DisplayBundle {
        let now = Utc::now();
        DisplayBundle {
            screen: Screen {
                id: "s1".to_string(),
                name: "Lobby".to_string(),
                location: String::new(),
                playlist_id: Some("p1".to_string()),
                is_active: true,
                created_at: now,
                updated_at: None,
            },
            playlist: Some(Playlist {
                id: "p1".to_string(),
                name: "Morning".to_string(),
                description: String::new(),
                content_ids: items.iter().map(|c| c.id.clone()).collect(),
                duration: playlist_duration,
                created_at: now,
                updated_at: None,
            }),
            content: items,
        }
    }

    #[test]
    fn test_starts_loading() {
        let player = Player::new(Duration::from_secs(30));
        assert_eq!(player.state(), PlayerState::Loading);
        assert!(player.current().is_none());
        assert!(player.item_duration().is_none());
    }

    #[test]
    fn test_advance_wraps() {
        let mut player = Player::new(Duration::from_secs(30));
        assert!(player.apply_poll(Ok(bundle(
            vec![content("a", Some(5)), content("b", Some(10))],
            None
        ))));

        assert_eq!(player.state(), PlayerState::Playing { index: 0 });
        assert_eq!(player.item_duration(), Some(Duration::from_secs(5)));

        assert!(player.advance());
        assert_eq!(player.current().unwrap().id, "b");
        assert_eq!(player.item_duration(), Some(Duration::from_secs(10)));

        assert!(player.advance());
        assert_eq!(player.current().unwrap().id, "a");
    }

    #[test]
    fn test_duration_fallbacks() {
        let mut player = Player::new(Duration::from_secs(30));
        player.apply_poll(Ok(bundle(vec![content("a", None)], Some(12))));
        assert_eq!(player.item_duration(), Some(Duration::from_secs(12)));

        player.apply_poll(Ok(bundle(vec![content("a", Some(0))], None)));
        assert_eq!(player.item_duration(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_length_change_resets_index() {
        let (a, b, c) = (content("a", None), content("b", None), content("c", None));
        let mut player = Player::new(Duration::from_secs(30));
        player.apply_poll(Ok(bundle(vec![a.clone(), b.clone()], None)));
        player.advance();
        assert_eq!(player.state(), PlayerState::Playing { index: 1 });

        // Same list again keeps the position and needs no redraw.
        let changed = player.apply_poll(Ok(bundle(vec![a.clone(), b.clone()], None)));
        assert!(!changed);
        assert_eq!(player.state(), PlayerState::Playing { index: 1 });

        player.apply_poll(Ok(bundle(vec![a, b, c], None)));
        assert_eq!(player.state(), PlayerState::Playing { index: 0 });
    }

    #[test]
    fn test_identical_poll_is_not_a_change() {
        let mut player = Player::new(Duration::from_secs(30));
        let first = bundle(vec![content("a", None)], None);
        let again = first.clone();

        assert!(player.apply_poll(Ok(first)));
        assert!(!player.apply_poll(Ok(again)));
    }

    #[test]
    fn test_empty_and_error_states() {
        let mut player = Player::new(Duration::from_secs(30));
        player.apply_poll(Ok(bundle(vec![], None)));
        assert_eq!(player.state(), PlayerState::Empty);
        assert!(!player.advance());

        assert!(player.apply_poll(Err(DisplayFailure::ScreenNotFound)));
        assert_eq!(
            player.state(),
            PlayerState::Error(DisplayFailure::ScreenNotFound)
        );
        assert!(player.current().is_none());

        // A successful poll recovers.
        player.apply_poll(Ok(bundle(vec![content("a", None)], None)));
        assert_eq!(player.state(), PlayerState::Playing { index: 0 });
    }
}
