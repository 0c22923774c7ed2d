use crate::models::{Content, ContentKind};
use crate::player::{DisplayFailure, Player};
use std::fmt;

/// What a surface is asked to put on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendition {
    Loading,
    Image { src: String, alt: String },
    Video { src: String },
    Text { title: String, body: String },
    Frame { src: String, title: String },
    Unsupported { name: String, kind: String },
    Idle { screen_name: String },
    Failure { message: String },
}

impl fmt::Display for Rendition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rendition::Loading => write!(f, "Loading display..."),
            Rendition::Image { src, alt } => write!(f, "image '{}' <{}>", alt, src),
            Rendition::Video { src } => write!(f, "video <{}> (muted, looping)", src),
            Rendition::Text { title, body } => write!(f, "text '{}': {}", title, body),
            Rendition::Frame { src, title } => write!(f, "page '{}' <{}>", title, src),
            Rendition::Unsupported { name, kind } => {
                write!(f, "{}: Unsupported content type: {}", name, kind)
            }
            Rendition::Idle { screen_name } => {
                write!(f, "{}: No content assigned to this screen", screen_name)
            }
            Rendition::Failure { message } => f.write_str(message),
        }
    }
}

/// Stored files come back as `/uploads/...`; anything else is used verbatim.
pub fn resolve_media_url(origin: &str, url: &str) -> String {
    if url.starts_with('/') {
        format!("{}{}", origin, url)
    } else {
        url.to_string()
    }
}

pub fn render_content(origin: &str, item: &Content) -> Rendition {
    match &item.kind {
        ContentKind::Image => Rendition::Image {
            src: resolve_media_url(origin, &item.url),
            alt: item.name.clone(),
        },
        ContentKind::Video => Rendition::Video {
            src: resolve_media_url(origin, &item.url),
        },
        ContentKind::Text => Rendition::Text {
            title: item.name.clone(),
            body: item.url.clone(),
        },
        ContentKind::Url => Rendition::Frame {
            src: item.url.clone(),
            title: item.name.clone(),
        },
        ContentKind::Other(kind) => Rendition::Unsupported {
            name: item.name.clone(),
            kind: kind.clone(),
        },
    }
}

pub fn render(player: &Player, origin: &str) -> Rendition {
    if let Some(failure) = player.failure() {
        let message = match failure {
            DisplayFailure::ScreenNotFound => "Screen not found",
            DisplayFailure::Unavailable(_) => "Failed to load display data",
        };
        return Rendition::Failure {
            message: message.to_string(),
        };
    }

    match (player.bundle(), player.current()) {
        (None, _) => Rendition::Loading,
        (Some(_), Some(item)) => render_content(origin, item),
        (Some(bundle), None) => Rendition::Idle {
            screen_name: bundle.screen.name.clone(),
        },
    }
}
