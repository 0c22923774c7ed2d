use crate::mpv_client::MpvClient;
use crate::render::Rendition;
use anyhow::Result;
use std::time::Duration;

/// Something that can put a rendition on screen.
pub trait Surface: Send {
    fn show(&mut self, rendition: &Rendition) -> Result<()>;
}

/// Headless surface: reports every rendition through tracing.
#[derive(Debug, Default)]
pub struct LogSurface;

impl Surface for LogSurface {
    fn show(&mut self, rendition: &Rendition) -> Result<()> {
        match rendition {
            Rendition::Failure { message } => tracing::warn!("Display: {}", message),
            other => tracing::info!("Display: {}", other),
        }
        Ok(())
    }
}

/// Drives an mpv instance over its JSON IPC socket.
pub struct MpvSurface {
    mpv: MpvClient,
}

impl MpvSurface {
    pub fn new(socket_path: String) -> Self {
        Self {
            mpv: MpvClient::new(socket_path),
        }
    }
}

impl Surface for MpvSurface {
    fn show(&mut self, rendition: &Rendition) -> Result<()> {
        match rendition {
            Rendition::Image { src, .. } => {
                self.mpv.play_looped(src)?;
            }
            Rendition::Video { src } => {
                self.mpv.set_mute(true)?;
                self.mpv.play_looped(src)?;
            }
            other => {
                self.mpv.stop()?;
                // Held until the next rendition replaces it.
                self.mpv
                    .show_text(&other.to_string(), Duration::from_secs(24 * 60 * 60))?;
                tracing::info!("Display: {}", other);
            }
        }
        Ok(())
    }
}
