use crate::api_client::{ApiClient, ClientError};
use crate::models::DisplayBundle;
use crate::player::{DisplayFailure, Player};
use crate::render::{render, Rendition};
use crate::surface::Surface;
use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Where the player gets its screen bundle from.
#[async_trait]
pub trait DisplaySource: Send + Sync {
    async fn fetch(&self, screen_id: &str) -> Result<DisplayBundle, DisplayFailure>;
}

#[async_trait]
impl DisplaySource for ApiClient {
    async fn fetch(&self, screen_id: &str) -> Result<DisplayBundle, DisplayFailure> {
        self.get_display(screen_id).await.map_err(|e| match e {
            ClientError::NotFound(_) => DisplayFailure::ScreenNotFound,
            other => DisplayFailure::Unavailable(other.to_string()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct DisplayOptions {
    pub screen_id: String,
    /// Origin that relative media URLs are resolved against.
    pub origin: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub default_item: Duration,
}

/// Plays a screen until `cancel` fires.
///
/// The poll timer and the item timer run independently: a fetch in flight
/// never holds back an item change. Each fetch is bounded by
/// `request_timeout`, at most one is in flight, and cancelling drops it, so
/// no response is applied after the loop has stopped. The item timer is
/// re-armed only when what is on screen changes.
pub async fn run_display<S, F>(
    source: &S,
    surface: &mut F,
    options: &DisplayOptions,
    cancel: CancellationToken,
) -> Result<()>
where
    S: DisplaySource + ?Sized,
    F: Surface + ?Sized,
{
    tracing::info!(
        "Starting display for screen {} (poll every {:?})",
        options.screen_id,
        options.poll_interval
    );

    let mut player = Player::new(options.default_item);
    present(surface, &Rendition::Loading);

    let mut poll = tokio::time::interval(options.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut deadline: Option<Instant> = None;
    let mut in_flight = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = poll.tick(), if in_flight.is_none() => {
                in_flight = Some(Box::pin(tokio::time::timeout(
                    options.request_timeout,
                    source.fetch(&options.screen_id),
                )));
            }
            fetched = settle(&mut in_flight) => {
                in_flight = None;
                let result = fetched.unwrap_or_else(|_| {
                    Err(DisplayFailure::Unavailable("request timed out".to_string()))
                });

                match &result {
                    Ok(bundle) => tracing::debug!(
                        "Screen {} has {} item(s)",
                        bundle.screen.id,
                        bundle.content.len()
                    ),
                    Err(failure) => tracing::error!(
                        "Failed to fetch display data for {}: {:?}",
                        options.screen_id,
                        failure
                    ),
                }

                if player.apply_poll(result) {
                    tracing::debug!("Player is now {:?}", player.state());
                    present(surface, &render(&player, &options.origin));
                    deadline = player.item_duration().map(|d| Instant::now() + d);
                }
            }
            _ = sleep_until(deadline) => {
                if player.advance() {
                    present(surface, &render(&player, &options.origin));
                    deadline = player.item_duration().map(|d| Instant::now() + d);
                } else {
                    deadline = None;
                }
            }
        }
    }

    tracing::info!("Display for screen {} stopped", options.screen_id);
    Ok(())
}

/// Resolves with the in-flight fetch, or never when there is none.
async fn settle<T: Future + Unpin>(in_flight: &mut Option<T>) -> T::Output {
    match in_flight {
        Some(fetch) => fetch.await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn present<F: Surface + ?Sized>(surface: &mut F, rendition: &Rendition) {
    if let Err(e) = surface.show(rendition) {
        tracing::warn!("Surface failed to show {}: {}", rendition, e);
    }
}
