use crate::api_client::{ClientError, FilePart};
use crate::controller::Console;
use crate::models::{
    Content, ContentFields, ContentKind, NewPlaylist, NewScreen, Playlist, PlaylistChanges,
    Screen, ScreenChanges,
};
use anyhow::Result;
use clap::Subcommand;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// Show screen, playlist and content counts
    Dashboard,
    /// Manage screens
    #[command(subcommand)]
    Screens(ScreenCommand),
    /// Manage playlists
    #[command(subcommand)]
    Playlists(PlaylistCommand),
    /// Manage content items
    #[command(subcommand)]
    Content(ContentCommand),
}

#[derive(Subcommand, Debug)]
pub enum ScreenCommand {
    List,
    Show {
        id: String,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        location: String,
        /// Playlist to assign
        #[arg(long)]
        playlist: Option<String>,
        /// Create the screen switched off
        #[arg(long)]
        inactive: bool,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, conflicts_with = "clear_playlist")]
        playlist: Option<String>,
        /// Remove the playlist assignment
        #[arg(long)]
        clear_playlist: bool,
        #[arg(long)]
        active: Option<bool>,
    },
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Print the kiosk page URL for this screen. The page is only served
    /// when the server has `ui_path` set; otherwise use `signage-client display`.
    DisplayUrl {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum PlaylistCommand {
    List,
    Show {
        id: String,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Content ids in play order, comma separated
        #[arg(long, value_delimiter = ',')]
        content: Vec<String>,
        /// Default seconds per item
        #[arg(long, default_value_t = 30)]
        duration: u32,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Replaces the whole content list
        #[arg(long, value_delimiter = ',')]
        content: Option<Vec<String>>,
        #[arg(long)]
        duration: Option<u32>,
    },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ContentCommand {
    List,
    Show {
        id: String,
    },
    Create {
        #[arg(long)]
        name: String,
        /// image, video, text or url
        #[arg(long = "type")]
        kind: String,
        /// Link, page address, or the body of a text item
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        duration: Option<u32>,
        /// Media file to upload; replaces --url
        #[arg(long)]
        file: Option<PathBuf>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

pub async fn run(console: &mut Console, command: AdminCommand) -> Result<()> {
    match command {
        AdminCommand::Dashboard => dashboard(console).await,
        AdminCommand::Screens(cmd) => screens(console, cmd).await,
        AdminCommand::Playlists(cmd) => playlists(console, cmd).await,
        AdminCommand::Content(cmd) => content(console, cmd).await,
    }
}

/// Turns a failed call into the message the console recorded for it.
fn checked<T>(console: &Console, result: Result<T, ClientError>) -> Result<T> {
    result.map_err(|e| {
        let message = console
            .state()
            .error
            .clone()
            .unwrap_or_else(|| e.to_string());
        anyhow::anyhow!(message)
    })
}

fn confirm(prompt: String, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

async fn dashboard(console: &mut Console) -> Result<()> {
    console.refresh().await;

    // Shown once, then cleared like a dismissed banner.
    if let Some(error) = console.state().error.clone() {
        println!("{} {}", style("!").red().bold(), style(error).red());
        console.dismiss_error();
    }

    let state = console.state();
    println!("{}", style("Dashboard").bold());
    println!(
        "  Active screens: {}",
        style(state.active_screens()).green().bold()
    );
    println!("  Total screens:  {}", style(state.screens.len()).blue().bold());
    println!(
        "  Playlists:      {}",
        style(state.playlists.len()).magenta().bold()
    );
    println!("  Content items:  {}", style(state.content.len()).yellow().bold());

    if !state.screens.is_empty() {
        println!("\n{}", style("Screens").bold());
        for screen in &state.screens {
            let playlist = screen
                .playlist_id
                .as_deref()
                .and_then(|id| state.playlists.iter().find(|p| p.id == id))
                .map(|p| p.name.as_str())
                .unwrap_or("No playlist");
            println!("  {}  {}", status_dot(screen.is_active), screen.name);
            println!("     {}", style(playlist).dim());
        }
    }
    Ok(())
}

fn status_dot(active: bool) -> console::StyledObject<&'static str> {
    if active {
        style("●").green()
    } else {
        style("●").red()
    }
}

fn print_screen(screen: &Screen) {
    println!(
        "{}  {}  {}",
        status_dot(screen.is_active),
        style(&screen.name).bold(),
        style(&screen.id).dim()
    );
    if !screen.location.is_empty() {
        println!("   location: {}", screen.location);
    }
    println!(
        "   playlist: {}",
        screen.playlist_id.as_deref().unwrap_or("-")
    );
}

fn print_playlist(playlist: &Playlist) {
    println!(
        "{}  {}",
        style(&playlist.name).bold(),
        style(&playlist.id).dim()
    );
    if !playlist.description.is_empty() {
        println!("   {}", playlist.description);
    }
    println!(
        "   {} item(s), {}s per item",
        playlist.content_ids.len(),
        playlist.duration.unwrap_or(30)
    );
    for (position, id) in playlist.content_ids.iter().enumerate() {
        println!("   {}. {}", position + 1, id);
    }
}

fn print_content(item: &Content) {
    println!(
        "{}  [{}]  {}",
        style(&item.name).bold(),
        style(&item.kind).cyan(),
        style(&item.id).dim()
    );
    if !item.url.is_empty() {
        println!("   {}", item.url);
    }
    if let Some(duration) = item.duration {
        println!("   {}s", duration);
    }
}

async fn screens(console: &mut Console, command: ScreenCommand) -> Result<()> {
    match command {
        ScreenCommand::List => {
            let result = console.fetch_screens().await;
            checked(console, result)?;
            for screen in &console.state().screens {
                print_screen(screen);
            }
        }
        ScreenCommand::Show { id } => {
            let result = console.get_screen(&id).await;
            print_screen(&checked(console, result)?);
        }
        ScreenCommand::Create {
            name,
            location,
            playlist,
            inactive,
        } => {
            let new_screen = NewScreen {
                name,
                location,
                playlist_id: playlist,
                is_active: !inactive,
            };
            let result = console.create_screen(&new_screen).await;
            let screen = checked(console, result)?;
            println!("{} Created screen", style("✓").green());
            print_screen(&screen);
        }
        ScreenCommand::Update {
            id,
            name,
            location,
            playlist,
            clear_playlist,
            active,
        } => {
            let changes = ScreenChanges {
                name,
                location,
                playlist_id: if clear_playlist {
                    Some(None)
                } else {
                    playlist.map(Some)
                },
                is_active: active,
            };
            let result = console.update_screen(&id, &changes).await;
            let screen = checked(console, result)?;
            println!("{} Updated screen", style("✓").green());
            print_screen(&screen);
        }
        ScreenCommand::Delete { id, yes } => {
            if !confirm(format!("Delete screen {}?", id), yes)? {
                return Ok(());
            }
            let result = console.delete_screen(&id).await;
            checked(console, result)?;
            println!("{} Deleted screen {}", style("✓").green(), id);
        }
        ScreenCommand::DisplayUrl { id } => {
            let result = console.get_screen(&id).await;
            let screen = checked(console, result)?;
            println!("{}/display/{}", console.api().origin(), screen.id);
            println!(
                "{}",
                style(format!(
                    "Needs the server's ui_path. Without a browser UI run: signage-client display --screen {}",
                    screen.id
                ))
                .dim()
            );
        }
    }
    Ok(())
}

async fn playlists(console: &mut Console, command: PlaylistCommand) -> Result<()> {
    match command {
        PlaylistCommand::List => {
            let result = console.fetch_playlists().await;
            checked(console, result)?;
            for playlist in &console.state().playlists {
                print_playlist(playlist);
            }
        }
        PlaylistCommand::Show { id } => {
            let result = console.get_playlist(&id).await;
            print_playlist(&checked(console, result)?);
        }
        PlaylistCommand::Create {
            name,
            description,
            content,
            duration,
        } => {
            let new_playlist = NewPlaylist {
                name,
                description,
                content_ids: content,
                duration,
            };
            let result = console.create_playlist(&new_playlist).await;
            let playlist = checked(console, result)?;
            println!("{} Created playlist", style("✓").green());
            print_playlist(&playlist);
        }
        PlaylistCommand::Update {
            id,
            name,
            description,
            content,
            duration,
        } => {
            let changes = PlaylistChanges {
                name,
                description,
                content_ids: content,
                duration,
            };
            let result = console.update_playlist(&id, &changes).await;
            let playlist = checked(console, result)?;
            println!("{} Updated playlist", style("✓").green());
            print_playlist(&playlist);
        }
        PlaylistCommand::Delete { id, yes } => {
            if !confirm(format!("Delete playlist {}?", id), yes)? {
                return Ok(());
            }
            let result = console.delete_playlist(&id).await;
            checked(console, result)?;
            println!("{} Deleted playlist {}", style("✓").green(), id);
        }
    }
    Ok(())
}

async fn read_file(path: Option<PathBuf>) -> Result<Option<FilePart>> {
    match path {
        Some(path) => Ok(Some(FilePart::read(&path).await?)),
        None => Ok(None),
    }
}

async fn content(console: &mut Console, command: ContentCommand) -> Result<()> {
    match command {
        ContentCommand::List => {
            let result = console.fetch_content().await;
            checked(console, result)?;
            for item in &console.state().content {
                print_content(item);
            }
        }
        ContentCommand::Show { id } => {
            let result = console.get_content(&id).await;
            print_content(&checked(console, result)?);
        }
        ContentCommand::Create {
            name,
            kind,
            url,
            duration,
            file,
        } => {
            let fields = ContentFields {
                name: Some(name),
                kind: Some(ContentKind::from(kind)),
                url,
                duration,
            };
            let file = read_file(file).await?;
            let result = console.create_content(&fields, file).await;
            let item = checked(console, result)?;
            println!("{} Created content", style("✓").green());
            print_content(&item);
        }
        ContentCommand::Update {
            id,
            name,
            kind,
            url,
            duration,
            file,
        } => {
            let fields = ContentFields {
                name,
                kind: kind.map(ContentKind::from),
                url,
                duration,
            };
            let file = read_file(file).await?;
            let result = console.update_content(&id, &fields, file).await;
            let item = checked(console, result)?;
            println!("{} Updated content", style("✓").green());
            print_content(&item);
        }
        ContentCommand::Delete { id, yes } => {
            if !confirm(format!("Delete content {}?", id), yes)? {
                return Ok(());
            }
            let result = console.delete_content(&id).await;
            checked(console, result)?;
            println!("{} Deleted content {}", style("✓").green(), id);
        }
    }
    Ok(())
}
