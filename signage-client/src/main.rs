mod admin;
mod api_client;
mod config;
mod controller;
mod display;
mod models;
mod mpv_client;
mod player;
mod render;
mod surface;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Child;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::admin::AdminCommand;
use crate::api_client::ApiClient;
use crate::config::Config;
use crate::controller::Console;
use crate::display::{run_display, DisplayOptions};
use crate::surface::{LogSurface, MpvSurface, Surface};

#[derive(Parser)]
#[command(version, author = "SIGNBOARD AUTHORS", about = "Signboard Client - Display Player and Admin Console\nLicensed under AGPLv3", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Server URL, overriding the configuration file
    #[arg(short, long, global = true)]
    server: Option<String>,

    /// Generate a default configuration template to stdout
    #[arg(long)]
    generate_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Play a screen's playlist until interrupted
    Display {
        /// Screen id, overriding the configuration file
        #[arg(long)]
        screen: Option<String>,
    },
    /// Manage screens, playlists and content
    #[command(subcommand)]
    Admin(AdminCommand),
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| "client-config.toml".to_string());

    let mut config = if std::fs::metadata(&config_path).is_ok() {
        Config::load(&config_path)?
    } else if cli.config.is_some() {
        anyhow::bail!(
            "Configuration file '{}' not found. Run with --generate-config to see a template.",
            config_path
        );
    } else {
        Config::default()
    };

    if let Some(server) = &cli.server {
        config.server_url = server.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.generate_config {
        println!("{}", Config::default_template());
        return Ok(());
    }

    let config = load_config(&cli)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("signage_client={}", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api = ApiClient::new(&config.server_url, config.request_timeout())?;

    match cli.command {
        Some(Command::Admin(command)) => {
            let mut console = Console::new(api);
            admin::run(&mut console, command).await
        }
        Some(Command::Display { screen }) => {
            let screen_id = screen.or_else(|| config.screen_id.clone());
            display(api, &config, screen_id).await
        }
        None => {
            let screen_id = config.screen_id.clone();
            display(api, &config, screen_id).await
        }
    }
}

async fn display(api: ApiClient, config: &Config, screen_id: Option<String>) -> Result<()> {
    let Some(screen_id) = screen_id else {
        anyhow::bail!("No screen selected. Pass --screen <id> or set screen_id in the config.");
    };

    let options = DisplayOptions {
        screen_id,
        origin: api.origin().to_string(),
        poll_interval: config.poll_interval(),
        request_timeout: config.request_timeout(),
        default_item: config.default_item_duration(),
    };

    let mut mpv_process: Option<Child> = None;
    let mut surface: Box<dyn Surface> = match &config.mpv_socket_path {
        Some(socket_path) => {
            if !std::path::Path::new(socket_path).exists() {
                tracing::info!("Starting mpv on {}", socket_path);
                mpv_process = Some(mpv_client::spawn_mpv(socket_path)?);
            }
            Box::new(MpvSurface::new(socket_path.clone()))
        }
        None => Box::new(LogSurface),
    };

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutting down display");
            shutdown.cancel();
        }
    });

    let result = run_display(&api, surface.as_mut(), &options, cancel).await;

    if let Some(mut child) = mpv_process {
        let _ = child.kill();
    }
    result
}
