mod api;
mod config;
mod error;
mod media;
mod models;
mod repository;
mod resolver;
mod store;

use anyhow::Result;
use axum::{extract::DefaultBodyLimit, Router};
use clap::Parser;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::media::{MediaStore, UPLOAD_PREFIX};
use crate::repository::{ContentRepository, PlaylistRepository, Repository, ScreenRepository};
use crate::resolver::DisplayResolver;
use crate::store::JsonStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub screens: ScreenRepository,
    pub playlists: PlaylistRepository,
    pub content: ContentRepository,
    pub resolver: DisplayResolver,
}

impl AppState {
    pub fn new(config: Arc<Config>, store: Arc<JsonStore>, media: MediaStore) -> Self {
        Self {
            config,
            screens: Repository::new(store.clone()),
            playlists: Repository::new(store.clone()),
            content: ContentRepository::new(store.clone(), media),
            resolver: DisplayResolver::new(store),
        }
    }
}

/// API under `/api`, stored media under `/uploads`, and the admin UI (when
/// configured) as the SPA fallback.
pub fn build_router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.content.media().dir());

    let mut app = Router::new()
        .nest("/api", api::routes())
        .nest_service(UPLOAD_PREFIX, uploads);

    if let Some(ui_path) = &state.config.server.ui_path {
        tracing::info!("Serving admin UI from {}", ui_path);
        app = app.fallback_service(
            ServeDir::new(ui_path).not_found_service(ServeFile::new(format!("{}/index.html", ui_path))),
        );
    }

    app.layer(DefaultBodyLimit::max(state.config.storage.max_upload_bytes()))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Parser)]
#[command(version, author = "SIGNBOARD AUTHORS", about = "Signboard Server\nLicensed under AGPLv3", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Generate a default configuration template to stdout
    #[arg(long)]
    generate_config: bool,
}

fn run_onboarding() -> Result<Config> {
    use dialoguer::{theme::ColorfulTheme, Input};

    println!("Welcome to Signboard Server!");
    println!("No configuration file was found, let's create one.\n");

    let host: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Server Host")
        .default("0.0.0.0".to_string())
        .interact_text()?;

    let port: u16 = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Server Port")
        .default(5000)
        .interact_text()?;

    let db_path: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Record store file")
        .default("data/db.json".to_string())
        .interact_text()?;

    let uploads_dir: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Upload directory")
        .default("uploads".to_string())
        .interact_text()?;

    let config_content = format!(
        r#"[server]
host = "{}"
port = {}

[server.https]
enabled = false
cert_path = "certs/cert.pem"
key_path = "certs/key.pem"

[storage]
db_path = "{}"
uploads_dir = "{}"
max_upload_mb = 100

[logging]
level = "info"
"#,
        host, port, db_path, uploads_dir
    );

    println!("\nGenerating configuration file: server-config.toml");
    std::fs::write("server-config.toml", &config_content)?;
    println!("Configuration saved successfully!");
    println!("----------------------------------------\n");

    let config: Config = toml::from_str(&config_content)?;
    Ok(config)
}

/// Best guess at the LAN address other devices can reach us on.
fn network_ip() -> Option<std::net::IpAddr> {
    // Connecting a UDP socket sends nothing; it only selects the outbound interface.
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_loopback()).then_some(ip)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.generate_config {
        println!("{}", Config::default_template());
        return Ok(());
    }

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| "server-config.toml".to_string());

    let config = if std::fs::metadata(&config_path).is_ok() {
        Config::load(&config_path)?
    } else if cli.config.is_none() && console::user_attended() {
        match run_onboarding() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Onboarding failed: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        eprintln!("Error: Configuration file '{}' not found.", config_path);
        eprintln!("Run with --generate-config to see a template.");
        std::process::exit(1);
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "signage_server={level},tower_http={level}",
                    level = config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Loaded configuration from {}", config_path);

    // Storage
    let store = Arc::new(JsonStore::open(&config.storage.db_path).await?);
    let media = MediaStore::open(&config.storage.uploads_dir).await?;
    tracing::info!(
        "Record store at {:?}, uploads in {:?}",
        store.path(),
        media.dir()
    );

    let state = AppState::new(Arc::new(config.clone()), store, media);
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener_address: SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid host/port: {}", e))?;

    if let Some(https_config) = &config.server.https {
        if https_config.enabled {
            use axum_server::tls_rustls::RustlsConfig;

            if !std::path::Path::new(&https_config.cert_path).exists() {
                anyhow::bail!("Certificate file not found: {}", https_config.cert_path);
            }
            if !std::path::Path::new(&https_config.key_path).exists() {
                anyhow::bail!("Key file not found: {}", https_config.key_path);
            }

            let tls_config =
                RustlsConfig::from_pem_file(&https_config.cert_path, &https_config.key_path)
                    .await?;

            log_addresses("https", config.server.port);
            axum_server::bind_rustls(listener_address, tls_config)
                .serve(app.into_make_service())
                .await?;

            return Ok(());
        }
    }

    let listener = tokio::net::TcpListener::bind(listener_address).await?;
    log_addresses("http", config.server.port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn log_addresses(scheme: &str, port: u16) {
    tracing::info!("Signboard server running on:");
    tracing::info!("   Local:   {}://localhost:{}", scheme, port);
    match network_ip() {
        Some(ip) => tracing::info!("   Network: {}://{}:{}", scheme, ip, port),
        None => tracing::info!("   Network: unavailable"),
    }
}
