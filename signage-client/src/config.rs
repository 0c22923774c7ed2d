use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    pub screen_id: Option<String>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_item_secs")]
    pub default_item_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// When set, renditions are pushed to an mpv instance on this IPC socket.
    pub mpv_socket_path: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_server_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_item_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            screen_id: None,
            poll_interval_secs: default_poll_interval_secs(),
            default_item_secs: default_item_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            mpv_socket_path: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn default_item_duration(&self) -> Duration {
        Duration::from_secs(self.default_item_secs.max(1))
    }

    /// Request timeout, capped at the poll interval so a slow response can
    /// never overlap the next poll.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1)).min(self.poll_interval())
    }

    pub fn default_template() -> &'static str {
        r#"server_url = "http://localhost:5000"
# Screen shown by `signage-client display` when --screen is not given.
# screen_id = "00000000-0000-0000-0000-000000000000"
poll_interval_secs = 10
default_item_secs = 30
request_timeout_secs = 8
# Optional: drive an mpv instance instead of only logging renditions.
# mpv_socket_path = "/tmp/signage-mpv"

[logging]
level = "info"
"#
    }
}
