use anyhow::Result;
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

/// Starts a fullscreen, idle mpv listening on `socket_path`.
pub fn spawn_mpv(socket_path: &str) -> Result<Child> {
    if Path::new(socket_path).exists() {
        // Stale socket from a previous run
        let _ = std::fs::remove_file(socket_path);
    }

    let child = Command::new("mpv")
        .arg("--idle")
        .arg("--fs")
        .arg("--force-window=yes")
        .arg("--image-display-duration=inf")
        .arg(format!("--input-ipc-server={}", socket_path))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    let start = std::time::Instant::now();
    while start.elapsed() < Duration::from_secs(10) {
        if Path::new(socket_path).exists() {
            return Ok(child);
        }
        thread::sleep(Duration::from_millis(100));
    }

    tracing::warn!("mpv did not open {} within 10s", socket_path);
    Ok(child)
}

pub struct MpvClient {
    socket_path: String,
}

impl MpvClient {
    pub fn new(socket_path: String) -> Self {
        Self { socket_path }
    }

    /// Replaces whatever is playing with `path`, looping it forever.
    pub fn play_looped(&self, path: &str) -> Result<()> {
        // mpv 0.38+ wants an insertion index before the options.
        self.send_command(json!({
            "command": ["loadfile", path, "replace", "0", "loop-file=inf"]
        }))?;
        Ok(())
    }

    pub fn set_mute(&self, mute: bool) -> Result<()> {
        self.send_command(json!({
            "command": ["set_property", "mute", mute]
        }))?;
        Ok(())
    }

    /// On-screen text for renditions mpv cannot play.
    pub fn show_text(&self, text: &str, duration: Duration) -> Result<()> {
        self.send_command(json!({
            "command": ["show-text", text, duration.as_millis() as u64]
        }))?;
        Ok(())
    }

    pub fn stop(&self) -> Result<()> {
        self.send_command(json!({
            "command": ["stop"]
        }))?;
        Ok(())
    }

    pub fn send_command(&self, cmd: Value) -> Result<Value> {
        let mut stream = UnixStream::connect(&self.socket_path)?;
        stream.set_write_timeout(Some(Duration::from_secs(1)))?;
        stream.set_read_timeout(Some(Duration::from_secs(1)))?;

        let cmd_str = format!("{}\n", serde_json::to_string(&cmd)?);
        tracing::debug!("mpv <- {}", cmd_str.trim());

        stream.write_all(cmd_str.as_bytes())?;

        let mut reader = BufReader::new(stream);
        let mut response = String::new();
        reader.read_line(&mut response)?;

        let response: Value = serde_json::from_str(&response)?;
        match response["error"].as_str() {
            Some("success") | None => Ok(response),
            Some(err) => Err(anyhow::anyhow!("mpv rejected command: {}", err)),
        }
    }
}
