// ABOUTME: Configuration loading for sessionchat.
// ABOUTME: Reads ~/.sessionchat/config.toml, applies env and CLI overrides, and resolves data paths.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::api::OutboundFormat;

/// Environment variable overriding `server.socket_base`.
pub const SOCKET_SERVER_ENV: &str = "SESSIONCHAT_SOCKET_SERVER";
/// Environment variable overriding `server.http_base`.
pub const HTTP_SERVER_ENV: &str = "SESSIONCHAT_HTTP_SERVER";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub sessions: SessionsConfig,
}

/// Backend addresses and wire options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base address of the real-time channel; the session id is appended as a path segment.
    pub socket_base: String,
    /// Base address of the HTTP API.
    pub http_base: String,
    pub outbound_format: OutboundFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_base: "ws://localhost:8000/ws".to_string(),
            http_base: "http://localhost:8000".to_string(),
            outbound_format: OutboundFormat::Raw,
        }
    }
}

/// Launcher session list policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Sessions older than this are hidden from the launcher.
    pub freshness_hours: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self { freshness_hours: 24 }
    }
}

impl SessionsConfig {
    /// The freshness window as a duration.
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_hours.saturating_mul(3600))
    }
}

/// Values given on the command line; `None` leaves the loaded value alone.
#[derive(Debug, Default)]
pub struct Overrides {
    pub socket_base: Option<String>,
    pub http_base: Option<String>,
}

impl Config {
    /// Load config from ~/.sessionchat/config.toml, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply environment overrides (already loaded from `.env` by the caller).
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(SOCKET_SERVER_ENV)
            && !url.trim().is_empty()
        {
            self.server.socket_base = url;
        }
        if let Ok(url) = std::env::var(HTTP_SERVER_ENV)
            && !url.trim().is_empty()
        {
            self.server.http_base = url;
        }
    }

    /// Apply command-line overrides, which win over file and env.
    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(url) = overrides.socket_base {
            self.server.socket_base = url;
        }
        if let Some(url) = overrides.http_base {
            self.server.http_base = url;
        }
    }

    /// Directory holding config.toml.
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".sessionchat")
    }

    /// Path to the config file.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Directory for persisted client state.
    pub fn data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(Self::config_dir)
            .join("sessionchat")
    }

    /// Path to the persisted session list.
    pub fn store_path() -> PathBuf {
        Self::data_dir().join("chat_sessions.json")
    }

    /// Directory for rolling log files.
    pub fn log_dir() -> PathBuf {
        Self::data_dir().join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.server.http_base, "http://localhost:8000");
        assert_eq!(config.server.outbound_format, OutboundFormat::Raw);
        assert_eq!(config.sessions.freshness_hours, 24);
        assert_eq!(
            config.sessions.freshness_window(),
            Duration::from_millis(86_400_000)
        );
    }

    #[test]
    fn parse_config_toml() {
        let toml_str = r#"
[server]
socket_base = "wss://chat.example.com/ws"
http_base = "https://chat.example.com/api"
outbound_format = "envelope"

[sessions]
freshness_hours = 6
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.socket_base, "wss://chat.example.com/ws");
        assert_eq!(config.server.http_base, "https://chat.example.com/api");
        assert_eq!(config.server.outbound_format, OutboundFormat::Envelope);
        assert_eq!(config.sessions.freshness_hours, 6);
    }

    #[test]
    fn parse_partial_config_uses_defaults() {
        let toml_str = r#"
[server]
http_base = "http://10.0.0.5:9000"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.http_base, "http://10.0.0.5:9000");
        assert_eq!(config.server.socket_base, "ws://localhost:8000/ws");
        assert_eq!(config.sessions.freshness_hours, 24);
    }

    #[test]
    fn cli_overrides_win() {
        let mut config = Config::default();
        config.apply_overrides(Overrides {
            socket_base: Some("ws://override/ws".to_string()),
            http_base: None,
        });
        assert_eq!(config.server.socket_base, "ws://override/ws");
        assert_eq!(config.server.http_base, "http://localhost:8000");
    }

    #[test]
    fn store_path_lives_under_data_dir() {
        let path = Config::store_path();
        assert!(path.ends_with("sessionchat/chat_sessions.json"));
        assert!(Config::log_dir().starts_with(Config::data_dir()));
    }
}
