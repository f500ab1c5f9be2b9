//! Configuration management for Sessionkeep
//!
//! Loads settings from TOML file at ~/.sessionkeep/config.toml

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Session store configuration
    #[serde(default)]
    pub session: SessionConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server port (default: 19480)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Server host (default: 127.0.0.1 - localhost only)
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    19480
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Session store configuration. Fixed once the store is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session identifier
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Seconds of inactivity before a session is eligible for eviction
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,

    /// Seconds between sweep passes. Unset means "same as max_lifetime_secs",
    /// so shorter lifetimes sweep more often.
    #[serde(default)]
    pub sweep_interval_secs: Option<u64>,
}

fn default_cookie_name() -> String {
    "sessionkeep_id".to_string()
}

fn default_max_lifetime() -> u64 {
    1800
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            cookie_name: default_cookie_name(),
            max_lifetime_secs: default_max_lifetime(),
            sweep_interval_secs: None,
        }
    }
}

impl SessionConfig {
    /// Build a session config with the given cookie name and lifetime
    pub fn new(cookie_name: impl Into<String>, max_lifetime_secs: u64) -> Self {
        SessionConfig {
            cookie_name: cookie_name.into(),
            max_lifetime_secs,
            sweep_interval_secs: None,
        }
    }

    /// Allowed inactivity before eviction, never less than one second
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs.max(1))
    }

    /// Delay between the end of one sweep pass and the start of the next,
    /// never less than one second
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(
            self.sweep_interval_secs
                .unwrap_or(self.max_lifetime_secs)
                .max(1),
        )
    }

    /// Reject values the store and cookie adapter cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.cookie_name.is_empty() {
            return Err(CoreError::Config("session.cookie_name must not be empty".into()));
        }
        if !self.cookie_name.bytes().all(is_cookie_token_byte) {
            return Err(CoreError::Config(format!(
                "session.cookie_name contains characters not allowed in a cookie name: {:?}",
                self.cookie_name
            )));
        }
        if self.max_lifetime_secs == 0 {
            return Err(CoreError::Config(
                "session.max_lifetime_secs must be at least 1".into(),
            ));
        }
        if self.sweep_interval_secs == Some(0) {
            return Err(CoreError::Config(
                "session.sweep_interval_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// RFC 6265 token characters: visible ASCII minus separators
fn is_cookie_token_byte(b: u8) -> bool {
    b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let expanded_path = expand_path(path.as_ref());

        if !expanded_path.exists() {
            return Err(CoreError::Config(format!(
                "Configuration file not found: {}",
                expanded_path.display()
            )));
        }

        let content = std::fs::read_to_string(&expanded_path)?;
        let config: Config = toml::from_str(&content)?;

        Ok(config)
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|p| p.join(".sessionkeep").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".sessionkeep/config.toml"))
    }

    /// Get the server socket address
    pub fn server_addr(&self) -> SocketAddr {
        use std::net::ToSocketAddrs;

        format!("{}:{}", self.server.host, self.server.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], self.server.port)))
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> Result<()> {
        self.session.validate()
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("SESSIONKEEP_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("SESSIONKEEP_SERVER_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid SESSIONKEEP_SERVER_PORT={}", port),
            }
        }
        if let Ok(name) = std::env::var("SESSIONKEEP_COOKIE_NAME") {
            self.session.cookie_name = name;
        }
        if let Ok(secs) = std::env::var("SESSIONKEEP_MAX_LIFETIME_SECS") {
            match secs.parse() {
                Ok(secs) => self.session.max_lifetime_secs = secs,
                Err(_) => {
                    tracing::warn!("Ignoring invalid SESSIONKEEP_MAX_LIFETIME_SECS={}", secs)
                }
            }
        }
    }

    /// Create a default configuration file at the given path
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let content = r#"# Sessionkeep Configuration

[server]
# Port to listen on (default: 19480)
port = 19480

# Host to bind to
# "127.0.0.1" = localhost only (recommended)
host = "127.0.0.1"

[session]
# Cookie carrying the session identifier
cookie_name = "sessionkeep_id"

# Seconds of inactivity before a session is evicted (>= 1)
max_lifetime_secs = 1800

# Seconds between sweep passes (defaults to max_lifetime_secs)
# sweep_interval_secs = 60
"#;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        Ok(())
    }
}

/// Expand ~ to home directory in paths
pub fn expand_path(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
