//! Sessionkeep - in-memory, TTL-based HTTP session store
//!
//! This crate provides:
//! - Opaque, URL-safe session identifiers
//! - A thread-safe store binding identifiers to per-client key/value state
//! - A background sweeper evicting sessions idle past their lifetime
//! - Cookie middleware and a small HTTP API over the store
//!
//! State lives in process memory only and is lost on exit.
//!
//! # Usage
//!
//! As a library:
//! ```ignore
//! use sessionkeep::{Config, Core};
//!
//! let core = Core::new(Config::default())?;
//! core.start_sweeper().await;
//! let id = core.store().create();
//! core.store().set_value(&id, "role", "admin")?;
//! ```
//!
//! As a standalone server (CLI):
//! ```text
//! sessionkeep --config ~/.sessionkeep/config.toml
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod session;

// Re-export main types for convenience
pub use config::{Config, SessionConfig};
pub use error::{CoreError, Result, SessionError};
pub use session::{SessionStore, SessionValue};

use session::SweeperHandle;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Core service owning the session store and its sweeper
pub struct Core {
    /// Configuration
    pub config: Config,

    /// Shared session store
    store: Arc<SessionStore>,

    /// Sweeper state (only while sweeping is active)
    sweeper_handle: RwLock<Option<SweeperHandle>>,
}

impl Core {
    /// Create a new Core instance with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(SessionStore::new(config.session.clone()));

        Ok(Core {
            config,
            store,
            sweeper_handle: RwLock::new(None),
        })
    }

    /// Get a reference to the session store
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Start the background sweeper, replacing any running one
    pub async fn start_sweeper(&self) {
        let handle =
            session::spawn_sweeper(self.store.clone(), self.config.session.sweep_interval());
        if let Some(previous) = self.sweeper_handle.write().await.replace(handle) {
            previous.stop().await;
        }
    }

    /// Stop the background sweeper
    pub async fn stop_sweeper(&self) {
        if let Some(handle) = self.sweeper_handle.write().await.take() {
            handle.stop().await;
        }
    }

    /// Whether a sweeper is currently running
    pub async fn is_sweeping(&self) -> bool {
        self.sweeper_handle
            .read()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Start the HTTP API server (blocks until shutdown)
    pub async fn start_api_server(&self) -> Result<()> {
        let addr = self.config.server_addr();
        tracing::info!("Starting API server on {}", addr);
        api::serve(addr, self.store.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = Config::default();
        config.session.max_lifetime_secs = 0;
        assert!(matches!(Core::new(config), Err(CoreError::Config(_))));
    }

    #[tokio::test]
    async fn test_sweeper_lifecycle() {
        let core = Core::new(Config::default()).unwrap();
        assert!(!core.is_sweeping().await);

        core.start_sweeper().await;
        assert!(core.is_sweeping().await);

        // restarting replaces the running sweeper
        core.start_sweeper().await;
        assert!(core.is_sweeping().await);

        core.stop_sweeper().await;
        assert!(!core.is_sweeping().await);
    }

    #[test]
    fn test_instances_are_isolated() {
        let a = Core::new(Config::default()).unwrap();
        let b = Core::new(Config::default()).unwrap();

        let id = a.store().create();
        assert!(a.store().contains(&id));
        assert!(!b.store().contains(&id));
    }
}
