//! In-memory session management
//!
//! - `id`: unpredictable, URL-safe session identifiers
//! - `entry`: the per-client record and its typed value bag
//! - `store`: the id → session map and its operations
//! - `sweeper`: background task evicting idle sessions

pub mod entry;
pub mod id;
pub mod store;
pub mod sweeper;

pub use entry::{Session, SessionValue};
pub use id::new_session_id;
pub use store::{SessionInfo, SessionStore};
pub use sweeper::{spawn_sweeper, SweeperHandle};
