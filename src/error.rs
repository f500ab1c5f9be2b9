//! Error types for Sessionkeep

use thiserror::Error;

/// Errors surfaced by session store operations.
///
/// A destroyed, evicted, or never-issued identifier all produce the same
/// `InvalidSession`; callers cannot and should not tell them apart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Identifier not present in the store, or key not present in its value bag
    #[error("invalid session ID")]
    InvalidSession,
}

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// Session store error
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// API error
    #[error("API error: {0}")]
    Api(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias for Core operations
pub type Result<T> = std::result::Result<T, CoreError>;
