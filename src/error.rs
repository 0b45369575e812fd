//! Error types for the dashboard.
//!
//! All fallible operations in this crate return [`Result<T>`], which uses
//! the [`Error`] enum for error variants.

/// Errors that can occur while running the dashboard.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File system or network I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error (config file).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The lease file could not be parsed.
    ///
    /// Carries the offending line number and a short description. Fatal at
    /// startup; during a scheduled refresh it never propagates and lands in
    /// the snapshot's `error` field instead.
    #[error("Invalid lease file: {0}")]
    LeaseParse(String),

    /// Invalid dashboard configuration.
    ///
    /// Returned by [`Config::validate`](crate::Config::validate) when the
    /// configuration contains invalid values (e.g., a zero refresh interval)
    /// or when no lease file path was supplied by any source.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP listener setup or serve error.
    ///
    /// Typically occurs when the configured address is already in use or
    /// cannot be bound without elevated privileges.
    #[error("Server error: {0}")]
    Server(String),
}

/// A specialized Result type for dashboard operations.
pub type Result<T> = std::result::Result<T, Error>;
