//! Core error types for clockblock-core.
//!
//! Engine operations are total over in-memory integers and never fail.
//! Everything in this module belongs to the input boundary: schedule
//! entry, configuration, and persistence.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for clockblock-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Schedule-related errors
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Heartbeat ingestion errors
    #[error("Heartbeat error: {0}")]
    Heartbeat(#[from] HeartbeatError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Schedule-entry errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Time-of-day text is not a valid `HH:MM` value
    #[error("Invalid window time '{value}': {reason}")]
    InvalidWindow { value: String, reason: String },

    /// A replacement schedule did not contain exactly seven days
    #[error("Invalid schedule shape: expected 7 days, got {len}")]
    InvalidScheduleShape { len: usize },

    /// Day index outside 0..=6
    #[error("Day index {index} out of range (expected 0-6)")]
    IndexOutOfRange { index: usize },
}

/// Rejected heartbeat payloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeartbeatError {
    /// One heartbeat reported more minutes than a single poll can cover
    #[error("minutes_delta {delta} exceeds the per-heartbeat limit of {max}")]
    DeltaTooLarge { delta: u32, max: u32 },
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
