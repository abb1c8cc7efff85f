//! Error types for the AI core.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Top-level error type for the squad AI core.
///
/// Restore paths do not error on unresolvable actor ids: stale members
/// and targets are dropped with a debug log instead, so a save taken
/// mid-battle still loads.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Binary encoding or decoding failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}
