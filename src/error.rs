//! Error types for the fallible edges of the game (config files, score storage)
//!
//! The simulation itself never fails; invalid transitions are reported as
//! `bool` returns and collaborator failures are logged and dropped.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid tuning: {0}")]
    InvalidTuning(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("haptic driver failed: {0}")]
    Haptics(String),
}

pub type Result<T> = std::result::Result<T, Error>;
