use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a scan, copy or read as a whole. Per-entry trouble
/// during a transfer is collected as a warning instead.
#[derive(Error, Debug)]
pub enum FerryError {
    #[error("source does not exist: {0}")]
    SourceMissing(PathBuf),

    #[error("destination exists and is not a directory: {0}")]
    DestinationNotDirectory(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("no extrapolation possible: {requested:.3} precedes the earliest sample {earliest:.3}")]
    Extrapolation { requested: f64, earliest: f64 },

    /// The tree reader emitted events in an order the consumer cannot follow.
    #[error("event out of order: {0}")]
    EventOrder(String),
}

pub type Result<T> = std::result::Result<T, FerryError>;
