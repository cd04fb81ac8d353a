use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading the optional config file. Both are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

/// Rejected filter policy input.
#[derive(Error, Debug, PartialEq)]
pub enum PolicyError {
    #[error("minimum confidence must be a number or +inf, got {0}")]
    InvalidConfidence(f64),
}

/// The inference framework handed over a frame with no buffer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("frame {frame} has no buffer")]
pub struct FrameAccessError {
    pub frame: u64,
}

/// The external ROI refused to drop a detection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to remove '{label}' from frame: {reason}")]
pub struct RemovalError {
    pub label: String,
    pub reason: String,
}
