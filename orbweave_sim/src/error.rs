// Error types for the engine.
//
// Nothing in the per-tick path returns an error: bad rhythm arguments clamp,
// failed handlers are isolated by the bus, and degenerate vectors normalize
// to zero. What remains is configuration loading, the start guard, and the
// error a note handler may hand back to the bus.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToyError {
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("performance already started")]
    AlreadyStarted,
}

/// Failure reported by a note handler. The bus logs it and moves on to the
/// next subscriber.
#[derive(Debug, Error)]
#[error("note handler failed: {0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}
