//! Setup-time error types.
//!
//! A simulation tick never fails; these only cover loading settings and
//! building the worker pool.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while configuring or constructing a simulation
#[derive(Error, Debug)]
pub enum SimError {
    /// Settings file could not be read or written
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings JSON was malformed
    #[error("Settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The rayon thread pool could not be created
    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl SimError {
    /// Creates an I/O error tagged with the offending path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SimError::Io {
            path: path.into(),
            source,
        }
    }
}
