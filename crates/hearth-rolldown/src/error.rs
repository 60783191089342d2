use std::path::PathBuf;

/// Error types for the Rolldown engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from the Rolldown bundler, rendered from its diagnostics.
    #[error("Rolldown bundler error: {0}")]
    Bundler(String),

    /// A scoped stylesheet failed to parse or print.
    #[error("Failed to process stylesheet {}: {}", .path.display(), .message)]
    Stylesheet { path: PathBuf, message: String },

    /// The file watcher could not be started.
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// The directory to watch does not exist.
    #[error("Watch root not found: {}", .0.display())]
    WatchRootMissing(PathBuf),

    /// The dev server could not bind its address.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error raised by the hook pipeline.
    #[error(transparent)]
    Pipeline(#[from] hearth::Error),
}

/// Result type alias for hearth-rolldown operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a bundler error from a Rolldown error batch.
    pub fn from_rolldown_batch(error: &dyn std::fmt::Debug) -> Self {
        Error::Bundler(format!("{error:?}"))
    }
}

impl From<Error> for hearth::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Pipeline(inner) => inner,
            Error::Io(inner) => hearth::Error::Io(inner),
            other => hearth::Error::engine(other),
        }
    }
}

pub(crate) fn bind_error(addr: String, source: std::io::Error) -> Error {
    Error::Bind { addr, source }
}
