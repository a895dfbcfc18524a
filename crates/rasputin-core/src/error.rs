use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by backends and their collaborators.
///
/// None of these reach the user as a failure: the settings store logs them and
/// carries on with whatever was applied.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed XML: {0}")]
    Xml(String),

    #[error("Invalid element path: {0}")]
    Path(String),

    #[error("Settings service error: {0}")]
    Service(String),

    #[error("Display server error: {0}")]
    Display(String),

    #[error("Command failed: {0}")]
    Command(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
