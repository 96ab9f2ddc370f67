use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Fatal input/output errors
///
/// Findings about the configuration content are never reported through this
/// type, they are collected into a [`Report`](crate::Report) instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Error reading {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("{} is not writable: {source}", path.display())]
    NotWritable { path: PathBuf, source: io::Error },
    #[error("Error writing {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("Error creating backup in {}: {source}", path.display())]
    Backup { path: PathBuf, source: io::Error },
    #[error("Invalid settings file {}: {source}", path.display())]
    Settings {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Error serializing output: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Classify an I/O error hit while reading `path`
    pub(crate) fn on_read(path: PathBuf, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Error::NotFound(path),
            _ => Error::Read { path, source },
        }
    }
}
