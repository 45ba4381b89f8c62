use std::path::PathBuf;

use thiserror::Error;

use crate::identity::Game;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Wrong file! Didn't recognize CRC: {checksum}. Maybe this is not a supported version or the patch was already applied.")]
    UnrecognizedBuild { checksum: u32 },

    #[error("This is an old version of {game}. Update the game and run the patch again.")]
    OutdatedBuild { game: Game },

    #[error("Game is not found: {0}")]
    GameNotFound(PathBuf),

    #[error("No backup is found at {0}")]
    BackupMissing(PathBuf),

    #[error("Invalid range {start:#x}..{end:#x} for a buffer of {len} bytes")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("Invalid resolution: {0}")]
    InvalidResolution(String),

    #[error("Pattern not found: {label}")]
    PatternNotFound { label: &'static str },

    #[error("Could not detect the display resolution: {0}")]
    DisplayDetection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::GameNotFound(_))
            || matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
