use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] voca_core::Error),
    #[error(transparent)]
    Remote(#[from] voca_core::error::RemoteError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Deck name cannot be empty")]
    EmptyName,
    #[error("Word cannot be empty")]
    EmptyWord,
    #[error("At least one non-empty meaning is required")]
    EmptyMeaning,
    #[error("ID cannot be empty")]
    EmptyIdentifier,
    #[error("Deck not found for id/prefix: {0}")]
    VocabularyNotFound(String),
    #[error("Word not found for id/prefix: {0}")]
    WordNotFound(String),
    #[error("{0}")]
    AmbiguousId(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "Sync is not configured. Set VOCA_REMOTE_URL and VOCA_REMOTE_TOKEN, or add a `remote` section to the config file."
    )]
    SyncNotConfigured,
}
