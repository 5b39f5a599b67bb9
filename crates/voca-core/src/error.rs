//! Error types for voca-core

use thiserror::Error;

/// Result type alias using voca-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in voca-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Local entity store error
    #[error("Local store error: {0}")]
    LocalStore(#[from] LocalStoreError),

    /// Remote record store error
    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Replication channel (key-value store) error
    #[error("Replication channel error: {0}")]
    Channel(String),

    /// A reconciliation pass is already running on this device
    #[error("A sync pass is already in progress")]
    SyncInProgress,
}

/// Failures of the on-device store, one per entity and operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocalStoreError {
    #[error("Vocabulary not found: {0}")]
    VocabularyNotFound(String),
    #[error("Failed to save vocabulary {0}")]
    VocabularySaveFailed(String),
    #[error("Failed to delete vocabulary {0}")]
    VocabularyDeleteFailed(String),
    #[error("Word not found: {0}")]
    WordNotFound(String),
    #[error("Failed to save word {0}")]
    WordSaveFailed(String),
    #[error("Failed to delete word {0}")]
    WordDeleteFailed(String),
}

/// Failures of the remote record store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Remote fetch failed: {0}")]
    FetchFailed(String),
    #[error("Remote save failed: {0}")]
    SaveFailed(String),
    #[error("Remote delete failed: {0}")]
    DeleteFailed(String),
    #[error("Remote record not found: {0}")]
    NotFound(String),
    #[error("Remote store unreachable: {0}")]
    Unreachable(String),
}

/// Result type alias for remote store operations
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;
