//! Remote (cloud) record store.
//!
//! The remote side keeps the same decks and words as the local store, each
//! wrapped with a modification timestamp that only the remote service assigns.

mod http;
mod memory;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::RemoteResult;
use crate::models::{Vocabulary, VocabularyId, Word, WordId};
use crate::util::parse_timestamp;

pub use http::HttpRemoteStore;
pub use memory::InMemoryRemoteStore;

/// A record as stored remotely, with the service-assigned modification time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord<T> {
    /// Record payload
    pub record: T,
    /// Modification timestamp assigned by the remote service (Unix ms).
    ///
    /// Services that still send a textual timestamp are accepted too.
    #[serde(deserialize_with = "deserialize_modified_at")]
    pub modified_at: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

fn deserialize_modified_at<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(millis) => Ok(millis),
        RawTimestamp::Text(text) => parse_timestamp(&text).ok_or_else(|| {
            serde::de::Error::custom(format!("unrecognized timestamp: {text}"))
        }),
    }
}

/// Reference to a remote record, used for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordRef {
    Vocabulary(VocabularyId),
    Word(WordId),
}

impl std::fmt::Display for RecordRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vocabulary(id) => write!(f, "vocabulary/{id}"),
            Self::Word(id) => write!(f, "word/{id}"),
        }
    }
}

/// Trait for remote record store operations
///
/// Every call is independent; a failure affects only the record it names.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Fetch every deck record
    async fn fetch_all(&self) -> RemoteResult<Vec<RemoteRecord<Vocabulary>>>;

    /// Fetch every word record belonging to a deck
    async fn fetch_words(&self, vocabulary: &VocabularyId)
        -> RemoteResult<Vec<RemoteRecord<Word>>>;

    /// Create or overwrite a deck record
    async fn save_vocabulary(&self, vocabulary: &Vocabulary)
        -> RemoteResult<RemoteRecord<Vocabulary>>;

    /// Create or overwrite a word record
    async fn save_word(&self, word: &Word) -> RemoteResult<RemoteRecord<Word>>;

    /// Delete a record
    async fn delete(&self, record: &RecordRef) -> RemoteResult<()>;
}

/// Placeholder for services running without any remote store.
///
/// Every call fails as unreachable, so reconciliation reports the remote as
/// unavailable and leaves the local view alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemote;

impl RemoteStore for NoRemote {
    async fn fetch_all(&self) -> RemoteResult<Vec<RemoteRecord<Vocabulary>>> {
        Err(unconfigured())
    }

    async fn fetch_words(&self, _: &VocabularyId) -> RemoteResult<Vec<RemoteRecord<Word>>> {
        Err(unconfigured())
    }

    async fn save_vocabulary(&self, _: &Vocabulary) -> RemoteResult<RemoteRecord<Vocabulary>> {
        Err(unconfigured())
    }

    async fn save_word(&self, _: &Word) -> RemoteResult<RemoteRecord<Word>> {
        Err(unconfigured())
    }

    async fn delete(&self, _: &RecordRef) -> RemoteResult<()> {
        Err(unconfigured())
    }
}

fn unconfigured() -> crate::error::RemoteError {
    crate::error::RemoteError::Unreachable("no remote store configured".to_string())
}
