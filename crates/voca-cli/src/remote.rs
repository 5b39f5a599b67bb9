//! Remote store selection for the CLI.

use voca_core::config::RemoteConfig;
use voca_core::error::RemoteResult;
use voca_core::remote::{HttpRemoteStore, NoRemote, RecordRef, RemoteRecord, RemoteStore};
use voca_core::{Vocabulary, VocabularyId, Word};

/// HTTP store when credentials are present, otherwise a store that is
/// always unreachable.
#[derive(Debug, Clone)]
pub enum CliRemote {
    Http(HttpRemoteStore),
    Disabled(NoRemote),
}

impl CliRemote {
    pub fn from_config(config: &RemoteConfig) -> RemoteResult<Self> {
        if config.is_configured() {
            Ok(Self::Http(HttpRemoteStore::from_config(config)?))
        } else {
            Ok(Self::Disabled(NoRemote))
        }
    }

    pub const fn is_enabled(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

impl RemoteStore for CliRemote {
    async fn fetch_all(&self) -> RemoteResult<Vec<RemoteRecord<Vocabulary>>> {
        match self {
            Self::Http(store) => store.fetch_all().await,
            Self::Disabled(store) => store.fetch_all().await,
        }
    }

    async fn fetch_words(&self, vocabulary: &VocabularyId) -> RemoteResult<Vec<RemoteRecord<Word>>> {
        match self {
            Self::Http(store) => store.fetch_words(vocabulary).await,
            Self::Disabled(store) => store.fetch_words(vocabulary).await,
        }
    }

    async fn save_vocabulary(&self, vocabulary: &Vocabulary) -> RemoteResult<RemoteRecord<Vocabulary>> {
        match self {
            Self::Http(store) => store.save_vocabulary(vocabulary).await,
            Self::Disabled(store) => store.save_vocabulary(vocabulary).await,
        }
    }

    async fn save_word(&self, word: &Word) -> RemoteResult<RemoteRecord<Word>> {
        match self {
            Self::Http(store) => store.save_word(word).await,
            Self::Disabled(store) => store.save_word(word).await,
        }
    }

    async fn delete(&self, record: &RecordRef) -> RemoteResult<()> {
        match self {
            Self::Http(store) => store.delete(record).await,
            Self::Disabled(store) => store.delete(record).await,
        }
    }
}
