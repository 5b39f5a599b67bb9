//! In-process remote store.
//!
//! Clones share state, so two services holding clones behave like two devices
//! talking to the same cloud account.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use super::{RecordRef, RemoteRecord, RemoteStore};
use crate::error::{RemoteError, RemoteResult};
use crate::models::{Vocabulary, VocabularyId, Word, WordId};
use crate::util::now_millis;

#[derive(Debug, Default)]
struct State {
    vocabularies: BTreeMap<VocabularyId, RemoteRecord<Vocabulary>>,
    words: BTreeMap<WordId, RemoteRecord<Word>>,
    last_modified_at: i64,
    offline: bool,
    reject_saves: bool,
}

impl State {
    /// Server clock: wall time, but never repeats or goes backwards.
    fn next_modified_at(&mut self) -> i64 {
        self.last_modified_at = now_millis().max(self.last_modified_at + 1);
        self.last_modified_at
    }

    fn ensure_online(&self) -> RemoteResult<()> {
        if self.offline {
            Err(RemoteError::Unreachable("remote store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Remote store kept in memory, with a monotonic modification clock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRemoteStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryRemoteStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    async fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().await
    }

    /// Make every call fail as unreachable until switched back
    pub async fn set_offline(&self, offline: bool) {
        self.state().await.offline = offline;
    }

    /// Make save calls fail while reads and deletes still work
    pub async fn set_reject_saves(&self, reject: bool) {
        self.state().await.reject_saves = reject;
    }

    /// Store a deck with an explicit modification time, as another device would have
    pub async fn seed_vocabulary(&self, vocabulary: Vocabulary, modified_at: i64) {
        let mut state = self.state().await;
        state.last_modified_at = state.last_modified_at.max(modified_at);
        state.vocabularies.insert(
            vocabulary.id,
            RemoteRecord {
                record: vocabulary,
                modified_at,
            },
        );
    }

    /// Store a word with an explicit modification time
    pub async fn seed_word(&self, word: Word, modified_at: i64) {
        let mut state = self.state().await;
        state.last_modified_at = state.last_modified_at.max(modified_at);
        state.words.insert(
            word.id,
            RemoteRecord {
                record: word,
                modified_at,
            },
        );
    }

    /// Current remote copy of a deck
    pub async fn vocabulary(&self, id: &VocabularyId) -> Option<RemoteRecord<Vocabulary>> {
        self.state().await.vocabularies.get(id).cloned()
    }

    /// Current remote copy of a word
    pub async fn word(&self, id: &WordId) -> Option<RemoteRecord<Word>> {
        self.state().await.words.get(id).cloned()
    }

    /// Number of deck records held
    pub async fn vocabulary_count(&self) -> usize {
        self.state().await.vocabularies.len()
    }
}

impl RemoteStore for InMemoryRemoteStore {
    async fn fetch_all(&self) -> RemoteResult<Vec<RemoteRecord<Vocabulary>>> {
        let state = self.state().await;
        state.ensure_online()?;
        Ok(state.vocabularies.values().cloned().collect())
    }

    async fn fetch_words(
        &self,
        vocabulary: &VocabularyId,
    ) -> RemoteResult<Vec<RemoteRecord<Word>>> {
        let state = self.state().await;
        state.ensure_online()?;
        Ok(state
            .words
            .values()
            .filter(|remote| remote.record.vocabulary_id == *vocabulary)
            .cloned()
            .collect())
    }

    async fn save_vocabulary(
        &self,
        vocabulary: &Vocabulary,
    ) -> RemoteResult<RemoteRecord<Vocabulary>> {
        let mut state = self.state().await;
        state.ensure_online()?;
        if state.reject_saves {
            return Err(RemoteError::SaveFailed(format!("vocabulary/{}", vocabulary.id)));
        }

        let remote = RemoteRecord {
            record: vocabulary.clone(),
            modified_at: state.next_modified_at(),
        };
        state.vocabularies.insert(vocabulary.id, remote.clone());
        Ok(remote)
    }

    async fn save_word(&self, word: &Word) -> RemoteResult<RemoteRecord<Word>> {
        let mut state = self.state().await;
        state.ensure_online()?;
        if state.reject_saves {
            return Err(RemoteError::SaveFailed(format!("word/{}", word.id)));
        }

        let remote = RemoteRecord {
            record: word.clone(),
            modified_at: state.next_modified_at(),
        };
        state.words.insert(word.id, remote.clone());
        Ok(remote)
    }

    async fn delete(&self, record: &RecordRef) -> RemoteResult<()> {
        let mut state = self.state().await;
        state.ensure_online()?;

        let removed = match record {
            RecordRef::Vocabulary(id) => {
                let removed = state.vocabularies.remove(id).is_some();
                state.words.retain(|_, remote| remote.record.vocabulary_id != *id);
                removed
            }
            RecordRef::Word(id) => state.words.remove(id).is_some(),
        };

        if removed {
            Ok(())
        } else {
            Err(RemoteError::NotFound(record.to_string()))
        }
    }
}
