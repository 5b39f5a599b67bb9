//! Vocabulary service: local store, remote store and deck groups together.

use std::path::PathBuf;
use std::sync::Arc;

use libsql::Connection;
use tokio::sync::Mutex;

use crate::channel::{GroupIndex, KeyValueStore, ReplicationChannel};
use crate::config::{RemotePropagation, SyncSettings};
use crate::db::{
    ConflictRepository, Database, LibSqlConflictRepository, LibSqlVocabularyRepository,
    LibSqlWordRepository, VocabularyRepository, WordRepository,
};
use crate::error::{Error, LocalStoreError, RemoteError, Result};
use crate::export::{render_words_export, ExportFormat};
use crate::models::{Nationality, SyncConflict, Vocabulary, VocabularyId, Word, WordId};
use crate::remote::{RecordRef, RemoteStore};
use crate::sync::{Reconciler, SyncReport};

/// Thread-safe service for deck and word operations.
pub struct VocabularyService<R, S> {
    db: Arc<Mutex<Database>>,
    remote: R,
    groups: ReplicationChannel<S>,
    propagation: RemotePropagation,
    sync_settings: SyncSettings,
    sync_lock: Mutex<()>,
}

impl<R: RemoteStore, S: KeyValueStore> VocabularyService<R, S> {
    /// Build a service over an open database.
    pub fn new(db: Database, remote: R, store: S) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            remote,
            groups: ReplicationChannel::new(store),
            propagation: RemotePropagation::default(),
            sync_settings: SyncSettings::default(),
            sync_lock: Mutex::new(()),
        }
    }

    /// Open a service backed by a database file at the given path.
    pub async fn open_path(db_path: impl Into<PathBuf>, remote: R, store: S) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::open(&db_path).await?;
        Ok(Self::new(db, remote, store))
    }

    /// Open a service over an in-memory database (primarily for tests).
    pub async fn open_in_memory(remote: R, store: S) -> Result<Self> {
        Ok(Self::new(Database::open_in_memory().await?, remote, store))
    }

    #[must_use]
    pub fn with_propagation(mut self, propagation: RemotePropagation) -> Self {
        self.propagation = propagation;
        self
    }

    #[must_use]
    pub fn with_sync_settings(mut self, settings: SyncSettings) -> Self {
        self.sync_settings = settings;
        self
    }

    pub const fn propagation(&self) -> RemotePropagation {
        self.propagation
    }

    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// Live decks, most recently updated first.
    pub async fn fetch_vocabulary_list(&self) -> Result<Vec<Vocabulary>> {
        let db = self.db.lock().await;
        LibSqlVocabularyRepository::new(db.connection())
            .list_active()
            .await
    }

    /// Fetch a live deck by id.
    pub async fn get_vocabulary(&self, id: &VocabularyId) -> Result<Vocabulary> {
        let db = self.db.lock().await;
        live_vocabulary(db.connection(), id).await
    }

    /// Create a deck and file it under its language.
    pub async fn create_vocabulary(&self, name: &str, nationality: Nationality) -> Result<Vocabulary> {
        let db = self.db.lock().await;
        let repo = LibSqlVocabularyRepository::new(db.connection());
        let vocabulary = repo.create(name, nationality).await?;
        if let Err(error) = self.groups.add_vocabulary(&vocabulary.id, nationality) {
            repo.purge(&vocabulary.id).await?;
            return Err(error);
        }
        tracing::info!(id = %vocabulary.id, "Created vocabulary");

        self.propagate_vocabulary(db.connection(), vocabulary).await
    }

    /// Pin an unpinned deck or unpin a pinned one.
    ///
    /// The pinned list decides; the stored flag is brought in line with it.
    pub async fn toggle_pinned(&self, id: &VocabularyId) -> Result<Vocabulary> {
        let db = self.db.lock().await;
        let repo = LibSqlVocabularyRepository::new(db.connection());
        let mut vocabulary = live_vocabulary(db.connection(), id).await?;

        let pinned = self.groups.toggle_pinned(id, vocabulary.nationality)?;
        if vocabulary.is_pinned != pinned {
            match repo.toggle_pinned(id).await {
                Ok(updated) => vocabulary = updated,
                Err(error) => {
                    self.groups.toggle_pinned(id, vocabulary.nationality)?;
                    return Err(error);
                }
            }
        }

        self.propagate_vocabulary(db.connection(), vocabulary).await
    }

    /// Soft-delete a deck and take it out of its group.
    pub async fn delete_vocabulary(&self, id: &VocabularyId) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlVocabularyRepository::new(db.connection());
        live_vocabulary(db.connection(), id).await?;

        let removed_from = self.groups.delete_vocabulary(id)?;
        if let Err(error) = repo.soft_delete(id).await {
            if let Some(group) = removed_from {
                self.groups.restore_vocabulary(id, group)?;
            }
            return Err(error);
        }
        tracing::info!(%id, "Deleted vocabulary");

        if self.propagation == RemotePropagation::WriteThrough
            && self.propagate_delete(RecordRef::Vocabulary(*id)).await
        {
            repo.purge(id).await?;
        }
        Ok(())
    }

    /// Live words of a deck, oldest first.
    pub async fn fetch_word_list(&self, vocabulary_id: &VocabularyId) -> Result<Vec<Word>> {
        let db = self.db.lock().await;
        LibSqlWordRepository::new(db.connection())
            .list(vocabulary_id)
            .await
    }

    /// Add a word to a deck.
    pub async fn add_word(
        &self,
        vocabulary_id: &VocabularyId,
        word: &str,
        meaning: &[String],
        option: &str,
    ) -> Result<Word> {
        let db = self.db.lock().await;
        let word = LibSqlWordRepository::new(db.connection())
            .add(vocabulary_id, word, meaning, option)
            .await?;
        self.propagate_word(db.connection(), word).await
    }

    /// Replace a word's text, senses and option.
    pub async fn update_word(
        &self,
        id: &WordId,
        word: &str,
        meaning: &[String],
        option: &str,
    ) -> Result<Word> {
        let db = self.db.lock().await;
        let word = LibSqlWordRepository::new(db.connection())
            .update(id, word, meaning, option)
            .await?;
        self.propagate_word(db.connection(), word).await
    }

    /// Soft-delete a word.
    pub async fn delete_word(&self, id: &WordId) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlWordRepository::new(db.connection());
        repo.soft_delete(id).await?;

        if self.propagation == RemotePropagation::WriteThrough {
            let Some(word) = repo.get(id).await? else {
                return Ok(());
            };
            if self.propagate_delete(RecordRef::Word(*id)).await {
                repo.purge(id).await?;
            }
            self.propagate_owner(db.connection(), &word.vocabulary_id)
                .await?;
        }
        Ok(())
    }

    /// Reconcile with the remote store.
    ///
    /// Only one pass runs at a time; a second caller gets
    /// [`Error::SyncInProgress`] instead of waiting. When nothing is left
    /// after the pass, the deck groups are cleared as well.
    pub async fn sync(&self) -> Result<SyncReport> {
        let _sync_guard = self.sync_lock.try_lock().map_err(|_| Error::SyncInProgress)?;

        let report = {
            let db = self.db.lock().await;
            Reconciler::new(db.connection(), &self.remote, self.sync_settings)
                .run()
                .await?
        };

        if report.vocabularies.is_empty() {
            tracing::info!("No vocabularies after sync; clearing deck groups");
            self.groups.reset()?;
        } else {
            for id in &report.deleted_remotely {
                self.groups.delete_vocabulary(id)?;
            }
        }
        Ok(report)
    }

    /// Current deck groups as last seen locally.
    pub fn groups(&self) -> Result<GroupIndex> {
        self.groups.load()
    }

    /// Pull group changes from other devices and return the lists.
    pub fn reload_groups(&self) -> Result<GroupIndex> {
        self.groups.reload()
    }

    /// Whether another device changed the groups since the last check.
    pub async fn poll_group_changes(&self) -> Result<bool> {
        self.groups.poll_external_changes().await
    }

    /// Wait for another device to change the groups.
    pub async fn wait_for_group_change(&self) -> Result<GroupIndex> {
        self.groups.wait_for_external_change().await
    }

    /// Rebuild the groups from the live decks' pinned flag and language.
    pub async fn reindex_groups(&self) -> Result<GroupIndex> {
        let vocabularies = self.fetch_vocabulary_list().await?;
        self.groups.reindex(&vocabularies)
    }

    /// List recently resolved sync conflicts.
    pub async fn list_conflicts(&self, limit: usize) -> Result<Vec<SyncConflict>> {
        let db = self.db.lock().await;
        LibSqlConflictRepository::new(db.connection())
            .list(limit)
            .await
    }

    /// Render a deck's live words.
    pub async fn export_words(
        &self,
        vocabulary_id: &VocabularyId,
        format: ExportFormat,
    ) -> Result<String> {
        let db = self.db.lock().await;
        let vocabulary = live_vocabulary(db.connection(), vocabulary_id).await?;
        let words = LibSqlWordRepository::new(db.connection())
            .list(vocabulary_id)
            .await?;
        Ok(render_words_export(&vocabulary, &words, format)?)
    }

    async fn propagate_vocabulary(
        &self,
        conn: &Connection,
        mut vocabulary: Vocabulary,
    ) -> Result<Vocabulary> {
        if self.propagation != RemotePropagation::WriteThrough {
            return Ok(vocabulary);
        }

        match self.remote.save_vocabulary(&vocabulary).await {
            Ok(saved) => {
                LibSqlVocabularyRepository::new(conn)
                    .stamp(&vocabulary.id, saved.modified_at)
                    .await?;
                vocabulary.updated_at = saved.modified_at;
            }
            Err(error) => {
                tracing::warn!(id = %vocabulary.id, "Remote save failed, next sync will retry: {error}");
            }
        }
        Ok(vocabulary)
    }

    /// Push a word and its (touched) owning deck.
    async fn propagate_word(&self, conn: &Connection, mut word: Word) -> Result<Word> {
        if self.propagation != RemotePropagation::WriteThrough {
            return Ok(word);
        }

        self.propagate_owner(conn, &word.vocabulary_id).await?;
        match self.remote.save_word(&word).await {
            Ok(saved) => {
                LibSqlWordRepository::new(conn)
                    .stamp(&word.id, saved.modified_at)
                    .await?;
                word.updated_at = saved.modified_at;
            }
            Err(error) => {
                tracing::warn!(id = %word.id, "Remote save failed, next sync will retry: {error}");
            }
        }
        Ok(word)
    }

    async fn propagate_owner(&self, conn: &Connection, vocabulary_id: &VocabularyId) -> Result<()> {
        if let Some(vocabulary) = LibSqlVocabularyRepository::new(conn)
            .get(vocabulary_id)
            .await?
        {
            if !vocabulary.is_deleted() {
                self.propagate_vocabulary(conn, vocabulary).await?;
            }
        }
        Ok(())
    }

    /// Delete remotely; `true` when the remote copy is gone.
    async fn propagate_delete(&self, record: RecordRef) -> bool {
        match self.remote.delete(&record).await {
            Ok(()) | Err(RemoteError::NotFound(_)) => true,
            Err(error) => {
                tracing::warn!(%record, "Remote delete failed, next sync will retry: {error}");
                false
            }
        }
    }
}

async fn live_vocabulary(conn: &Connection, id: &VocabularyId) -> Result<Vocabulary> {
    LibSqlVocabularyRepository::new(conn)
        .get(id)
        .await?
        .filter(|vocabulary| !vocabulary.is_deleted())
        .ok_or_else(|| LocalStoreError::VocabularyNotFound(id.to_string()).into())
}
