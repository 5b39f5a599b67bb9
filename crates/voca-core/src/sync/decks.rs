//! Deck-level reconciliation

use std::collections::HashMap;

use super::{resolve, Reconciler, SyncStats};
use crate::config::OrphanWordPolicy;
use crate::db::{LibSqlVocabularyRepository, LibSqlWordRepository, VocabularyRepository, WordRepository};
use crate::error::{RemoteError, Result};
use crate::models::{ConflictWinner, RecordKind, Vocabulary, VocabularyId};
use crate::remote::{RecordRef, RemoteRecord, RemoteStore};

/// Local copy of a remote deck, carrying the remote version as its clock
fn materialized(remote: &RemoteRecord<Vocabulary>) -> Vocabulary {
    Vocabulary {
        updated_at: remote.modified_at,
        ..remote.record.clone()
    }
}

impl<R: RemoteStore> Reconciler<'_, R> {
    /// Returns the decks dropped because they are gone from the remote store.
    pub(super) async fn reconcile_vocabularies(
        &self,
        stats: &mut SyncStats,
    ) -> Result<Vec<VocabularyId>> {
        let remote = self.remote.fetch_all().await?;
        let repo = LibSqlVocabularyRepository::new(self.conn);

        let mut local: HashMap<VocabularyId, Vocabulary> = repo
            .list()
            .await?
            .into_iter()
            .map(|vocabulary| (vocabulary.id, vocabulary))
            .collect();
        let mut remote_versions: HashMap<VocabularyId, i64> = HashMap::new();

        for record in &remote {
            let id = record.record.id;
            remote_versions.insert(id, record.modified_at);

            let Some(current) = local.get(&id) else {
                let vocabulary = materialized(record);
                repo.insert(&vocabulary).await?;
                repo.mark_synced(&id, record.modified_at).await?;
                tracing::debug!(%id, "Materialized remote vocabulary");
                stats.materialized += 1;
                local.insert(id, vocabulary);
                continue;
            };

            self.log_conflict(
                RecordKind::Vocabulary,
                id.as_str(),
                current.updated_at,
                record.modified_at,
            )
            .await?;

            match resolve(current.updated_at, record.modified_at) {
                ConflictWinner::Local => {
                    repo.mark_synced(&id, record.modified_at).await?;
                    stats.kept_local += 1;
                }
                ConflictWinner::Remote => {
                    let vocabulary = self.replace_vocabulary(record).await?;
                    tracing::debug!(%id, "Replaced local vocabulary with newer remote copy");
                    stats.replaced += 1;
                    local.insert(id, vocabulary);
                }
            }
        }

        let deleted = self.drop_deleted_vocabularies(&remote_versions, stats).await?;
        if self.settings.push_local_changes {
            self.push_vocabularies(&remote_versions, stats).await?;
        }
        if self.settings.purge_tombstones {
            self.purge_vocabularies(&remote_versions, stats).await?;
        }
        Ok(deleted)
    }

    /// Purge live decks that were on the remote once and are missing now.
    async fn drop_deleted_vocabularies(
        &self,
        remote_versions: &HashMap<VocabularyId, i64>,
        stats: &mut SyncStats,
    ) -> Result<Vec<VocabularyId>> {
        let repo = LibSqlVocabularyRepository::new(self.conn);
        let mut deleted = Vec::new();

        for vocabulary in repo.list_active().await? {
            let id = vocabulary.id;
            if remote_versions.contains_key(&id) || repo.synced_at(&id).await?.is_none() {
                continue;
            }

            repo.purge(&id).await?;
            tracing::debug!(%id, "Dropped vocabulary deleted on another device");
            stats.deleted_remotely += 1;
            deleted.push(id);
        }
        Ok(deleted)
    }

    /// Purge the local deck and rematerialize it from the remote copy.
    async fn replace_vocabulary(&self, record: &RemoteRecord<Vocabulary>) -> Result<Vocabulary> {
        let id = record.record.id;
        let vocabularies = LibSqlVocabularyRepository::new(self.conn);
        let words = LibSqlWordRepository::new(self.conn);

        let orphans = match self.settings.orphan_words {
            OrphanWordPolicy::Discard => Vec::new(),
            OrphanWordPolicy::Preserve => words.list_all(&id).await?,
        };

        vocabularies.purge(&id).await?;
        let vocabulary = materialized(record);
        vocabularies.insert(&vocabulary).await?;
        vocabularies.mark_synced(&id, record.modified_at).await?;

        for word in &orphans {
            words.insert(word).await?;
        }
        if !orphans.is_empty() {
            tracing::debug!(%id, words = orphans.len(), "Carried local words over to replaced vocabulary");
        }
        Ok(vocabulary)
    }

    async fn push_vocabularies(
        &self,
        remote_versions: &HashMap<VocabularyId, i64>,
        stats: &mut SyncStats,
    ) -> Result<()> {
        let repo = LibSqlVocabularyRepository::new(self.conn);

        for vocabulary in repo.list_active().await? {
            let newer_locally = remote_versions
                .get(&vocabulary.id)
                .is_none_or(|modified_at| vocabulary.updated_at > *modified_at);
            if !newer_locally {
                continue;
            }

            match self.remote.save_vocabulary(&vocabulary).await {
                Ok(saved) => {
                    repo.stamp(&vocabulary.id, saved.modified_at).await?;
                    stats.pushed += 1;
                }
                Err(error) => {
                    tracing::warn!(id = %vocabulary.id, "Failed to push vocabulary: {error}");
                    stats.push_failures += 1;
                }
            }
        }
        Ok(())
    }

    async fn purge_vocabularies(
        &self,
        remote_versions: &HashMap<VocabularyId, i64>,
        stats: &mut SyncStats,
    ) -> Result<()> {
        let repo = LibSqlVocabularyRepository::new(self.conn);
        let tombstones = repo.list().await?.into_iter().filter(Vocabulary::is_deleted);

        for vocabulary in tombstones {
            let id = vocabulary.id;
            if let Some(modified_at) = remote_versions.get(&id) {
                if resolve(vocabulary.updated_at, *modified_at) == ConflictWinner::Remote {
                    continue;
                }
                match self.remote.delete(&RecordRef::Vocabulary(id)).await {
                    Ok(()) | Err(RemoteError::NotFound(_)) => {}
                    Err(error) => {
                        tracing::warn!(%id, "Failed to delete remote vocabulary: {error}");
                        stats.push_failures += 1;
                        continue;
                    }
                }
            }

            repo.purge(&id).await?;
            tracing::debug!(%id, "Purged vocabulary tombstone");
            stats.purged += 1;
        }
        Ok(())
    }
}
