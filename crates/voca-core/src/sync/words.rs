//! Word-level reconciliation, run per live deck after the deck pass

use std::collections::HashMap;

use super::{resolve, Reconciler, SyncStats};
use crate::db::{LibSqlWordRepository, WordRepository};
use crate::error::{RemoteError, Result};
use crate::models::{ConflictWinner, RecordKind, Vocabulary, Word, WordId};
use crate::remote::{RecordRef, RemoteRecord, RemoteStore};

fn materialized(remote: &RemoteRecord<Word>, vocabulary: &Vocabulary) -> Word {
    Word {
        vocabulary_id: vocabulary.id,
        updated_at: remote.modified_at,
        ..remote.record.clone()
    }
}

impl<R: RemoteStore> Reconciler<'_, R> {
    pub(super) async fn reconcile_words(
        &self,
        vocabulary: &Vocabulary,
        stats: &mut SyncStats,
    ) -> Result<()> {
        let remote = self.remote.fetch_words(&vocabulary.id).await?;
        let repo = LibSqlWordRepository::new(self.conn);

        let mut local: HashMap<WordId, Word> = repo
            .list_all(&vocabulary.id)
            .await?
            .into_iter()
            .map(|word| (word.id, word))
            .collect();
        let mut remote_versions: HashMap<WordId, i64> = HashMap::new();

        for record in &remote {
            let id = record.record.id;
            remote_versions.insert(id, record.modified_at);

            let Some(current) = local.get(&id) else {
                let word = materialized(record, vocabulary);
                repo.insert(&word).await?;
                repo.mark_synced(&id, record.modified_at).await?;
                stats.words_materialized += 1;
                local.insert(id, word);
                continue;
            };

            self.log_conflict(
                RecordKind::Word,
                id.as_str(),
                current.updated_at,
                record.modified_at,
            )
            .await?;

            if resolve(current.updated_at, record.modified_at) == ConflictWinner::Remote {
                let word = materialized(record, vocabulary);
                repo.purge(&id).await?;
                repo.insert(&word).await?;
                tracing::debug!(%id, "Replaced local word with newer remote copy");
                stats.words_replaced += 1;
                local.insert(id, word);
            }
            repo.mark_synced(&id, record.modified_at).await?;
        }

        for word in local.values() {
            let remote_version = remote_versions.get(&word.id).copied();
            if word.is_deleted() {
                if self.settings.purge_tombstones {
                    self.purge_word(word, remote_version, stats).await?;
                }
                continue;
            }

            if remote_version.is_none() && repo.synced_at(&word.id).await?.is_some() {
                repo.purge(&word.id).await?;
                tracing::debug!(id = %word.id, "Dropped word deleted on another device");
                stats.words_deleted_remotely += 1;
            } else if self.settings.push_local_changes
                && remote_version.is_none_or(|modified_at| word.updated_at > modified_at)
            {
                match self.remote.save_word(word).await {
                    Ok(saved) => {
                        repo.stamp(&word.id, saved.modified_at).await?;
                        stats.words_pushed += 1;
                    }
                    Err(error) => {
                        tracing::warn!(id = %word.id, "Failed to push word: {error}");
                        stats.push_failures += 1;
                    }
                }
            }
        }
        Ok(())
    }

    async fn purge_word(
        &self,
        word: &Word,
        remote_version: Option<i64>,
        stats: &mut SyncStats,
    ) -> Result<()> {
        if let Some(modified_at) = remote_version {
            if resolve(word.updated_at, modified_at) == ConflictWinner::Remote {
                return Ok(());
            }
            match self.remote.delete(&RecordRef::Word(word.id)).await {
                Ok(()) | Err(RemoteError::NotFound(_)) => {}
                Err(error) => {
                    tracing::warn!(id = %word.id, "Failed to delete remote word: {error}");
                    stats.push_failures += 1;
                    return Ok(());
                }
            }
        }

        LibSqlWordRepository::new(self.conn).purge(&word.id).await?;
        stats.words_purged += 1;
        Ok(())
    }
}
