//! Reconciliation between the local store and the remote record store.
//!
//! Resolution is whole-record last-writer-wins on numeric timestamps: the
//! local `updated_at` against the remote `modified_at`, with ties going to the
//! local copy. A record replaced by a newer remote copy is purged and
//! re-materialized under the same id, stamped with the remote time so the
//! next pass sees a tie.
//!
//! Every record remembers the last remote version it was seen at. A live
//! record that was on the remote before and is now missing was deleted by
//! another device, so it is purged locally instead of being pushed again.

mod decks;
mod words;

use libsql::Connection;
use serde::Serialize;

use crate::config::SyncSettings;
use crate::db::{
    ConflictRepository, LibSqlConflictRepository, LibSqlVocabularyRepository, VocabularyRepository,
};
use crate::error::Result;
use crate::models::{ConflictWinner, RecordKind, SyncConflict, Vocabulary, VocabularyId};
use crate::remote::RemoteStore;
use crate::util::now_millis;

/// Counters for one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    /// Decks that existed only remotely
    pub materialized: usize,
    /// Local decks replaced by a newer remote copy
    pub replaced: usize,
    /// Decks present on both sides where the local copy won
    pub kept_local: usize,
    /// Decks written to the remote store
    pub pushed: usize,
    /// Deck tombstones removed from both sides
    pub purged: usize,
    /// Local decks dropped because another device deleted them remotely
    pub deleted_remotely: usize,
    /// Words that existed only remotely
    pub words_materialized: usize,
    /// Local words replaced by a newer remote copy
    pub words_replaced: usize,
    /// Words written to the remote store
    pub words_pushed: usize,
    /// Word tombstones removed from both sides
    pub words_purged: usize,
    /// Local words dropped because another device deleted them remotely
    pub words_deleted_remotely: usize,
    /// Remote writes or deletes that failed and will be retried next pass
    pub push_failures: usize,
}

impl SyncStats {
    /// Number of records changed on either side
    pub const fn changes(&self) -> usize {
        self.materialized
            + self.replaced
            + self.pushed
            + self.purged
            + self.deleted_remotely
            + self.words_materialized
            + self.words_replaced
            + self.words_pushed
            + self.words_purged
            + self.words_deleted_remotely
    }
}

/// Outcome of a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Live decks after the pass, newest first
    pub vocabularies: Vec<Vocabulary>,
    /// Decks removed locally because they are gone from the remote store
    pub deleted_remotely: Vec<VocabularyId>,
    pub stats: SyncStats,
}

/// Which side a present-on-both-sides record resolves to.
const fn resolve(local_updated_at: i64, remote_modified_at: i64) -> ConflictWinner {
    if local_updated_at >= remote_modified_at {
        ConflictWinner::Local
    } else {
        ConflictWinner::Remote
    }
}

/// One reconciliation pass over a local connection and a remote store
pub struct Reconciler<'a, R> {
    conn: &'a Connection,
    remote: &'a R,
    settings: SyncSettings,
}

impl<'a, R: RemoteStore> Reconciler<'a, R> {
    pub const fn new(conn: &'a Connection, remote: &'a R, settings: SyncSettings) -> Self {
        Self {
            conn,
            remote,
            settings,
        }
    }

    /// Run the deck pass, then the word pass for every live deck.
    ///
    /// A failed remote fetch aborts the pass. Everything persisted before the
    /// failure stays, and the next pass picks up where this one stopped.
    pub async fn run(&self) -> Result<SyncReport> {
        let mut stats = SyncStats::default();

        let deleted_remotely = self.reconcile_vocabularies(&mut stats).await?;

        let vocabularies = LibSqlVocabularyRepository::new(self.conn)
            .list_active()
            .await?;
        for vocabulary in &vocabularies {
            self.reconcile_words(vocabulary, &mut stats).await?;
        }

        tracing::info!(
            decks = vocabularies.len(),
            changes = stats.changes(),
            push_failures = stats.push_failures,
            "Sync pass finished"
        );
        Ok(SyncReport {
            vocabularies,
            deleted_remotely,
            stats,
        })
    }

    async fn log_conflict(
        &self,
        record_kind: RecordKind,
        record_id: String,
        local_updated_at: i64,
        remote_modified_at: i64,
    ) -> Result<()> {
        if local_updated_at == remote_modified_at {
            return Ok(());
        }
        let winner = resolve(local_updated_at, remote_modified_at);
        tracing::debug!(%record_kind, %record_id, winner = winner.as_str(), "Resolved conflict");
        LibSqlConflictRepository::new(self.conn)
            .record(&SyncConflict {
                id: 0,
                record_kind,
                record_id,
                local_updated_at,
                remote_modified_at,
                winner,
                resolved_at: now_millis(),
            })
            .await?;
        Ok(())
    }
}
