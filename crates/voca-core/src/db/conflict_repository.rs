//! Sync conflict log repository

use crate::error::Result;
use crate::models::SyncConflict;
use libsql::{params, Connection, Row};

/// Trait for the last-writer-wins conflict log
#[allow(async_fn_in_trait)]
pub trait ConflictRepository {
    /// Append a resolved conflict, returning its row id
    async fn record(&self, conflict: &SyncConflict) -> Result<i64>;

    /// List recently resolved conflicts, newest first
    async fn list(&self, limit: usize) -> Result<Vec<SyncConflict>>;
}

/// libSQL implementation of `ConflictRepository`
pub struct LibSqlConflictRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlConflictRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_conflict(row: &Row) -> Result<SyncConflict> {
        let record_kind: String = row.get(1)?;
        let winner: String = row.get(5)?;
        Ok(SyncConflict {
            id: row.get(0)?,
            record_kind: record_kind.parse()?,
            record_id: row.get(2)?,
            local_updated_at: row.get(3)?,
            remote_modified_at: row.get(4)?,
            winner: winner.parse()?,
            resolved_at: row.get(6)?,
        })
    }
}

impl ConflictRepository for LibSqlConflictRepository<'_> {
    async fn record(&self, conflict: &SyncConflict) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO sync_conflicts (
                    record_kind, record_id, local_updated_at, remote_modified_at, winner, resolved_at
                 ) VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    conflict.record_kind.as_str(),
                    conflict.record_id.as_str(),
                    conflict.local_updated_at,
                    conflict.remote_modified_at,
                    conflict.winner.as_str(),
                    conflict.resolved_at
                ],
            )
            .await?;
        Ok(self.conn.last_insert_rowid())
    }

    async fn list(&self, limit: usize) -> Result<Vec<SyncConflict>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut rows = self
            .conn
            .query(
                "SELECT id, record_kind, record_id, local_updated_at, remote_modified_at, winner, resolved_at
                 FROM sync_conflicts
                 ORDER BY resolved_at DESC, id DESC
                 LIMIT ?",
                [limit],
            )
            .await?;

        let mut conflicts = Vec::new();
        while let Some(row) = rows.next().await? {
            conflicts.push(Self::parse_conflict(&row)?);
        }
        Ok(conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{ConflictWinner, RecordKind};

    fn conflict(record_id: &str, resolved_at: i64, winner: ConflictWinner) -> SyncConflict {
        SyncConflict {
            id: 0,
            record_kind: RecordKind::Vocabulary,
            record_id: record_id.to_string(),
            local_updated_at: 10,
            remote_modified_at: 20,
            winner,
            resolved_at,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_record_and_list_newest_first() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlConflictRepository::new(db.connection());

        repo.record(&conflict("a", 100, ConflictWinner::Remote))
            .await
            .unwrap();
        repo.record(&conflict("b", 200, ConflictWinner::Local))
            .await
            .unwrap();

        let conflicts = repo.list(10).await.unwrap();
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].record_id, "b");
        assert_eq!(conflicts[0].winner, ConflictWinner::Local);
        assert_eq!(conflicts[1].record_kind, RecordKind::Vocabulary);

        assert_eq!(repo.list(1).await.unwrap().len(), 1);
    }
}
