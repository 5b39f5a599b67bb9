//! Vocabulary (deck) repository implementation

use std::fmt::Display;

use crate::error::{Error, LocalStoreError, Result};
use crate::models::{Nationality, Vocabulary, VocabularyId};
use crate::util::now_millis;
use libsql::params::IntoParams;
use libsql::{params, Connection, Row};

const COLUMNS: &str = "id, name, nationality, is_pinned, created_at, updated_at, deleted_at";

/// Trait for deck storage operations
#[allow(async_fn_in_trait)]
pub trait VocabularyRepository {
    /// List every deck including tombstones, most recently updated first
    async fn list(&self) -> Result<Vec<Vocabulary>>;

    /// List decks that are not soft-deleted, most recently updated first
    async fn list_active(&self) -> Result<Vec<Vocabulary>>;

    /// Get a deck by ID (tombstones included)
    async fn get(&self, id: &VocabularyId) -> Result<Option<Vocabulary>>;

    /// Create a new deck
    async fn create(&self, name: &str, nationality: Nationality) -> Result<Vocabulary>;

    /// Store a deck exactly as given (used to materialize remote copies)
    async fn insert(&self, vocabulary: &Vocabulary) -> Result<()>;

    /// Soft delete a deck
    async fn soft_delete(&self, id: &VocabularyId) -> Result<()>;

    /// Flip the pinned flag and return the updated deck
    async fn toggle_pinned(&self, id: &VocabularyId) -> Result<Vocabulary>;

    /// Overwrite `updated_at`, acknowledging a version accepted by the remote store
    async fn stamp(&self, id: &VocabularyId, updated_at: i64) -> Result<()>;

    /// Record the remote version last seen for this record
    async fn mark_synced(&self, id: &VocabularyId, modified_at: i64) -> Result<()>;

    /// Remote version last seen, `None` while the record has never been on the remote
    async fn synced_at(&self, id: &VocabularyId) -> Result<Option<i64>>;

    /// Physically remove a deck and, through the foreign key, its words
    async fn purge(&self, id: &VocabularyId) -> Result<()>;
}

/// libSQL implementation of `VocabularyRepository`
pub struct LibSqlVocabularyRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlVocabularyRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a deck from a database row
    fn parse_vocabulary(row: &Row) -> Result<Vocabulary> {
        let id: String = row.get(0)?;
        let nationality: String = row.get(2)?;
        Ok(Vocabulary {
            id: id
                .parse()
                .map_err(|_| Error::InvalidInput(format!("Invalid vocabulary ID: {id}")))?,
            name: row.get(1)?,
            nationality: nationality.parse()?,
            is_pinned: row.get::<i64>(3)? != 0,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
            deleted_at: row.get::<Option<i64>>(6)?,
        })
    }

    async fn query_vocabularies(
        &self,
        sql: &str,
        params: impl IntoParams,
    ) -> Result<Vec<Vocabulary>> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut vocabularies = Vec::new();
        while let Some(row) = rows.next().await? {
            vocabularies.push(Self::parse_vocabulary(&row)?);
        }
        Ok(vocabularies)
    }
}

fn save_failed(id: impl Display, error: &libsql::Error) -> Error {
    LocalStoreError::VocabularySaveFailed(format!("{id}: {error}")).into()
}

fn delete_failed(id: impl Display, error: &libsql::Error) -> Error {
    LocalStoreError::VocabularyDeleteFailed(format!("{id}: {error}")).into()
}

fn not_found(id: &VocabularyId) -> Error {
    LocalStoreError::VocabularyNotFound(id.to_string()).into()
}

impl VocabularyRepository for LibSqlVocabularyRepository<'_> {
    async fn list(&self) -> Result<Vec<Vocabulary>> {
        self.query_vocabularies(
            &format!("SELECT {COLUMNS} FROM vocabularies ORDER BY updated_at DESC"),
            (),
        )
        .await
    }

    async fn list_active(&self) -> Result<Vec<Vocabulary>> {
        self.query_vocabularies(
            &format!(
                "SELECT {COLUMNS} FROM vocabularies
                 WHERE deleted_at IS NULL
                 ORDER BY updated_at DESC"
            ),
            (),
        )
        .await
    }

    async fn get(&self, id: &VocabularyId) -> Result<Option<Vocabulary>> {
        let found = self
            .query_vocabularies(
                &format!("SELECT {COLUMNS} FROM vocabularies WHERE id = ?"),
                [id.as_str()],
            )
            .await?;
        Ok(found.into_iter().next())
    }

    async fn create(&self, name: &str, nationality: Nationality) -> Result<Vocabulary> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput(
                "Vocabulary name cannot be empty".into(),
            ));
        }

        let vocabulary = Vocabulary::new(name, nationality);
        self.insert(&vocabulary).await?;
        Ok(vocabulary)
    }

    async fn insert(&self, vocabulary: &Vocabulary) -> Result<()> {
        self.conn
            .execute(
                &format!("INSERT INTO vocabularies ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)"),
                params![
                    vocabulary.id.as_str(),
                    vocabulary.name.as_str(),
                    vocabulary.nationality.code(),
                    i64::from(vocabulary.is_pinned),
                    vocabulary.created_at,
                    vocabulary.updated_at,
                    vocabulary.deleted_at
                ],
            )
            .await
            .map_err(|error| save_failed(vocabulary.id, &error))?;
        Ok(())
    }

    async fn soft_delete(&self, id: &VocabularyId) -> Result<()> {
        let now = now_millis();

        let rows = self
            .conn
            .execute(
                "UPDATE vocabularies SET deleted_at = ?, updated_at = ?
                 WHERE id = ? AND deleted_at IS NULL",
                params![now, now, id.as_str()],
            )
            .await
            .map_err(|error| delete_failed(id, &error))?;

        if rows == 0 {
            return Err(not_found(id));
        }

        Ok(())
    }

    async fn toggle_pinned(&self, id: &VocabularyId) -> Result<Vocabulary> {
        let now = now_millis();

        let rows = self
            .conn
            .execute(
                "UPDATE vocabularies SET is_pinned = 1 - is_pinned, updated_at = ?
                 WHERE id = ? AND deleted_at IS NULL",
                params![now, id.as_str()],
            )
            .await
            .map_err(|error| save_failed(id, &error))?;

        if rows == 0 {
            return Err(not_found(id));
        }

        self.get(id).await?.ok_or_else(|| not_found(id))
    }

    async fn stamp(&self, id: &VocabularyId, updated_at: i64) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE vocabularies SET updated_at = ?, synced_at = ? WHERE id = ?",
                params![updated_at, updated_at, id.as_str()],
            )
            .await
            .map_err(|error| save_failed(id, &error))?;

        if rows == 0 {
            return Err(not_found(id));
        }

        Ok(())
    }

    async fn mark_synced(&self, id: &VocabularyId, modified_at: i64) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE vocabularies SET synced_at = ? WHERE id = ?",
                params![modified_at, id.as_str()],
            )
            .await
            .map_err(|error| save_failed(id, &error))?;

        if rows == 0 {
            return Err(not_found(id));
        }

        Ok(())
    }

    async fn synced_at(&self, id: &VocabularyId) -> Result<Option<i64>> {
        let mut rows = self
            .conn
            .query("SELECT synced_at FROM vocabularies WHERE id = ?", [id.as_str()])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<Option<i64>>(0)?),
            None => Err(not_found(id)),
        }
    }

    async fn purge(&self, id: &VocabularyId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM vocabularies WHERE id = ?", [id.as_str()])
            .await
            .map_err(|error| delete_failed(id, &error))?;

        if rows == 0 {
            return Err(not_found(id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_and_get() {
        let db = setup().await;
        let repo = LibSqlVocabularyRepository::new(db.connection());

        let voca = repo.create("  Travel  ", Nationality::English).await.unwrap();
        assert_eq!(voca.name, "Travel");

        let fetched = repo.get(&voca.id).await.unwrap().unwrap();
        assert_eq!(fetched, voca);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_rejects_blank_name() {
        let db = setup().await;
        let repo = LibSqlVocabularyRepository::new(db.connection());

        let error = repo.create("   ", Nationality::Korean).await.unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_soft_delete_keeps_tombstone() {
        let db = setup().await;
        let repo = LibSqlVocabularyRepository::new(db.connection());

        let keep = repo.create("Keep", Nationality::Korean).await.unwrap();
        let gone = repo.create("Gone", Nationality::Korean).await.unwrap();
        repo.soft_delete(&gone.id).await.unwrap();

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, keep.id);

        // Tombstone stays in the store until purged
        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 2);
        let tombstone = repo.get(&gone.id).await.unwrap().unwrap();
        assert!(tombstone.is_deleted());

        // Deleting twice reports not found
        let error = repo.soft_delete(&gone.id).await.unwrap_err();
        assert!(matches!(
            error,
            Error::LocalStore(LocalStoreError::VocabularyNotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_toggle_pinned() {
        let db = setup().await;
        let repo = LibSqlVocabularyRepository::new(db.connection());

        let voca = repo.create("Kanji", Nationality::Japanese).await.unwrap();
        let pinned = repo.toggle_pinned(&voca.id).await.unwrap();
        assert!(pinned.is_pinned);
        assert!(pinned.updated_at >= voca.updated_at);

        let unpinned = repo.toggle_pinned(&voca.id).await.unwrap();
        assert!(!unpinned.is_pinned);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_insert_duplicate_is_save_failure() {
        let db = setup().await;
        let repo = LibSqlVocabularyRepository::new(db.connection());

        let voca = Vocabulary::new("Dup", Nationality::French);
        repo.insert(&voca).await.unwrap();
        let error = repo.insert(&voca).await.unwrap_err();
        assert!(matches!(
            error,
            Error::LocalStore(LocalStoreError::VocabularySaveFailed(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stamp_and_purge() {
        let db = setup().await;
        let repo = LibSqlVocabularyRepository::new(db.connection());

        let voca = repo.create("Stamp", Nationality::English).await.unwrap();
        assert_eq!(repo.synced_at(&voca.id).await.unwrap(), None);

        repo.stamp(&voca.id, 42).await.unwrap();
        assert_eq!(repo.get(&voca.id).await.unwrap().unwrap().updated_at, 42);
        assert_eq!(repo.synced_at(&voca.id).await.unwrap(), Some(42));

        // Seeing a newer remote version leaves the local clock alone
        repo.mark_synced(&voca.id, 50).await.unwrap();
        assert_eq!(repo.get(&voca.id).await.unwrap().unwrap().updated_at, 42);
        assert_eq!(repo.synced_at(&voca.id).await.unwrap(), Some(50));

        repo.purge(&voca.id).await.unwrap();
        assert!(repo.get(&voca.id).await.unwrap().is_none());
        assert!(repo.purge(&voca.id).await.is_err());
    }
}
