//! Word repository implementation

use std::fmt::Display;

use crate::error::{Error, LocalStoreError, Result};
use crate::models::{VocabularyId, Word, WordId};
use crate::util::now_millis;
use libsql::params::IntoParams;
use libsql::{params, Connection, Row};

const COLUMNS: &str =
    "id, vocabulary_id, word, meaning, word_option, created_at, updated_at, deleted_at";

/// Trait for word storage operations
#[allow(async_fn_in_trait)]
pub trait WordRepository {
    /// List a deck's words, excluding soft-deleted ones, oldest first
    async fn list(&self, vocabulary_id: &VocabularyId) -> Result<Vec<Word>>;

    /// List a deck's words including tombstones
    async fn list_all(&self, vocabulary_id: &VocabularyId) -> Result<Vec<Word>>;

    /// Get a word by ID (tombstones included)
    async fn get(&self, id: &WordId) -> Result<Option<Word>>;

    /// Add a word to a live deck
    async fn add(
        &self,
        vocabulary_id: &VocabularyId,
        word: &str,
        meaning: &[String],
        option: &str,
    ) -> Result<Word>;

    /// Replace a word's text, senses and annotation
    async fn update(&self, id: &WordId, word: &str, meaning: &[String], option: &str)
        -> Result<Word>;

    /// Soft delete a word
    async fn soft_delete(&self, id: &WordId) -> Result<()>;

    /// Store a word exactly as given (used to materialize remote copies)
    async fn insert(&self, word: &Word) -> Result<()>;

    /// Overwrite `updated_at`, acknowledging a version accepted by the remote store
    async fn stamp(&self, id: &WordId, updated_at: i64) -> Result<()>;

    /// Record the remote version last seen for this record
    async fn mark_synced(&self, id: &WordId, modified_at: i64) -> Result<()>;

    /// Remote version last seen, `None` while the record has never been on the remote
    async fn synced_at(&self, id: &WordId) -> Result<Option<i64>>;

    /// Physically remove a word
    async fn purge(&self, id: &WordId) -> Result<()>;
}

/// libSQL implementation of `WordRepository`
pub struct LibSqlWordRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlWordRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a word from a database row
    fn parse_word(row: &Row) -> Result<Word> {
        let id: String = row.get(0)?;
        let vocabulary_id: String = row.get(1)?;
        let meaning: String = row.get(3)?;
        Ok(Word {
            id: id
                .parse()
                .map_err(|_| Error::InvalidInput(format!("Invalid word ID: {id}")))?,
            vocabulary_id: vocabulary_id.parse().map_err(|_| {
                Error::InvalidInput(format!("Invalid vocabulary ID: {vocabulary_id}"))
            })?,
            word: row.get(2)?,
            meaning: serde_json::from_str(&meaning)?,
            option: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
            deleted_at: row.get::<Option<i64>>(7)?,
        })
    }

    async fn query_words(&self, sql: &str, params: impl IntoParams) -> Result<Vec<Word>> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut words = Vec::new();
        while let Some(row) = rows.next().await? {
            words.push(Self::parse_word(&row)?);
        }
        Ok(words)
    }

    /// Bump the owning deck so a word edit makes the whole deck newer
    async fn touch_vocabulary(&self, vocabulary_id: &VocabularyId, now: i64) -> Result<()> {
        self.conn
            .execute(
                "UPDATE vocabularies SET updated_at = MAX(updated_at, ?) WHERE id = ?",
                params![now, vocabulary_id.as_str()],
            )
            .await
            .map_err(|error| {
                Error::from(LocalStoreError::VocabularySaveFailed(format!(
                    "{vocabulary_id}: {error}"
                )))
            })?;
        Ok(())
    }

    async fn vocabulary_is_live(&self, vocabulary_id: &VocabularyId) -> Result<bool> {
        let mut rows = self
            .conn
            .query(
                "SELECT EXISTS(SELECT 1 FROM vocabularies WHERE id = ? AND deleted_at IS NULL)",
                [vocabulary_id.as_str()],
            )
            .await?;
        Ok(match rows.next().await? {
            Some(row) => row.get::<i32>(0)? != 0,
            None => false,
        })
    }
}

fn save_failed(id: impl Display, error: &libsql::Error) -> Error {
    LocalStoreError::WordSaveFailed(format!("{id}: {error}")).into()
}

fn delete_failed(id: impl Display, error: &libsql::Error) -> Error {
    LocalStoreError::WordDeleteFailed(format!("{id}: {error}")).into()
}

fn not_found(id: &WordId) -> Error {
    LocalStoreError::WordNotFound(id.to_string()).into()
}

fn validate(word: &str, meaning: &[String]) -> Result<(String, Vec<String>)> {
    let word = word.trim();
    if word.is_empty() {
        return Err(Error::InvalidInput("Word cannot be empty".into()));
    }

    let meaning = meaning
        .iter()
        .map(|sense| sense.trim())
        .filter(|sense| !sense.is_empty())
        .map(str::to_string)
        .collect();

    Ok((word.to_string(), meaning))
}

impl WordRepository for LibSqlWordRepository<'_> {
    async fn list(&self, vocabulary_id: &VocabularyId) -> Result<Vec<Word>> {
        self.query_words(
            &format!(
                "SELECT {COLUMNS} FROM words
                 WHERE vocabulary_id = ? AND deleted_at IS NULL
                 ORDER BY created_at ASC"
            ),
            [vocabulary_id.as_str()],
        )
        .await
    }

    async fn list_all(&self, vocabulary_id: &VocabularyId) -> Result<Vec<Word>> {
        self.query_words(
            &format!(
                "SELECT {COLUMNS} FROM words WHERE vocabulary_id = ? ORDER BY created_at ASC"
            ),
            [vocabulary_id.as_str()],
        )
        .await
    }

    async fn get(&self, id: &WordId) -> Result<Option<Word>> {
        let found = self
            .query_words(
                &format!("SELECT {COLUMNS} FROM words WHERE id = ?"),
                [id.as_str()],
            )
            .await?;
        Ok(found.into_iter().next())
    }

    async fn add(
        &self,
        vocabulary_id: &VocabularyId,
        word: &str,
        meaning: &[String],
        option: &str,
    ) -> Result<Word> {
        let (word, meaning) = validate(word, meaning)?;
        if !self.vocabulary_is_live(vocabulary_id).await? {
            return Err(LocalStoreError::VocabularyNotFound(vocabulary_id.to_string()).into());
        }

        let word = Word::new(*vocabulary_id, word, meaning, option.trim());
        self.insert(&word).await?;
        self.touch_vocabulary(vocabulary_id, word.updated_at).await?;
        Ok(word)
    }

    async fn update(
        &self,
        id: &WordId,
        word: &str,
        meaning: &[String],
        option: &str,
    ) -> Result<Word> {
        let (word, meaning) = validate(word, meaning)?;
        let now = now_millis();

        let rows = self
            .conn
            .execute(
                "UPDATE words SET word = ?, meaning = ?, word_option = ?, updated_at = ?
                 WHERE id = ? AND deleted_at IS NULL",
                params![
                    word,
                    serde_json::to_string(&meaning)?,
                    option.trim(),
                    now,
                    id.as_str()
                ],
            )
            .await
            .map_err(|error| save_failed(id, &error))?;

        if rows == 0 {
            return Err(not_found(id));
        }

        let updated = self.get(id).await?.ok_or_else(|| not_found(id))?;
        self.touch_vocabulary(&updated.vocabulary_id, now).await?;
        Ok(updated)
    }

    async fn soft_delete(&self, id: &WordId) -> Result<()> {
        let now = now_millis();

        let rows = self
            .conn
            .execute(
                "UPDATE words SET deleted_at = ?, updated_at = ?
                 WHERE id = ? AND deleted_at IS NULL",
                params![now, now, id.as_str()],
            )
            .await
            .map_err(|error| delete_failed(id, &error))?;

        if rows == 0 {
            return Err(not_found(id));
        }

        if let Some(word) = self.get(id).await? {
            self.touch_vocabulary(&word.vocabulary_id, now).await?;
        }
        Ok(())
    }

    async fn insert(&self, word: &Word) -> Result<()> {
        self.conn
            .execute(
                &format!("INSERT INTO words ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"),
                params![
                    word.id.as_str(),
                    word.vocabulary_id.as_str(),
                    word.word.as_str(),
                    serde_json::to_string(&word.meaning)?,
                    word.option.as_str(),
                    word.created_at,
                    word.updated_at,
                    word.deleted_at
                ],
            )
            .await
            .map_err(|error| save_failed(word.id, &error))?;
        Ok(())
    }

    async fn stamp(&self, id: &WordId, updated_at: i64) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE words SET updated_at = ?, synced_at = ? WHERE id = ?",
                params![updated_at, updated_at, id.as_str()],
            )
            .await
            .map_err(|error| save_failed(id, &error))?;

        if rows == 0 {
            return Err(not_found(id));
        }

        Ok(())
    }

    async fn mark_synced(&self, id: &WordId, modified_at: i64) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE words SET synced_at = ? WHERE id = ?",
                params![modified_at, id.as_str()],
            )
            .await
            .map_err(|error| save_failed(id, &error))?;

        if rows == 0 {
            return Err(not_found(id));
        }

        Ok(())
    }

    async fn synced_at(&self, id: &WordId) -> Result<Option<i64>> {
        let mut rows = self
            .conn
            .query("SELECT synced_at FROM words WHERE id = ?", [id.as_str()])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<Option<i64>>(0)?),
            None => Err(not_found(id)),
        }
    }

    async fn purge(&self, id: &WordId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM words WHERE id = ?", [id.as_str()])
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
    use crate::db::{Database, LibSqlVocabularyRepository, VocabularyRepository};
    use crate::models::{Nationality, Vocabulary};
    use pretty_assertions::assert_eq;

    async fn setup() -> (Database, Vocabulary) {
        let db = Database::open_in_memory().await.unwrap();
        let voca = LibSqlVocabularyRepository::new(db.connection())
            .create("Animals", Nationality::French)
            .await
            .unwrap();
        (db, voca)
    }

    fn senses(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_add_and_list() {
        let (db, voca) = setup().await;
        let repo = LibSqlWordRepository::new(db.connection());

        let chat = repo
            .add(&voca.id, "chat", &senses(&["cat", "  "]), "m.")
            .await
            .unwrap();
        repo.add(&voca.id, "chien", &senses(&["dog"]), "m.")
            .await
            .unwrap();

        assert_eq!(chat.meaning, senses(&["cat"]));

        let words = repo.list(&voca.id).await.unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].word, "chat");
        assert_eq!(words[1].word, "chien");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_add_bumps_vocabulary_updated_at() {
        let (db, voca) = setup().await;
        let vocabularies = LibSqlVocabularyRepository::new(db.connection());
        vocabularies.stamp(&voca.id, 1).await.unwrap();

        let repo = LibSqlWordRepository::new(db.connection());
        let word = repo
            .add(&voca.id, "oiseau", &senses(&["bird"]), "")
            .await
            .unwrap();

        let deck = vocabularies.get(&voca.id).await.unwrap().unwrap();
        assert_eq!(deck.updated_at, word.updated_at);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_add_to_deleted_vocabulary_fails() {
        let (db, voca) = setup().await;
        LibSqlVocabularyRepository::new(db.connection())
            .soft_delete(&voca.id)
            .await
            .unwrap();

        let repo = LibSqlWordRepository::new(db.connection());
        let error = repo
            .add(&voca.id, "chat", &senses(&["cat"]), "")
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            Error::LocalStore(LocalStoreError::VocabularyNotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_update_word() {
        let (db, voca) = setup().await;
        let repo = LibSqlWordRepository::new(db.connection());

        let word = repo
            .add(&voca.id, "pomme", &senses(&["apple"]), "f.")
            .await
            .unwrap();
        let updated = repo
            .update(&word.id, "pomme", &senses(&["apple", "apple tree fruit"]), "f.")
            .await
            .unwrap();

        assert_eq!(updated.meaning.len(), 2);
        assert!(updated.updated_at >= word.updated_at);
        assert_eq!(updated.created_at, word.created_at);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_soft_delete_hides_word() {
        let (db, voca) = setup().await;
        let repo = LibSqlWordRepository::new(db.connection());

        let word = repo
            .add(&voca.id, "lapin", &senses(&["rabbit"]), "m.")
            .await
            .unwrap();
        repo.soft_delete(&word.id).await.unwrap();

        assert!(repo.list(&voca.id).await.unwrap().is_empty());
        let all = repo.list_all(&voca.id).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].is_deleted());

        assert!(repo
            .update(&word.id, "lapin", &senses(&["bunny"]), "")
            .await
            .is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_purging_vocabulary_cascades_to_words() {
        let (db, voca) = setup().await;
        let repo = LibSqlWordRepository::new(db.connection());

        let word = repo
            .add(&voca.id, "cheval", &senses(&["horse"]), "m.")
            .await
            .unwrap();
        LibSqlVocabularyRepository::new(db.connection())
            .purge(&voca.id)
            .await
            .unwrap();

        assert!(repo.get(&word.id).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_add_rejects_empty_word() {
        let (db, voca) = setup().await;
        let repo = LibSqlWordRepository::new(db.connection());

        let error = repo
            .add(&voca.id, " ", &senses(&["nothing"]), "")
            .await
            .unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stamp_records_remote_version() {
        let (db, voca) = setup().await;
        let repo = LibSqlWordRepository::new(db.connection());
        let word = repo
            .add(&voca.id, "poisson", &senses(&["fish"]), "m.")
            .await
            .unwrap();
        assert_eq!(repo.synced_at(&word.id).await.unwrap(), None);

        repo.stamp(&word.id, 7_000).await.unwrap();
        assert_eq!(repo.synced_at(&word.id).await.unwrap(), Some(7_000));

        repo.mark_synced(&word.id, 9_000).await.unwrap();
        let stored = repo.get(&word.id).await.unwrap().unwrap();
        assert_eq!(stored.updated_at, 7_000);
        assert_eq!(repo.synced_at(&word.id).await.unwrap(), Some(9_000));
    }
}
