//! Word model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::vocabulary::VocabularyId;
use crate::util::now_millis;

/// A unique identifier for a word, using UUID v7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WordId(Uuid);

impl WordId {
    /// Create a new unique word ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID.
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for WordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A word entry inside a deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// Unique word identifier.
    pub id: WordId,
    /// Deck this word belongs to.
    pub vocabulary_id: VocabularyId,
    /// The word itself.
    pub word: String,
    /// Senses, in the order the user entered them.
    pub meaning: Vec<String>,
    /// Free-form annotation (gender, reading, pronunciation).
    pub option: String,
    /// Creation timestamp (Unix ms).
    pub created_at: i64,
    /// Last update timestamp (Unix ms).
    pub updated_at: i64,
    /// Soft delete timestamp (Unix ms).
    pub deleted_at: Option<i64>,
}

impl Word {
    /// Create a new word in the given deck.
    pub fn new(
        vocabulary_id: VocabularyId,
        word: impl Into<String>,
        meaning: Vec<String>,
        option: impl Into<String>,
    ) -> Self {
        let now = now_millis();
        Self {
            id: WordId::new(),
            vocabulary_id,
            word: word.into(),
            meaning,
            option: option.into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Whether this record is a soft-deleted tombstone.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_new() {
        let deck = VocabularyId::new();
        let word = Word::new(deck, "chat", vec!["cat".into()], "m.");
        assert_eq!(word.vocabulary_id, deck);
        assert_eq!(word.meaning, vec!["cat".to_string()]);
        assert!(!word.is_deleted());
    }

    #[test]
    fn test_word_id_unique() {
        assert_ne!(WordId::new(), WordId::new());
    }
}
