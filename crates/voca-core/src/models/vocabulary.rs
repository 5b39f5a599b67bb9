//! Vocabulary (deck) model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;
use crate::util::now_millis;

/// A unique identifier for a vocabulary deck, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VocabularyId(Uuid);

impl VocabularyId {
    /// Create a new unique vocabulary ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for VocabularyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VocabularyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VocabularyId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Language a deck is studied in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nationality {
    #[serde(rename = "KO")]
    Korean,
    #[serde(rename = "EN")]
    English,
    #[serde(rename = "JA")]
    Japanese,
    #[serde(rename = "FR")]
    French,
}

impl Nationality {
    /// Every supported language, in group-list order.
    pub const ALL: [Self; 4] = [Self::Korean, Self::English, Self::Japanese, Self::French];

    /// Two-letter code stored with the record.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Korean => "KO",
            Self::English => "EN",
            Self::Japanese => "JA",
            Self::French => "FR",
        }
    }
}

impl fmt::Display for Nationality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Nationality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|nationality| nationality.code() == code)
            .ok_or_else(|| Error::InvalidInput(format!("Unsupported nationality: {s}")))
    }
}

/// A named deck of words studied in one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Unique identifier
    pub id: VocabularyId,
    /// Display name
    pub name: String,
    /// Language of the deck
    pub nationality: Nationality,
    /// Pinned to the top of the deck list
    pub is_pinned: bool,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
    /// Soft delete timestamp (Unix ms); a tombstone when set
    pub deleted_at: Option<i64>,
}

impl Vocabulary {
    /// Create a new, unpinned deck
    #[must_use]
    pub fn new(name: impl Into<String>, nationality: Nationality) -> Self {
        let now = now_millis();
        Self {
            id: VocabularyId::new(),
            name: name.into(),
            nationality,
            is_pinned: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Whether this record is a soft-deleted tombstone
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_id_parse() {
        let id = VocabularyId::new();
        let parsed: VocabularyId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_vocabulary_new() {
        let voca = Vocabulary::new("Verbs", Nationality::French);
        assert_eq!(voca.name, "Verbs");
        assert!(!voca.is_pinned);
        assert!(!voca.is_deleted());
        assert_eq!(voca.created_at, voca.updated_at);
    }

    #[test]
    fn test_nationality_codes() {
        assert_eq!("en".parse::<Nationality>().unwrap(), Nationality::English);
        assert_eq!("JA".parse::<Nationality>().unwrap(), Nationality::Japanese);
        assert!("DE".parse::<Nationality>().is_err());
        assert_eq!(
            serde_json::to_string(&Nationality::Korean).unwrap(),
            "\"KO\""
        );
    }
}
