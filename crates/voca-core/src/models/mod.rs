//! Data models for Voca

mod sync_conflict;
mod vocabulary;
mod word;

pub use sync_conflict::{ConflictWinner, RecordKind, SyncConflict};
pub use vocabulary::{Nationality, Vocabulary, VocabularyId};
pub use word::{Word, WordId};
