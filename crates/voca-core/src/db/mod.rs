//! Local entity store for Voca

mod conflict_repository;
mod connection;
mod migrations;
mod vocabulary_repository;
mod word_repository;

pub use conflict_repository::{ConflictRepository, LibSqlConflictRepository};
pub use connection::Database;
pub use vocabulary_repository::{LibSqlVocabularyRepository, VocabularyRepository};
pub use word_repository::{LibSqlWordRepository, WordRepository};
