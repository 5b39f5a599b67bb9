//! Service layer used by every client.

mod vocabulary;

pub use vocabulary::VocabularyService;
