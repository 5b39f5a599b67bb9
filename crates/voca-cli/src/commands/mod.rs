pub mod common;
pub mod completions;
pub mod export;
pub mod groups;
pub mod sync;
pub mod vocabulary;
pub mod words;
