//! voca-core - Core library for Voca
//!
//! This crate contains the shared models, local store, remote store
//! abstraction, deck grouping channel and reconciliation engine used by all
//! Voca interfaces.

pub mod channel;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod remote;
pub mod services;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Nationality, Vocabulary, VocabularyId, Word, WordId};
pub use services::VocabularyService;
