//! Cross-device key-value replication.
//!
//! A tiny, eventually-consistent store of string values shared by every device
//! of one user. Voca keeps the deck grouping (pinned and per-language lists)
//! here rather than in the record store.

mod file;
mod groups;
mod memory;

use tokio::sync::broadcast;

use crate::error::Result;

pub use file::FileKeyValueStore;
pub use groups::{Group, GroupIndex, ReplicationChannel};
pub use memory::InMemoryKeyValueStore;

/// Buffered notifications per subscriber before receivers start lagging
const CHANGE_BUFFER: usize = 16;

/// Signal that another device changed the store.
///
/// Carries no diff; consumers reload every key they care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalChange;

/// Trait for replicated key-value stores
pub trait KeyValueStore {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: String) -> Result<()>;

    /// Exchange pending changes with the other devices
    fn synchronize(&self) -> Result<()>;

    /// Subscribe to changes made by other devices
    fn subscribe(&self) -> broadcast::Receiver<ExternalChange>;
}

fn change_channel() -> broadcast::Sender<ExternalChange> {
    broadcast::channel(CHANGE_BUFFER).0
}
