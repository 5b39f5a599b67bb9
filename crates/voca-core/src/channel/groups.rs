//! Deck grouping kept in the replication channel.
//!
//! Every live deck id sits in exactly one list: pinned, or the list of its
//! language. Each list is stored under its own key as a JSON array of ids.

use std::fmt;

use tokio::sync::{broadcast, Mutex};

use super::{ExternalChange, KeyValueStore};
use crate::error::{Error, Result};
use crate::models::{Nationality, Vocabulary, VocabularyId};

/// One of the five replicated deck lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Pinned,
    Korean,
    English,
    Japanese,
    French,
}

impl Group {
    /// Lookup order used when removing an id.
    pub const ALL: [Self; 5] = [
        Self::Pinned,
        Self::Korean,
        Self::English,
        Self::Japanese,
        Self::French,
    ];

    /// Replication key. These names are shared with existing devices.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Pinned => "pinnedVocabularyIDs",
            Self::Korean => "koreanVocabularyIDs",
            Self::English => "englishVocabularyIDs",
            Self::Japanese => "japanishVocabularyIDs",
            Self::French => "frenchVocabularyIDs",
        }
    }

    /// Short lowercase label
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pinned => "pinned",
            Self::Korean => "korean",
            Self::English => "english",
            Self::Japanese => "japanese",
            Self::French => "french",
        }
    }

    pub const fn for_nationality(nationality: Nationality) -> Self {
        match nationality {
            Nationality::Korean => Self::Korean,
            Nationality::English => Self::English,
            Nationality::Japanese => Self::Japanese,
            Nationality::French => Self::French,
        }
    }

    /// The list a deck belongs in.
    pub const fn for_vocabulary(is_pinned: bool, nationality: Nationality) -> Self {
        if is_pinned {
            Self::Pinned
        } else {
            Self::for_nationality(nationality)
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Pinned => 0,
            Self::Korean => 1,
            Self::English => 2,
            Self::Japanese => 3,
            Self::French => 4,
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of all five lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupIndex {
    lists: [Vec<String>; 5],
}

impl GroupIndex {
    /// Ids in a list, in display order
    pub fn ids(&self, group: Group) -> &[String] {
        &self.lists[group.index()]
    }

    /// First list (in [`Group::ALL`] order) holding the id
    pub fn group_of(&self, id: &str) -> Option<Group> {
        Group::ALL
            .into_iter()
            .find(|group| self.ids(*group).iter().any(|held| held == id))
    }

    /// Every list holding the id
    pub fn groups_of(&self, id: &str) -> Vec<Group> {
        Group::ALL
            .into_iter()
            .filter(|group| self.ids(*group).iter().any(|held| held == id))
            .collect()
    }

    /// Total ids across all lists
    pub fn len(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.iter().all(Vec::is_empty)
    }

    fn list_mut(&mut self, group: Group) -> &mut Vec<String> {
        &mut self.lists[group.index()]
    }
}

/// Typed access to the deck lists over a [`KeyValueStore`].
#[derive(Debug)]
pub struct ReplicationChannel<S> {
    store: S,
    changes: Mutex<broadcast::Receiver<ExternalChange>>,
}

impl<S: KeyValueStore> ReplicationChannel<S> {
    pub fn new(store: S) -> Self {
        let changes = Mutex::new(store.subscribe());
        Self { store, changes }
    }

    /// Underlying store
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Read all five lists; a missing key reads as an empty list.
    pub fn load(&self) -> Result<GroupIndex> {
        let mut index = GroupIndex::default();
        for group in Group::ALL {
            if let Some(raw) = self.store.get(group.key())? {
                *index.list_mut(group) = serde_json::from_str(&raw)?;
            }
        }
        Ok(index)
    }

    /// Pull pending changes from other devices, then read all lists.
    pub fn reload(&self) -> Result<GroupIndex> {
        self.store.synchronize()?;
        self.load()
    }

    /// Append a new deck to its language list.
    pub fn add_vocabulary(&self, id: &VocabularyId, nationality: Nationality) -> Result<()> {
        let mut index = self.load()?;
        let id = id.as_str();
        let group = Group::for_nationality(nationality);
        let list = index.list_mut(group);
        if !list.contains(&id) {
            list.push(id);
            self.save(&index, &[group])?;
        }
        Ok(())
    }

    /// Remove the id from the first list that holds it.
    pub fn delete_vocabulary(&self, id: &VocabularyId) -> Result<Option<Group>> {
        let mut index = self.load()?;
        let id = id.as_str();
        let Some(group) = index.group_of(&id) else {
            return Ok(None);
        };

        let list = index.list_mut(group);
        if let Some(position) = list.iter().position(|held| *held == id) {
            list.remove(position);
        }
        self.save(&index, &[group])?;
        Ok(Some(group))
    }

    /// Put a removed id back at the end of the list it was taken from.
    pub fn restore_vocabulary(&self, id: &VocabularyId, group: Group) -> Result<()> {
        let mut index = self.load()?;
        let id = id.as_str();
        if index.group_of(&id).is_none() {
            index.list_mut(group).push(id);
            self.save(&index, &[group])?;
        }
        Ok(())
    }

    /// Move the id between the pinned list and its language list.
    ///
    /// Returns `true` when the deck ends up pinned.
    pub fn toggle_pinned(&self, id: &VocabularyId, nationality: Nationality) -> Result<bool> {
        let mut index = self.load()?;
        let id = id.as_str();
        let language = Group::for_nationality(nationality);

        if index.ids(Group::Pinned).contains(&id) {
            index.list_mut(Group::Pinned).retain(|held| *held != id);
            let list = index.list_mut(language);
            if !list.contains(&id) {
                list.push(id);
            }
            self.save(&index, &[Group::Pinned, language])?;
            return Ok(false);
        }

        index.list_mut(Group::Pinned).push(id.clone());
        // Clears every language list, not only the deck's own, so an id that
        // drifted into a foreign list is repaired too.
        let mut touched = vec![Group::Pinned];
        for group in &Group::ALL[1..] {
            let list = index.list_mut(*group);
            let before = list.len();
            list.retain(|held| *held != id);
            if list.len() != before {
                touched.push(*group);
            }
        }
        self.save(&index, &touched)?;
        Ok(true)
    }

    /// Empty every list.
    pub fn reset(&self) -> Result<()> {
        self.save(&GroupIndex::default(), &Group::ALL)
    }

    /// Rebuild the lists from the decks, keeping the relative order of ids
    /// that were already in the right list. Ids of unknown decks are dropped.
    pub fn reindex(&self, vocabularies: &[Vocabulary]) -> Result<GroupIndex> {
        let current = self.load()?;
        let mut rebuilt = GroupIndex::default();

        let placement = |id: &str| {
            vocabularies
                .iter()
                .find(|vocabulary| vocabulary.id.as_str() == id)
                .map(|vocabulary| Group::for_vocabulary(vocabulary.is_pinned, vocabulary.nationality))
        };

        for group in Group::ALL {
            for id in current.ids(group) {
                if placement(id) == Some(group) && rebuilt.group_of(id).is_none() {
                    rebuilt.list_mut(group).push(id.clone());
                }
            }
        }
        for vocabulary in vocabularies {
            let id = vocabulary.id.as_str();
            if rebuilt.group_of(&id).is_none() {
                let group = Group::for_vocabulary(vocabulary.is_pinned, vocabulary.nationality);
                rebuilt.list_mut(group).push(id);
            }
        }

        let changed: Vec<Group> = Group::ALL
            .into_iter()
            .filter(|group| current.ids(*group) != rebuilt.ids(*group))
            .collect();
        if !changed.is_empty() {
            self.save(&rebuilt, &changed)?;
        }
        Ok(rebuilt)
    }

    /// Synchronize and report whether another device changed the lists
    /// since the last check.
    pub async fn poll_external_changes(&self) -> Result<bool> {
        self.store.synchronize()?;
        let mut changes = self.changes.lock().await;
        let mut changed = false;
        loop {
            match changes.try_recv() {
                Ok(ExternalChange) | Err(broadcast::error::TryRecvError::Lagged(_)) => {
                    changed = true;
                }
                Err(broadcast::error::TryRecvError::Empty) => return Ok(changed),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(Error::Channel("change notifications closed".to_string()));
                }
            }
        }
    }

    /// Wait until another device changes the lists, then reload them.
    pub async fn wait_for_external_change(&self) -> Result<GroupIndex> {
        let mut changes = self.changes.lock().await;
        match changes.recv().await {
            Ok(ExternalChange) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => {
                return Err(Error::Channel("change notifications closed".to_string()));
            }
        }
        drop(changes);
        self.load()
    }

    /// Write the given lists. A failed write puts back the keys already
    /// written, so the stored lists never reflect half an operation.
    fn save(&self, index: &GroupIndex, groups: &[Group]) -> Result<()> {
        let mut written: Vec<(Group, Option<String>)> = Vec::with_capacity(groups.len());
        for group in groups {
            let previous = self.store.get(group.key())?;
            let value = serde_json::to_string(index.ids(*group))?;
            if let Err(error) = self.store.set(group.key(), value) {
                self.roll_back(written);
                return Err(error);
            }
            written.push((*group, previous));
        }
        self.store.synchronize()
    }

    fn roll_back(&self, written: Vec<(Group, Option<String>)>) {
        for (group, previous) in written.into_iter().rev() {
            let previous = previous.unwrap_or_else(|| "[]".to_string());
            if let Err(error) = self.store.set(group.key(), previous) {
                tracing::warn!(key = group.key(), %error, "Could not restore deck list");
            }
        }
    }
}
