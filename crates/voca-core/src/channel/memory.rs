//! In-process key-value store with one handle per simulated device.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;

use super::{change_channel, ExternalChange, KeyValueStore};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct Hub {
    values: HashMap<String, String>,
    devices: Vec<(usize, broadcast::Sender<ExternalChange>)>,
    next_device: usize,
    /// Writes left before the next one is rejected
    writes_before_failure: Option<usize>,
}

/// Key-value store shared between device handles.
///
/// A write through one handle is visible to all of them and raises an
/// [`ExternalChange`] on every other handle.
#[derive(Debug)]
pub struct InMemoryKeyValueStore {
    hub: Arc<Mutex<Hub>>,
    device: usize,
    changes: broadcast::Sender<ExternalChange>,
}

impl InMemoryKeyValueStore {
    /// Create a store with a single device attached
    pub fn new() -> Self {
        Self::attach(Arc::new(Mutex::new(Hub::default())))
    }

    /// Attach another device to the same store
    #[must_use]
    pub fn connect_device(&self) -> Self {
        Self::attach(Arc::clone(&self.hub))
    }

    fn attach(hub: Arc<Mutex<Hub>>) -> Self {
        let changes = change_channel();
        let device = {
            let mut state = hub.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let device = state.next_device;
            state.next_device += 1;
            state.devices.push((device, changes.clone()));
            device
        };
        Self {
            hub,
            device,
            changes,
        }
    }

    /// Let `writes` more writes through, then reject exactly one.
    pub fn fail_write_after(&self, writes: usize) -> Result<()> {
        self.hub()?.writes_before_failure = Some(writes);
        Ok(())
    }

    fn hub(&self) -> Result<MutexGuard<'_, Hub>> {
        self.hub
            .lock()
            .map_err(|_| Error::Channel("key-value store lock poisoned".to_string()))
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InMemoryKeyValueStore {
    fn drop(&mut self) {
        if let Ok(mut hub) = self.hub.lock() {
            hub.devices.retain(|(device, _)| *device != self.device);
        }
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.hub()?.values.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let mut hub = self.hub()?;
        match hub.writes_before_failure {
            Some(0) => {
                hub.writes_before_failure = None;
                return Err(Error::Channel(format!("write to {key} rejected")));
            }
            Some(left) => hub.writes_before_failure = Some(left - 1),
            None => {}
        }
        if hub.values.get(key) == Some(&value) {
            return Ok(());
        }
        hub.values.insert(key.to_string(), value);
        for (device, sender) in &hub.devices {
            if *device != self.device {
                // No subscribers on that device is fine
                let _ = sender.send(ExternalChange);
            }
        }
        Ok(())
    }

    fn synchronize(&self) -> Result<()> {
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ExternalChange> {
        self.changes.subscribe()
    }
}
