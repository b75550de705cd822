//! Session store with the durable tier in a JSON file.

use super::{MemorySessionStore, SessionStore, StorageTier};
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Durable tier persisted as a JSON object on disk; ephemeral tier in memory.
pub struct FileSessionStore {
    path: PathBuf,
    durable: Mutex<BTreeMap<String, String>>,
    ephemeral: MemorySessionStore,
}

impl FileSessionStore {
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let durable = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable session file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            durable: Mutex::new(durable),
            ephemeral: MemorySessionStore::new(),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(entries)?)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, tier: StorageTier, key: &str) -> Result<Option<String>> {
        match tier {
            StorageTier::Durable => Ok(self.durable.lock().get(key).cloned()),
            StorageTier::Ephemeral => self.ephemeral.get(tier, key),
        }
    }

    fn set(&self, tier: StorageTier, key: &str, value: &str) -> Result<()> {
        match tier {
            StorageTier::Durable => {
                let mut entries = self.durable.lock();
                entries.insert(key.to_string(), value.to_string());
                self.flush(&entries)
            }
            StorageTier::Ephemeral => self.ephemeral.set(tier, key, value),
        }
    }

    fn remove(&self, tier: StorageTier, key: &str) -> Result<()> {
        match tier {
            StorageTier::Durable => {
                let mut entries = self.durable.lock();
                if entries.remove(key).is_some() {
                    self.flush(&entries)?;
                }
                Ok(())
            }
            StorageTier::Ephemeral => self.ephemeral.remove(tier, key),
        }
    }
}
