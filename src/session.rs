mod file;

pub use file::FileSessionStore;

use crate::error::Result;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Which storage tier a value lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageTier {
    /// Survives restarts ("remember me").
    Durable,
    /// Lives as long as the process.
    Ephemeral,
}

impl StorageTier {
    /// Both tiers, durable first.
    pub const ALL: [StorageTier; 2] = [StorageTier::Durable, StorageTier::Ephemeral];

    /// Tier selected by the "remember me" flag.
    pub fn for_remember(remember: bool) -> Self {
        if remember {
            StorageTier::Durable
        } else {
            StorageTier::Ephemeral
        }
    }
}

/// Key-value persistence for session state.
pub trait SessionStore: Send + Sync {
    /// Read a value.
    fn get(&self, tier: StorageTier, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, tier: StorageTier, key: &str, value: &str) -> Result<()>;

    /// Delete a value. Missing keys are not an error.
    fn remove(&self, tier: StorageTier, key: &str) -> Result<()>;
}

/// Both tiers held in memory. Useful for tests and one-shot commands.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<(StorageTier, String), String>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, tier: StorageTier, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(&(tier, key.to_string())).cloned())
    }

    fn set(&self, tier: StorageTier, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .insert((tier, key.to_string()), value.to_string());
        Ok(())
    }

    fn remove(&self, tier: StorageTier, key: &str) -> Result<()> {
        self.entries.lock().remove(&(tier, key.to_string()));
        Ok(())
    }
}
