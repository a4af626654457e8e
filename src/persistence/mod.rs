//! Integer progress storage
//!
//! The engine persists only integers under opaque keys: the highest unlocked
//! level and whatever "game facts" level scripts choose to keep across runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Get/set integer by key
pub trait ProgressStore {
    fn get_int(&self, key: &str, default: i32) -> i32;
    fn set_int(&mut self, key: &str, value: i32);
}

/// Volatile store (tests, demos, platforms without storage)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, i32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryStore {
    fn get_int(&self, key: &str, default: i32) -> i32 {
        self.values.get(key).copied().unwrap_or(default)
    }

    fn set_int(&mut self, key: &str, value: i32) {
        self.values.insert(key.to_string(), value);
    }
}

/// JSON file backed store; every write is flushed to disk
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: HashMap<String, i32>,
}

impl JsonFileStore {
    /// Open a store, starting fresh when the file does not exist yet
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let json = std::fs::read_to_string(&path)?;
            let values: HashMap<String, i32> = serde_json::from_str(&json)?;
            log::info!("Loaded {} stored values", values.len());
            values
        } else {
            log::info!("No progress file found, starting fresh");
            HashMap::new()
        };
        Ok(Self { path, values })
    }

    fn flush(&self) -> Result<()> {
        let json = serde_json::to_string(&self.values)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl ProgressStore for JsonFileStore {
    fn get_int(&self, key: &str, default: i32) -> i32 {
        self.values.get(key).copied().unwrap_or(default)
    }

    fn set_int(&mut self, key: &str, value: i32) {
        self.values.insert(key.to_string(), value);
        if let Err(e) = self.flush() {
            log::warn!("Failed to save progress: {e}");
        }
    }
}
