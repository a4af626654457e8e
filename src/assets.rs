//! Asset name resolution
//!
//! The engine never loads files itself. The host registers every image and
//! sound it has loaded, and level code refers to them by name. An unknown name
//! is an authoring mistake and is reported at resolution time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Handle to a registered image or animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageId(pub u32);

/// Handle to a registered sound effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoundId(pub u32);

/// Maps asset names to handles
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    images: HashMap<String, ImageId>,
    sounds: HashMap<String, SoundId>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image name; re-registering returns the existing handle
    pub fn register_image(&mut self, name: &str) -> ImageId {
        let next = ImageId(self.images.len() as u32);
        *self.images.entry(name.to_string()).or_insert(next)
    }

    /// Register a sound name; re-registering returns the existing handle
    pub fn register_sound(&mut self, name: &str) -> SoundId {
        let next = SoundId(self.sounds.len() as u32);
        *self.sounds.entry(name.to_string()).or_insert(next)
    }

    /// Resolve an image name. The empty name means "no image".
    pub fn image(&self, name: &str) -> Result<Option<ImageId>> {
        if name.is_empty() {
            return Ok(None);
        }
        self.images
            .get(name)
            .copied()
            .map(Some)
            .ok_or_else(|| EngineError::UnknownImage(name.to_string()))
    }

    /// Resolve a sound name
    pub fn sound(&self, name: &str) -> Result<SoundId> {
        self.sounds
            .get(name)
            .copied()
            .ok_or_else(|| EngineError::UnknownSound(name.to_string()))
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn sound_count(&self) -> usize {
        self.sounds.len()
    }
}
