//! Engine error types
//!
//! Only configuration mistakes surface as errors. Saturation (a full projectile
//! pool) and repeated win/lose calls are silent no-ops.

use thiserror::Error;

use crate::sim::EntityId;

/// Errors raised while configuring a level or the engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no image registered under \"{0}\"")]
    UnknownImage(String),

    #[error("no sound registered under \"{0}\"")]
    UnknownSound(String),

    #[error("level {index} is out of range (game has {count} levels)")]
    LevelOutOfRange { index: usize, count: usize },

    #[error("route needs at least 2 waypoints, got {0}")]
    InvalidRoute(usize),

    #[error("projectile pool size must be at least 1")]
    InvalidPoolSize,

    #[error("entity {entity} is not a {expected}")]
    WrongKind {
        entity: EntityId,
        expected: &'static str,
    },

    #[error("no projectile pool configured for this level")]
    NoProjectilePool,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
