//! LOL Engine - a small 2D physics game framework
//!
//! Core modules:
//! - `sim`: Entities, collision dispatch, triggers, timers, projectiles, routes
//! - `game`: Level navigation shell (start, restart, finish, unlock progress)
//! - `assets`: Name to handle resolution for images and sounds
//! - `persistence`: Integer progress storage
//! - `settings`: Data-driven engine configuration

pub mod assets;
pub mod error;
pub mod game;
pub mod persistence;
pub mod settings;
pub mod sim;

pub use assets::{AssetRegistry, ImageId, SoundId};
pub use error::{EngineError, Result};
pub use game::{Game, LevelScript};
pub use settings::EngineConfig;

use glam::Vec2;

/// Engine constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Largest frame delta handed to the physics step
    pub const MAX_FRAME_DT: f32 = 1.0 / 20.0;

    /// Number of independent goodie score channels
    pub const GOODIE_CHANNELS: usize = 4;

    /// Hero defaults
    pub const DEFAULT_HERO_STRENGTH: i32 = 1;
    /// Enemy defaults
    pub const DEFAULT_ENEMY_DAMAGE: i32 = 2;
    /// Destination defaults
    pub const DEFAULT_DESTINATION_CAPACITY: u32 = 1;
    /// Projectile defaults
    pub const DEFAULT_PROJECTILE_STRENGTH: i32 = 1;

    /// Default body material
    pub const DEFAULT_DENSITY: f32 = 1.0;
    pub const DEFAULT_ELASTICITY: f32 = 0.0;
    pub const DEFAULT_FRICTION: f32 = 0.0;

    /// Chase steering is recomputed at most this often (seconds)
    pub const CHASE_UPDATE_INTERVAL: f32 = 0.1;

    /// Slack when deciding that a hero landed on top of an enemy
    pub const STOMP_TOLERANCE: f32 = 0.05;

    /// Distance at which a route waypoint counts as reached
    pub const ROUTE_EPSILON: f32 = 1.0e-3;
}

/// Clamp each axis of `v` into `[-max, max]` independently
#[inline]
pub fn clamp_axes(v: Vec2, max: Vec2) -> Vec2 {
    Vec2::new(v.x.clamp(-max.x, max.x), v.y.clamp(-max.y, max.y))
}

/// Angle (radians) of the direction a velocity points in
#[inline]
pub fn heading(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_axes_independent() {
        let v = clamp_axes(Vec2::new(12.0, -3.0), Vec2::new(5.0, 10.0));
        assert_eq!(v, Vec2::new(5.0, -3.0));
    }

    #[test]
    fn test_heading() {
        assert_eq!(heading(Vec2::X), 0.0);
        assert!((heading(Vec2::new(0.0, 2.0)) - std::f32::consts::FRAC_PI_2).abs() < 1.0e-6);
    }
}
