//! Per-step motion: tilt, chase, fixed velocity, finger chase and poke moves
//!
//! Every entity has at most one active [`Drive`]. Drives run once per step,
//! before the physics step.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{EntityId, Role};
use super::level::Level;
use super::physics::BodyType;
use super::route::RouteDriver;
use crate::clamp_axes;
use crate::consts::ROUTE_EPSILON;

/// The single thing steering an entity
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Drive {
    #[default]
    None,
    /// Follows the level-wide tilt input
    Tilt,
    FixedVelocity(Vec2),
    Route(RouteDriver),
    Chase(Chase),
    /// Follows the finger while it is down
    FingerChase { speed: f32, target: Option<Vec2> },
    /// Heads for a point and stops there
    Seek { target: Vec2, speed: f32 },
}

/// How tilt input turns into motion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TiltConfig {
    /// Per-axis clamp applied after scaling
    pub max: Vec2,
    pub multiplier: f32,
    /// Set velocity directly instead of applying a force
    pub velocity_mode: bool,
}

impl Default for TiltConfig {
    fn default() -> Self {
        Self {
            max: Vec2::splat(10.0),
            multiplier: 1.0,
            velocity_mode: false,
        }
    }
}

impl TiltConfig {
    pub fn apply(&self, tilt: Vec2) -> Vec2 {
        clamp_axes(tilt * self.multiplier, self.max)
    }
}

/// Which axes a speed-based chase steers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChaseAxes {
    #[default]
    Both,
    XOnly,
    YOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ChaseMode {
    /// Normalized direction times `speed`; an unsteered axis keeps its velocity
    Speed { speed: f32, axes: ChaseAxes },
    /// Fixed speed toward the target on each given axis; `None` axes keep
    /// their velocity
    FixedMagnitude { x: Option<f32>, y: Option<f32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chase {
    pub target: EntityId,
    pub mode: ChaseMode,
}

impl Chase {
    /// Velocity for a chaser at `from` heading to `to`, given its `current`
    /// velocity
    pub fn steer(&self, from: Vec2, to: Vec2, current: Vec2) -> Vec2 {
        let delta = to - from;
        match self.mode {
            ChaseMode::Speed { speed, axes } => {
                let v = delta.normalize_or_zero() * speed;
                match axes {
                    ChaseAxes::Both => v,
                    ChaseAxes::XOnly => Vec2::new(v.x, current.y),
                    ChaseAxes::YOnly => Vec2::new(current.x, v.y),
                }
            }
            ChaseMode::FixedMagnitude { x, y } => Vec2::new(
                x.map_or(current.x, |m| m * signum_or_zero(delta.x)),
                y.map_or(current.y, |m| m * signum_or_zero(delta.y)),
            ),
        }
    }
}

fn signum_or_zero(v: f32) -> f32 {
    if v == 0.0 { 0.0 } else { v.signum() }
}

impl Level {
    // === Drive setup ===

    pub fn set_tilt(&mut self, max: Vec2, multiplier: f32) {
        self.tilt.max = max;
        self.tilt.multiplier = multiplier;
    }

    pub fn set_tilt_as_velocity(&mut self, velocity_mode: bool) {
        self.tilt.velocity_mode = velocity_mode;
    }

    pub fn tilt_config(&self) -> TiltConfig {
        self.tilt
    }

    /// Move at a constant velocity regardless of collisions
    pub fn set_fixed_velocity(&mut self, id: EntityId, velocity: Vec2) {
        self.make_movable(id);
        self.entity_mut(id).drive = Drive::FixedVelocity(velocity);
    }

    pub fn set_chase(&mut self, id: EntityId, target: EntityId, mode: ChaseMode) {
        self.make_movable(id);
        self.entity_mut(id).drive = Drive::Chase(Chase { target, mode });
    }

    /// Follow the finger at `speed` while it is down
    pub fn set_finger_chase(&mut self, id: EntityId, speed: f32) {
        self.make_movable(id);
        self.entity_mut(id).drive = Drive::FingerChase {
            speed,
            target: None,
        };
    }

    pub fn clear_drive(&mut self, id: EntityId) {
        self.entity_mut(id).drive = Drive::None;
    }

    pub fn drive(&self, id: EntityId) -> &Drive {
        &self.entity(id).drive
    }

    fn make_movable(&mut self, id: EntityId) {
        let body = self.entity(id).body;
        if self.physics.body_type(body) == BodyType::Static {
            self.physics.set_body_type(body, BodyType::Kinematic);
        }
    }

    /// Head for `center` at `speed`, replacing the current drive
    pub(crate) fn seek(&mut self, id: EntityId, center: Vec2, speed: f32) {
        self.make_movable(id);
        let half = self.entity(id).half_size();
        self.entity_mut(id).drive = Drive::Seek {
            target: center - half,
            speed,
        };
    }

    // === Per-step ===

    /// Run every enabled entity's drive for one step
    pub(crate) fn apply_drives(&mut self, dt: f32, tilt: Option<Vec2>) {
        if let Some(tilt) = tilt {
            self.last_tilt = tilt;
        }
        self.chase_clock += dt;
        let chase_due = self.chase_clock >= self.config.chase_interval;
        if chase_due {
            self.chase_clock = 0.0;
        }
        let tilt = self.tilt.apply(self.last_tilt);

        for i in 0..self.entities.len() {
            if !self.entities[i].enabled {
                continue;
            }
            let id = self.entities[i].id;
            let mut drive = std::mem::take(&mut self.entities[i].drive);
            let mut arrived = false;
            match &mut drive {
                Drive::None => {}
                Drive::Tilt => {
                    let body = self.entities[i].body;
                    if self.tilt.velocity_mode {
                        self.physics.set_velocity(body, tilt);
                    } else {
                        self.physics.set_force(body, tilt);
                    }
                }
                Drive::FixedVelocity(v) => self.set_velocity(id, *v),
                Drive::Route(driver) => {
                    let step = driver.update(self.position(id), dt);
                    self.apply_route_step(id, step);
                }
                Drive::Chase(chase) => {
                    if chase_due && self.is_enabled(chase.target) {
                        let v = chase.steer(
                            self.center(id),
                            self.center(chase.target),
                            self.velocity(id),
                        );
                        self.set_velocity(id, v);
                    }
                }
                Drive::FingerChase { speed, target } => {
                    let v = match target {
                        Some(t) => (*t - self.center(id)).normalize_or_zero() * *speed,
                        None => Vec2::ZERO,
                    };
                    self.set_velocity(id, v);
                }
                Drive::Seek { target, speed } => {
                    let pos = self.position(id);
                    if pos.distance(*target) <= (*speed * dt).max(ROUTE_EPSILON) {
                        self.set_position(id, *target);
                        self.set_velocity(id, Vec2::ZERO);
                        arrived = true;
                    } else {
                        let v = (*target - pos).normalize_or_zero() * *speed;
                        self.set_velocity(id, v);
                    }
                }
            }
            if arrived {
                drive = Drive::None;
            }
            // A drive may have been replaced by its own side effects
            let e = &mut self.entities[i];
            if matches!(e.drive, Drive::None) {
                e.drive = drive;
            }
        }

        self.carry_stuck_heroes();
    }

    /// Heroes on sticky obstacles move with them
    fn carry_stuck_heroes(&mut self) {
        for i in 0..self.entities.len() {
            let e = &self.entities[i];
            if !e.enabled {
                continue;
            }
            let Role::Hero(hero) = &e.role else {
                continue;
            };
            let Some(platform) = hero.stuck_to else {
                continue;
            };
            let id = e.id;
            if self.is_enabled(platform) {
                let v = self.velocity(platform);
                self.set_velocity(id, v);
            } else if let Some(hero) = self.hero_state(id) {
                hero.stuck_to = None;
            }
        }
    }
}
