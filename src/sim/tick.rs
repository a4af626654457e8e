//! Fixed timestep simulation tick
//!
//! Core game loop that advances one level deterministically.

use glam::Vec2;

use super::dispatch::resolve_contact;
use super::level::Level;
use crate::consts::SIM_DT;

/// Phase of a single finger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
}

/// One finger event, with both the HUD (screen) and world positions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    pub phase: TouchPhase,
    pub screen: Vec2,
    pub world: Vec2,
}

impl Touch {
    pub fn down(screen: Vec2, world: Vec2) -> Self {
        Self {
            phase: TouchPhase::Down,
            screen,
            world,
        }
    }

    pub fn moved(screen: Vec2, world: Vec2) -> Self {
        Self {
            phase: TouchPhase::Move,
            screen,
            world,
        }
    }

    pub fn up(screen: Vec2, world: Vec2) -> Self {
        Self {
            phase: TouchPhase::Up,
            screen,
            world,
        }
    }
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Latest accelerometer reading; `None` keeps the previous one
    pub tilt: Option<Vec2>,
    /// Pause toggle
    pub pause: bool,
    /// Finger events in arrival order
    pub touches: Vec<Touch>,
}

/// Advance the level by one fixed timestep
pub fn tick(level: &mut Level, input: &TickInput, dt: f32) {
    // Won and Lost are terminal
    if !level.phase().is_active() {
        return;
    }

    if input.pause {
        let paused = !level.is_paused();
        level.set_paused(paused);
    }
    let paused = level.is_paused();

    // Free pool slots before anything can throw this step
    level.cull_projectiles();

    if !paused {
        for touch in &input.touches {
            level.process_touch(touch);
            if !level.phase().is_active() {
                return;
            }
        }
        level.run_timers(dt);
        level.advance_countdowns(dt);
        level.decay_invincibility(dt);
        level.elapsed += dt;
    }
    if !level.phase().is_active() {
        return;
    }

    // Physics keeps running while paused
    level.update_facing();
    level.apply_drives(dt, if paused { None } else { input.tilt });
    let contacts = level.physics.step(dt);
    for contact in contacts {
        resolve_contact(level, contact.a, contact.b);
    }
    level.flush_triggers();
}

/// Turns variable frame times into whole fixed steps
#[derive(Debug, Default)]
pub struct FrameClock {
    accumulator: f32,
    /// Input that arrived but has not been consumed by a step yet
    pending: TickInput,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame. The frame time is clamped to the configured maximum;
    /// returns the number of steps taken.
    pub fn advance(&mut self, level: &mut Level, input: TickInput, frame_dt: f32) -> u32 {
        let frame_dt = frame_dt.clamp(0.0, level.config().max_frame_dt);
        self.accumulator += frame_dt;

        self.pending.pause ^= input.pause;
        if input.tilt.is_some() {
            self.pending.tilt = input.tilt;
        }
        self.pending.touches.extend(input.touches);

        let mut steps = 0;
        while self.accumulator >= SIM_DT {
            let step_input = std::mem::take(&mut self.pending);
            tick(level, &step_input, SIM_DT);
            self.accumulator -= SIM_DT;
            steps += 1;
        }
        steps
    }

    /// Drop leftover time and input, e.g. after a restart
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.pending = TickInput::default();
    }
}
