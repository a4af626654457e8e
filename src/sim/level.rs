//! Per-attempt level state
//!
//! A `Level` is the explicit context every factory, dispatcher, trigger and
//! timer works against. It lives for one attempt at one level; restarting
//! builds a fresh one.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use glam::Vec2;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::controls::Controls;
use super::entity::{Entity, EntityId};
use super::motion::TiltConfig;
use super::physics::PhysicsWorld;
use super::projectile::ProjectilePool;
use super::score::{EndCallbacks, LevelPhase, LevelScore, LoseCountdown, VictoryGoals};
use super::timer::Timers;
use super::trigger::{HandlerId, HandlerRegistry, TriggerEvent};
use crate::assets::{AssetRegistry, SoundId};
use crate::game::Session;
use crate::settings::EngineConfig;

/// Something the host (renderer, audio, navigation) should react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PlaySound(SoundId),
    EntityRemoved { entity: EntityId, quiet: bool },
    GoodieCollected { goodie: EntityId, hero: EntityId },
    HeroArrived { hero: EntityId, destination: EntityId },
    HeroDefeated { hero: EntityId, text: String },
    EnemyDefeated { enemy: EntityId },
    ProjectileThrown { projectile: EntityId },
    LevelWon { text: String },
    LevelLost { text: String },
}

/// Pointer state carried between touch events
#[derive(Debug, Clone, Default)]
pub(crate) struct TouchState {
    pub dragging: Option<EntityId>,
    pub poke_selected: Option<EntityId>,
    /// Controls held down by the current press
    pub pressed: Vec<usize>,
}

/// One attempt at one level
pub struct Level {
    pub(crate) index: usize,
    pub(crate) config: EngineConfig,
    pub(crate) assets: Rc<AssetRegistry>,
    pub(crate) session: Rc<RefCell<Session>>,

    // === World ===
    pub(crate) physics: PhysicsWorld,
    pub(crate) entities: Vec<Entity>,
    pub(crate) pool: Option<ProjectilePool>,

    // === Score and outcome ===
    pub(crate) score: LevelScore,
    pub(crate) goals: VictoryGoals,
    pub(crate) phase: LevelPhase,
    pub(crate) lose_countdown: Option<LoseCountdown>,
    pub(crate) win_countdown: Option<f32>,
    pub(crate) end_callbacks: EndCallbacks,
    pub(crate) level_facts: HashMap<String, i32>,

    // === Scripted behavior ===
    pub(crate) timers: Timers,
    pub(crate) handlers: HandlerRegistry,
    pub(crate) pending: VecDeque<(HandlerId, TriggerEvent)>,
    pub(crate) flushing: bool,

    // === Input and motion ===
    pub(crate) paused: bool,
    pub(crate) controls: Controls,
    pub(crate) touch: TouchState,
    pub(crate) tilt: TiltConfig,
    pub(crate) last_tilt: Vec2,
    pub(crate) chase_clock: f32,

    pub(crate) events: Vec<GameEvent>,
    rng: Pcg32,
    pub(crate) elapsed: f32,
}

impl Level {
    /// Create an empty level. `index` is 1-based.
    pub fn new(
        index: usize,
        config: EngineConfig,
        assets: Rc<AssetRegistry>,
        session: Rc<RefCell<Session>>,
    ) -> Self {
        let rng = Pcg32::seed_from_u64(config.seed ^ index as u64);
        Self {
            index,
            physics: PhysicsWorld::new(config.gravity),
            config,
            assets,
            session,
            entities: Vec::new(),
            pool: None,
            score: LevelScore::default(),
            goals: VictoryGoals::default(),
            phase: LevelPhase::Active,
            lose_countdown: None,
            win_countdown: None,
            end_callbacks: EndCallbacks::default(),
            level_facts: HashMap::new(),
            timers: Timers::default(),
            handlers: HandlerRegistry::default(),
            pending: VecDeque::new(),
            flushing: false,
            paused: false,
            controls: Controls::default(),
            touch: TouchState::default(),
            tilt: TiltConfig::default(),
            last_tilt: Vec2::ZERO,
            chase_clock: 0.0,
            events: Vec::new(),
            rng,
            elapsed: 0.0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    pub fn gravity(&self) -> Vec2 {
        self.physics.gravity()
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.physics.set_gravity(gravity);
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Unpaused seconds since the level started
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Uniform integer in `0..max` from the level's seeded generator
    pub fn random(&mut self, max: i32) -> i32 {
        if max <= 0 {
            return 0;
        }
        self.rng.random_range(0..max)
    }

    // === Events ===

    /// Events recorded since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Take all recorded events; the host calls this once per frame
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn play_sound(&mut self, sound: SoundId) {
        self.events.push(GameEvent::PlaySound(sound));
    }
}

impl std::fmt::Debug for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Level")
            .field("index", &self.index)
            .field("phase", &self.phase)
            .field("entities", &self.entities.len())
            .field("score", &self.score)
            .field("paused", &self.paused)
            .finish_non_exhaustive()
    }
}
