//! Level simulation
//!
//! Entities, contact resolution, triggers, timers and motion all hang off an
//! explicit [`Level`]. Replays are deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Contacts and entities processed in id order
//! - Nothing here draws or plays audio; the host reacts to [`GameEvent`]s

pub mod controls;
pub mod destination;
pub mod dispatch;
pub mod enemy;
pub mod entity;
pub mod goodie;
pub mod hero;
pub mod input;
pub mod level;
pub mod motion;
pub mod obstacle;
pub mod physics;
pub mod projectile;
pub mod route;
pub mod score;
pub mod tick;
pub mod timer;
pub mod trigger;

pub use controls::{ControlAction, Rect};
pub use destination::Destination;
pub use dispatch::{canonical, resolve_contact};
pub use enemy::Enemy;
pub use entity::{Entity, EntityId, EntityKind, Info, PokeMode, Role, Shape, Side, Sprite};
pub use goodie::Goodie;
pub use hero::{Hero, HeroTouch};
pub use level::{GameEvent, Level};
pub use motion::{Chase, ChaseAxes, ChaseMode, Drive, TiltConfig};
pub use obstacle::{Obstacle, SpeedBoost};
pub use physics::{BodyType, Material};
pub use projectile::{Projectile, ProjectilePool};
pub use route::{Route, RouteDriver, RouteStep};
pub use score::{EnemyGoal, LevelPhase, LevelScore, VictoryGoals};
pub use tick::{FrameClock, TickInput, Touch, TouchPhase, tick};
pub use timer::TimerId;
pub use trigger::{GoodieGate, HandlerId, TriggerEvent, TriggerHandler};

#[cfg(test)]
pub(crate) mod test_util {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::level::Level;
    use super::tick::{TickInput, tick};
    use crate::assets::AssetRegistry;
    use crate::consts::SIM_DT;
    use crate::game::Session;
    use crate::persistence::MemoryStore;
    use crate::settings::EngineConfig;

    pub fn test_assets() -> AssetRegistry {
        let mut assets = AssetRegistry::new();
        for image in ["hero.png", "enemy.png", "wall.png", "coin.png", "flag.png", "ball.png"] {
            assets.register_image(image);
        }
        for sound in ["jump.ogg", "pop.ogg", "win.ogg"] {
            assets.register_sound(sound);
        }
        assets
    }

    /// Level 1 with default config, the test assets and a fresh session
    pub fn test_level() -> Level {
        test_level_in(None).0
    }

    /// Level 1 sharing `session`, or a fresh one
    pub fn test_level_in(session: Option<Rc<RefCell<Session>>>) -> (Level, Rc<RefCell<Session>>) {
        let session = session
            .unwrap_or_else(|| Rc::new(RefCell::new(Session::new(Box::new(MemoryStore::new())))));
        let level = Level::new(
            1,
            EngineConfig::default(),
            Rc::new(test_assets()),
            session.clone(),
        );
        (level, session)
    }

    pub fn run_frames(level: &mut Level, frames: usize) {
        let input = TickInput::default();
        for _ in 0..frames {
            tick(level, &input, SIM_DT);
        }
    }
}
