//! Level navigation shell
//!
//! A [`Game`] owns everything that outlives a single attempt at a level: the
//! engine config, the asset registry, session facts and the progress store.
//! Starting a level (or restarting one) always builds a fresh [`Level`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::assets::AssetRegistry;
use crate::error::{EngineError, Result};
use crate::persistence::ProgressStore;
use crate::settings::EngineConfig;
use crate::sim::{Level, LevelPhase};

/// State shared by every level attempt of one run of the game
pub struct Session {
    facts: HashMap<String, i32>,
    store: Box<dyn ProgressStore>,
}

impl Session {
    pub fn new(store: Box<dyn ProgressStore>) -> Self {
        Self {
            facts: HashMap::new(),
            store,
        }
    }

    pub fn fact(&self, key: &str, default: i32) -> i32 {
        self.facts.get(key).copied().unwrap_or(default)
    }

    pub fn put_fact(&mut self, key: &str, value: i32) {
        self.facts.insert(key.to_string(), value);
    }

    pub fn store(&self) -> &dyn ProgressStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn ProgressStore {
        self.store.as_mut()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("facts", &self.facts)
            .finish_non_exhaustive()
    }
}

/// Builds the contents of one level
pub trait LevelScript {
    fn build(&mut self, level: &mut Level) -> Result<()>;
}

impl<F> LevelScript for F
where
    F: FnMut(&mut Level) -> Result<()>,
{
    fn build(&mut self, level: &mut Level) -> Result<()> {
        self(level)
    }
}

pub struct Game {
    config: EngineConfig,
    assets: Rc<AssetRegistry>,
    session: Rc<RefCell<Session>>,
}

impl Game {
    pub fn new(config: EngineConfig, assets: AssetRegistry, store: Box<dyn ProgressStore>) -> Self {
        log::info!(
            "Game ready: {} levels, {} images, {} sounds",
            config.level_count,
            assets.image_count(),
            assets.sound_count()
        );
        Self {
            config,
            assets: Rc::new(assets),
            session: Rc::new(RefCell::new(Session::new(store))),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    pub fn session(&self) -> &Rc<RefCell<Session>> {
        &self.session
    }

    /// Highest level the player may choose (1-based, at least 1)
    pub fn unlocked_level(&self) -> usize {
        let stored = self
            .session
            .borrow()
            .store()
            .get_int(&self.config.unlock_key, 1);
        (stored.max(1) as usize).min(self.config.level_count.max(1))
    }

    pub fn is_unlocked(&self, index: usize) -> bool {
        index >= 1 && index <= self.unlocked_level()
    }

    /// Build a fresh attempt at level `index` (1-based). Restarting a level is
    /// just starting it again.
    pub fn start_level(&self, index: usize, script: &mut impl LevelScript) -> Result<Level> {
        let count = self.config.level_count;
        if index == 0 || index > count {
            return Err(EngineError::LevelOutOfRange { index, count });
        }
        let mut level = Level::new(
            index,
            self.config.clone(),
            self.assets.clone(),
            self.session.clone(),
        );
        script.build(&mut level)?;
        log::info!("Level {index} started with {} entities", level.entity_count());
        Ok(level)
    }

    /// Record the outcome of an attempt. A win unlocks the next level.
    pub fn finish_level(&mut self, level: &Level) -> LevelPhase {
        let phase = level.phase();
        match phase {
            LevelPhase::Won => {
                let next = (level.index() + 1).min(self.config.level_count);
                if next > self.unlocked_level() {
                    self.session
                        .borrow_mut()
                        .store_mut()
                        .set_int(&self.config.unlock_key, next as i32);
                    log::info!("Unlocked level {next}");
                }
            }
            LevelPhase::Lost => log::info!("Level {} lost", level.index()),
            LevelPhase::Active => log::warn!("Level {} finished while still active", level.index()),
        }
        phase
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn game(levels: usize) -> Game {
        let config = EngineConfig {
            level_count: levels,
            ..Default::default()
        };
        let mut assets = AssetRegistry::new();
        assets.register_image("hero.png");
        assets.register_image("flag.png");
        Game::new(config, assets, Box::new(MemoryStore::new()))
    }

    fn one_hero(level: &mut Level) -> Result<()> {
        level.make_hero_as_box(0.0, 0.0, 1.0, 1.0, "hero.png")?;
        Ok(())
    }

    #[test]
    fn test_level_index_is_checked() {
        let game = game(3);
        assert!(matches!(
            game.start_level(0, &mut one_hero),
            Err(EngineError::LevelOutOfRange { index: 0, count: 3 })
        ));
        assert!(game.start_level(4, &mut one_hero).is_err());
        assert!(game.start_level(3, &mut one_hero).is_ok());
    }

    #[test]
    fn test_script_errors_propagate() {
        let game = game(1);
        let mut bad = |level: &mut Level| -> Result<()> {
            level.make_hero_as_box(0.0, 0.0, 1.0, 1.0, "missing.png")?;
            Ok(())
        };
        assert!(matches!(
            game.start_level(1, &mut bad),
            Err(EngineError::UnknownImage(_))
        ));
    }

    #[test]
    fn test_win_unlocks_next_level_once() {
        let mut game = game(2);
        assert_eq!(game.unlocked_level(), 1);

        let mut level = game.start_level(1, &mut one_hero).unwrap();
        level.lose("");
        assert_eq!(game.finish_level(&level), LevelPhase::Lost);
        assert_eq!(game.unlocked_level(), 1);

        let mut level = game.start_level(1, &mut one_hero).unwrap();
        level.win();
        assert_eq!(game.finish_level(&level), LevelPhase::Won);
        assert_eq!(game.unlocked_level(), 2);
        assert!(game.is_unlocked(2));

        // Winning the last level stays capped
        let mut level = game.start_level(2, &mut one_hero).unwrap();
        level.win();
        game.finish_level(&level);
        assert_eq!(game.unlocked_level(), 2);
    }

    #[test]
    fn test_restart_is_a_fresh_level() {
        let game = game(1);
        let mut first = game.start_level(1, &mut one_hero).unwrap();
        first.add_goodies(0, 5);
        first.put_session_fact("tries", 1);

        let second = game.start_level(1, &mut one_hero).unwrap();
        assert_eq!(second.goodies(0), 0);
        assert_eq!(second.entity_count(), 1);
        assert_eq!(second.session_fact("tries", 0), 1);
    }
}
