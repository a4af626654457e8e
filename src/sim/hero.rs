//! Heroes: the player-controlled entities

use glam::Vec2;

use super::entity::{EntityId, EntityKind, Role, Shape, Spawn, wrong_kind};
use super::level::{GameEvent, Level};
use super::motion::Drive;
use super::physics::BodyType;
use crate::assets::SoundId;
use crate::error::Result;

/// What a press on the hero itself does
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeroTouch {
    Jump,
    /// Throw a projectile from `offset` with `velocity`
    Throw { offset: Vec2, velocity: Vec2 },
}

#[derive(Debug, Clone)]
pub struct Hero {
    // === Health ===
    /// Never negative
    pub strength: i32,
    /// Seconds of invincibility left
    pub invincible_remaining: f32,
    /// Losing this hero loses the level even if others remain
    pub must_survive: bool,

    // === Movement sub-states ===
    pub in_air: bool,
    pub crawling: bool,
    pub facing_left: bool,
    /// Sticky obstacle the hero currently rides on
    pub stuck_to: Option<EntityId>,

    // === Jumping ===
    /// Velocity added on jump; `None` uses the configured default
    pub jump_impulse: Option<Vec2>,
    /// Allow jumping again while still in the air
    pub multi_jump: bool,
    pub jump_sound: Option<SoundId>,
    pub throw_sound: Option<SoundId>,
    pub touch: Option<HeroTouch>,
}

impl Hero {
    fn new(strength: i32) -> Self {
        Self {
            strength,
            invincible_remaining: 0.0,
            must_survive: false,
            in_air: false,
            crawling: false,
            facing_left: false,
            stuck_to: None,
            jump_impulse: None,
            multi_jump: false,
            jump_sound: None,
            throw_sound: None,
            touch: None,
        }
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_remaining > 0.0
    }
}

impl Level {
    pub fn make_hero_as_box(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: &str,
    ) -> Result<EntityId> {
        self.make_hero(Shape::Box, x, y, width, height, image)
    }

    pub fn make_hero_as_circle(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: &str,
    ) -> Result<EntityId> {
        self.make_hero(Shape::Circle, x, y, width, height, image)
    }

    fn make_hero(
        &mut self,
        shape: Shape,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: &str,
    ) -> Result<EntityId> {
        let image = self.assets.image(image)?;
        let spawn = Spawn {
            shape,
            x,
            y,
            width,
            height,
            image,
            body_type: BodyType::Dynamic,
            sensor: false,
        };
        let id = self.spawn(spawn, Role::Hero(Hero::new(self.config.hero_strength)));
        self.score.heroes_created += 1;
        Ok(id)
    }

    pub fn hero(&self, id: EntityId) -> Result<&Hero> {
        match &self.entity(id).role {
            Role::Hero(hero) => Ok(hero),
            _ => Err(wrong_kind(id, "hero")),
        }
    }

    pub fn hero_mut(&mut self, id: EntityId) -> Result<&mut Hero> {
        match &mut self.entity_mut(id).role {
            Role::Hero(hero) => Ok(hero),
            _ => Err(wrong_kind(id, "hero")),
        }
    }

    /// Heroes only; internal callers already know the kind
    pub(crate) fn hero_state(&mut self, id: EntityId) -> Option<&mut Hero> {
        match &mut self.entity_mut(id).role {
            Role::Hero(hero) => Some(hero),
            _ => None,
        }
    }

    // === Health ===

    pub fn strength(&self, id: EntityId) -> Result<i32> {
        Ok(self.hero(id)?.strength)
    }

    pub fn set_strength(&mut self, id: EntityId, strength: i32) -> Result<()> {
        self.hero_mut(id)?.strength = strength.max(0);
        Ok(())
    }

    pub fn add_strength(&mut self, id: EntityId, delta: i32) -> Result<()> {
        let hero = self.hero_mut(id)?;
        hero.strength = (hero.strength + delta).max(0);
        Ok(())
    }

    /// Grant `seconds` more invincibility
    pub fn set_invincible(&mut self, id: EntityId, seconds: f32) -> Result<()> {
        let hero = self.hero_mut(id)?;
        hero.invincible_remaining = hero.invincible_remaining.max(0.0) + seconds;
        Ok(())
    }

    pub fn set_must_survive(&mut self, id: EntityId) -> Result<()> {
        self.hero_mut(id)?.must_survive = true;
        Ok(())
    }

    pub(crate) fn decay_invincibility(&mut self, dt: f32) {
        for e in &mut self.entities {
            if let Role::Hero(hero) = &mut e.role {
                if hero.invincible_remaining > 0.0 {
                    hero.invincible_remaining = (hero.invincible_remaining - dt).max(0.0);
                }
            }
        }
    }

    /// Defeat a hero. `text` is shown if this loses the level; empty uses the
    /// configured default.
    pub fn defeat_hero(&mut self, id: EntityId, text: &str) {
        if !self.is_enabled(id) || self.kind(id) != EntityKind::Hero {
            return;
        }
        let must_survive = match self.hero_state(id) {
            Some(hero) => {
                hero.strength = 0;
                hero.must_survive
            }
            None => false,
        };
        self.remove(id, false);
        self.score.heroes_defeated += 1;
        self.events.push(GameEvent::HeroDefeated {
            hero: id,
            text: text.to_string(),
        });
        log::debug!("Hero {id} defeated");
        if must_survive || self.score.heroes_defeated >= self.score.heroes_created {
            self.lose(text);
        }
    }

    // === Movement ===

    pub fn set_move_by_tilting(&mut self, id: EntityId) {
        self.entity_mut(id).drive = Drive::Tilt;
    }

    pub fn set_jump_impulse(&mut self, id: EntityId, impulse: Vec2) -> Result<()> {
        self.hero_mut(id)?.jump_impulse = Some(impulse);
        Ok(())
    }

    pub fn set_multi_jump(&mut self, id: EntityId, enabled: bool) -> Result<()> {
        self.hero_mut(id)?.multi_jump = enabled;
        Ok(())
    }

    pub fn set_jump_sound(&mut self, id: EntityId, sound: &str) -> Result<()> {
        let sound = self.assets.sound(sound)?;
        self.hero_mut(id)?.jump_sound = Some(sound);
        Ok(())
    }

    pub fn set_throw_sound(&mut self, id: EntityId, sound: &str) -> Result<()> {
        let sound = self.assets.sound(sound)?;
        self.hero_mut(id)?.throw_sound = Some(sound);
        Ok(())
    }

    /// Pressing the hero makes it jump
    pub fn set_touch_to_jump(&mut self, id: EntityId) -> Result<()> {
        self.hero_mut(id)?.touch = Some(HeroTouch::Jump);
        Ok(())
    }

    /// Pressing the hero throws a projectile
    pub fn set_touch_to_throw(&mut self, id: EntityId, offset: Vec2, velocity: Vec2) -> Result<()> {
        self.hero_mut(id)?.touch = Some(HeroTouch::Throw { offset, velocity });
        Ok(())
    }

    /// Jump if the hero is on the ground (or may multi-jump)
    pub fn jump(&mut self, id: EntityId) -> Result<()> {
        if !self.is_enabled(id) {
            return Ok(());
        }
        let default_impulse = self.config.jump_impulse;
        let hero = self.hero_mut(id)?;
        if hero.in_air && !hero.multi_jump {
            return Ok(());
        }
        hero.in_air = true;
        hero.stuck_to = None;
        let impulse = hero.jump_impulse.unwrap_or(default_impulse);
        let sound = hero.jump_sound;
        self.add_velocity(id, impulse);
        if let Some(sound) = sound {
            self.play_sound(sound);
        }
        Ok(())
    }

    /// Lie down; crawling heroes defeat crawl-sensitive enemies
    pub fn crawl_on(&mut self, id: EntityId) -> Result<()> {
        let hero = self.hero_mut(id)?;
        if hero.crawling {
            return Ok(());
        }
        hero.crawling = true;
        self.set_rotation(id, -std::f32::consts::FRAC_PI_2);
        Ok(())
    }

    pub fn crawl_off(&mut self, id: EntityId) -> Result<()> {
        let hero = self.hero_mut(id)?;
        if !hero.crawling {
            return Ok(());
        }
        hero.crawling = false;
        self.set_rotation(id, 0.0);
        Ok(())
    }

    /// Face the way each hero is moving horizontally
    pub(crate) fn update_facing(&mut self) {
        for i in 0..self.entities.len() {
            let e = &self.entities[i];
            if !e.enabled || e.kind() != EntityKind::Hero {
                continue;
            }
            let vx = self.physics.velocity(e.body).x;
            if let Role::Hero(hero) = &mut self.entities[i].role {
                if vx < 0.0 {
                    hero.facing_left = true;
                } else if vx > 0.0 {
                    hero.facing_left = false;
                }
            }
        }
    }
}
