//! Projectile pool and throw mechanics
//!
//! The pool is a fixed slot array of projectile entities created once per
//! level. Idle projectiles are disabled entities; throwing revives the slot
//! under the cursor. If that slot is still in flight the throw is dropped, and
//! the pool never grows.

use glam::Vec2;

use super::entity::{EntityId, Role, Shape, Spawn, wrong_kind};
use super::level::{GameEvent, Level};
use super::physics::BodyType;
use crate::assets::SoundId;
use crate::error::{EngineError, Result};
use crate::heading;

#[derive(Debug, Clone)]
pub struct Projectile {
    /// Subtracted from an enemy's damage per hit
    pub strength: i32,
    /// Hero that threw it; range is measured from there
    pub thrower: Option<EntityId>,
}

/// Pool-wide throw configuration and slot bookkeeping
#[derive(Debug, Clone)]
pub struct ProjectilePool {
    slots: Vec<EntityId>,
    cursor: usize,
    /// `None` is unlimited
    remaining: Option<u32>,
    /// Max distance from the thrower on each axis before recycling
    pub range: Vec2,
    pub gravity: bool,
    /// Projectiles bounce off each other instead of disappearing
    pub collision_ok: bool,
    pub rotate_to_direction: bool,
    /// Aimed throws are normalized to this speed
    pub fixed_magnitude: Option<f32>,
    /// Aimed throw velocity is multiplied by this
    pub multiplier: Option<f32>,
    pub throw_sound: Option<SoundId>,
}

impl ProjectilePool {
    pub fn slots(&self) -> &[EntityId] {
        &self.slots
    }

    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }
}

impl Level {
    /// Create the level's projectile pool with `count` projectiles
    pub fn configure_projectiles(
        &mut self,
        count: usize,
        width: f32,
        height: f32,
        image: &str,
        strength: i32,
        shape: Shape,
    ) -> Result<()> {
        if count == 0 {
            return Err(EngineError::InvalidPoolSize);
        }
        let image = self.assets.image(image)?;
        let mut slots = Vec::with_capacity(count);
        for _ in 0..count {
            let spawn = Spawn {
                shape,
                x: 0.0,
                y: 0.0,
                width,
                height,
                image,
                body_type: BodyType::Dynamic,
                sensor: true,
            };
            let id = self.spawn(
                spawn,
                Role::Projectile(Projectile {
                    strength,
                    thrower: None,
                }),
            );
            let e = self.entity_mut(id);
            e.enabled = false;
            let body = e.body;
            self.physics.set_enabled(body, false);
            self.physics.set_gravity_scale(body, 0.0);
            self.physics.set_bullet(body, true);
            slots.push(id);
        }
        log::info!("Projectile pool ready with {count} slots");
        self.pool = Some(ProjectilePool {
            slots,
            cursor: 0,
            remaining: None,
            range: Vec2::splat(1000.0),
            gravity: false,
            collision_ok: false,
            rotate_to_direction: false,
            fixed_magnitude: None,
            multiplier: None,
            throw_sound: None,
        });
        Ok(())
    }

    pub fn projectile_pool(&self) -> Option<&ProjectilePool> {
        self.pool.as_ref()
    }

    fn pool_mut(&mut self) -> Result<&mut ProjectilePool> {
        self.pool.as_mut().ok_or(EngineError::NoProjectilePool)
    }

    fn pool_slots(&self) -> Vec<EntityId> {
        self.pool.as_ref().map(|p| p.slots.clone()).unwrap_or_default()
    }

    pub fn projectile(&self, id: EntityId) -> Result<&Projectile> {
        match &self.entity(id).role {
            Role::Projectile(p) => Ok(p),
            _ => Err(wrong_kind(id, "projectile")),
        }
    }

    // === Configuration ===

    /// Limit the total number of throws; negative means unlimited
    pub fn set_projectile_budget(&mut self, budget: i32) -> Result<()> {
        self.pool_mut()?.remaining = u32::try_from(budget).ok();
        Ok(())
    }

    pub fn set_projectile_range(&mut self, range: Vec2) -> Result<()> {
        self.pool_mut()?.range = range;
        Ok(())
    }

    /// Let level gravity act on projectiles
    pub fn set_projectile_gravity_on(&mut self) -> Result<()> {
        self.pool_mut()?.gravity = true;
        for id in self.pool_slots() {
            self.set_gravity_scale(id, 1.0);
        }
        Ok(())
    }

    pub fn set_projectile_collision_ok(&mut self) -> Result<()> {
        self.pool_mut()?.collision_ok = true;
        Ok(())
    }

    /// Give projectiles a physical collision response
    pub fn set_projectiles_solid(&mut self) -> Result<()> {
        self.pool_mut()?;
        for id in self.pool_slots() {
            self.set_collisions_enabled(id, true);
        }
        Ok(())
    }

    pub fn set_projectile_rotate_to_direction(&mut self) -> Result<()> {
        self.pool_mut()?.rotate_to_direction = true;
        Ok(())
    }

    pub fn set_projectile_fixed_magnitude(&mut self, speed: f32) -> Result<()> {
        self.pool_mut()?.fixed_magnitude = Some(speed);
        Ok(())
    }

    pub fn set_projectile_multiplier(&mut self, factor: f32) -> Result<()> {
        self.pool_mut()?.multiplier = Some(factor);
        Ok(())
    }

    pub fn set_projectile_throw_sound(&mut self, sound: &str) -> Result<()> {
        let sound = self.assets.sound(sound)?;
        self.pool_mut()?.throw_sound = Some(sound);
        Ok(())
    }

    pub fn set_projectile_disappear_sound(&mut self, sound: &str) -> Result<()> {
        self.pool_mut()?;
        for id in self.pool_slots() {
            self.set_disappear_sound(id, sound)?;
        }
        Ok(())
    }

    // === Throwing ===

    /// Throw with a fixed velocity from `offset` relative to the hero's
    /// center. Both are mirrored horizontally when the hero faces left.
    pub fn throw_fixed(
        &mut self,
        hero: EntityId,
        offset: Vec2,
        velocity: Vec2,
    ) -> Result<Option<EntityId>> {
        let facing_left = self.hero(hero)?.facing_left;
        let flip = if facing_left { Vec2::new(-1.0, 1.0) } else { Vec2::ONE };
        let origin = self.center(hero) + offset * flip;
        self.launch(hero, origin, velocity * flip)
    }

    /// Throw from `offset` relative to the hero's center toward `target`
    pub fn throw_at(
        &mut self,
        hero: EntityId,
        offset: Vec2,
        target: Vec2,
    ) -> Result<Option<EntityId>> {
        self.hero(hero)?;
        let pool = self.pool.as_ref().ok_or(EngineError::NoProjectilePool)?;
        let origin = self.center(hero) + offset;
        let mut velocity = target - origin;
        if let Some(factor) = pool.multiplier {
            velocity *= factor;
        }
        if let Some(speed) = pool.fixed_magnitude {
            velocity = velocity.normalize_or_zero() * speed;
        }
        self.launch(hero, origin, velocity)
    }

    fn launch(&mut self, hero: EntityId, origin: Vec2, velocity: Vec2) -> Result<Option<EntityId>> {
        if !self.is_enabled(hero) {
            return Ok(None);
        }
        let pool = self.pool.as_ref().ok_or(EngineError::NoProjectilePool)?;
        if pool.remaining == Some(0) {
            log::debug!("Projectile budget spent, throw dropped");
            return Ok(None);
        }
        let slot = pool.slots[pool.cursor];
        if self.is_enabled(slot) {
            log::debug!("Projectile pool saturated, throw dropped");
            return Ok(None);
        }
        let rotate = pool.rotate_to_direction;
        let pool_sound = pool.throw_sound;
        if let Some(pool) = self.pool.as_mut() {
            pool.cursor = (pool.cursor + 1) % pool.slots.len();
            if let Some(left) = pool.remaining.as_mut() {
                *left -= 1;
            }
        }

        self.revive(slot);
        if let Role::Projectile(p) = &mut self.entity_mut(slot).role {
            p.thrower = Some(hero);
        }
        let half = self.entity(slot).half_size();
        self.set_position(slot, origin - half);
        self.set_velocity(slot, velocity);
        self.set_rotation(slot, if rotate { heading(velocity) } else { 0.0 });

        let sound = self.hero(hero)?.throw_sound.or(pool_sound);
        if let Some(sound) = sound {
            self.play_sound(sound);
        }
        self.events.push(GameEvent::ProjectileThrown { projectile: slot });
        Ok(Some(slot))
    }

    /// Projectiles currently in flight
    pub fn active_projectiles(&self) -> usize {
        self.pool_slots()
            .into_iter()
            .filter(|&id| self.is_enabled(id))
            .count()
    }

    /// Quietly recycle projectiles that strayed too far from their thrower
    pub(crate) fn cull_projectiles(&mut self) {
        let Some(pool) = &self.pool else {
            return;
        };
        let range = pool.range;
        let mut stray = Vec::new();
        for &id in &pool.slots {
            let e = self.entity(id);
            if !e.enabled {
                continue;
            }
            let Role::Projectile(p) = &e.role else {
                continue;
            };
            let Some(thrower) = p.thrower else {
                continue;
            };
            let d = (self.center(id) - self.center(thrower)).abs();
            if d.x > range.x || d.y > range.y {
                stray.push(id);
            }
        }
        for id in stray {
            self.remove(id, true);
        }
    }
}
