//! Obstacles: walls, pads, platforms and trigger zones

use glam::Vec2;

use super::entity::{EntityId, Role, Shape, Side, Spawn, wrong_kind};
use super::level::Level;
use super::physics::BodyType;
use super::trigger::{CollisionTrigger, GoodieGate, TriggerHandler};
use crate::assets::SoundId;
use crate::error::Result;

/// Velocity added to a hero on contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedBoost {
    pub velocity: Vec2,
    /// Seconds until the boost is taken back; `None` keeps it
    pub duration: Option<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct Obstacle {
    /// Multiplies a touching hero's velocity
    pub dampening: Option<f32>,
    pub speed_boost: Option<SpeedBoost>,
    /// Heroes ride along with the obstacle until they jump
    pub sticky: bool,
    /// Only collides when approached from this side
    pub one_sided: Option<Side>,
    /// Touching this obstacle does not let the hero jump again
    pub no_jump_reenable: bool,
    /// Velocity added to an enemy that touches this obstacle
    pub enemy_jump: Option<Vec2>,
    pub collide_sound: Option<SoundId>,

    // === Triggers ===
    pub hero_trigger: Option<CollisionTrigger>,
    pub enemy_trigger: Option<CollisionTrigger>,
    pub projectile_trigger: Option<CollisionTrigger>,
}

impl Level {
    pub fn make_obstacle_as_box(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: &str,
    ) -> Result<EntityId> {
        self.make_obstacle(Shape::Box, x, y, width, height, image)
    }

    pub fn make_obstacle_as_circle(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: &str,
    ) -> Result<EntityId> {
        self.make_obstacle(Shape::Circle, x, y, width, height, image)
    }

    fn make_obstacle(
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
            body_type: BodyType::Static,
            sensor: false,
        };
        Ok(self.spawn(spawn, Role::Obstacle(Obstacle::default())))
    }

    pub fn obstacle(&self, id: EntityId) -> Result<&Obstacle> {
        match &self.entity(id).role {
            Role::Obstacle(o) => Ok(o),
            _ => Err(wrong_kind(id, "obstacle")),
        }
    }

    pub fn obstacle_mut(&mut self, id: EntityId) -> Result<&mut Obstacle> {
        match &mut self.entity_mut(id).role {
            Role::Obstacle(o) => Ok(o),
            _ => Err(wrong_kind(id, "obstacle")),
        }
    }

    // === Hero effects ===

    /// Touching heroes have their velocity multiplied by `factor`. The
    /// obstacle becomes a sensor so the hero passes over it.
    pub fn set_dampening(&mut self, id: EntityId, factor: f32) -> Result<()> {
        self.obstacle_mut(id)?.dampening = Some(factor);
        self.set_collisions_enabled(id, false);
        Ok(())
    }

    /// Touching heroes get `velocity` added, for `duration` seconds or for good
    pub fn set_speed_boost(
        &mut self,
        id: EntityId,
        velocity: Vec2,
        duration: Option<f32>,
    ) -> Result<()> {
        self.obstacle_mut(id)?.speed_boost = Some(SpeedBoost { velocity, duration });
        self.set_collisions_enabled(id, false);
        Ok(())
    }

    pub fn set_sticky(&mut self, id: EntityId) -> Result<()> {
        self.obstacle_mut(id)?.sticky = true;
        Ok(())
    }

    pub fn set_one_sided(&mut self, id: EntityId, side: Side) -> Result<()> {
        self.obstacle_mut(id)?.one_sided = Some(side);
        let body = self.entity(id).body;
        self.physics.set_one_sided(body, Some(side));
        Ok(())
    }

    pub fn set_no_jump_reenable(&mut self, id: EntityId) -> Result<()> {
        self.obstacle_mut(id)?.no_jump_reenable = true;
        Ok(())
    }

    pub fn set_enemy_jump(&mut self, id: EntityId, velocity: Vec2) -> Result<()> {
        self.obstacle_mut(id)?.enemy_jump = Some(velocity);
        Ok(())
    }

    pub fn set_collide_sound(&mut self, id: EntityId, sound: &str) -> Result<()> {
        let sound = self.assets.sound(sound)?;
        self.obstacle_mut(id)?.collide_sound = Some(sound);
        Ok(())
    }

    // === Triggers ===

    fn collision_trigger(
        &mut self,
        gate: GoodieGate,
        id: i32,
        delay: f32,
        handler: impl TriggerHandler + 'static,
    ) -> CollisionTrigger {
        CollisionTrigger {
            gate,
            handler: self.register_handler(handler),
            id,
            delay,
        }
    }

    /// Run `handler` with `HeroCollided` when a hero touches the obstacle
    /// while the goodie counters meet `gate`
    pub fn set_hero_collide_trigger(
        &mut self,
        obstacle: EntityId,
        gate: GoodieGate,
        id: i32,
        delay: f32,
        handler: impl TriggerHandler + 'static,
    ) -> Result<()> {
        self.obstacle(obstacle)?;
        let trigger = self.collision_trigger(gate, id, delay, handler);
        self.obstacle_mut(obstacle)?.hero_trigger = Some(trigger);
        Ok(())
    }

    pub fn set_enemy_collide_trigger(
        &mut self,
        obstacle: EntityId,
        gate: GoodieGate,
        id: i32,
        delay: f32,
        handler: impl TriggerHandler + 'static,
    ) -> Result<()> {
        self.obstacle(obstacle)?;
        let trigger = self.collision_trigger(gate, id, delay, handler);
        self.obstacle_mut(obstacle)?.enemy_trigger = Some(trigger);
        Ok(())
    }

    /// The handler alone decides whether the projectile disappears
    pub fn set_projectile_collide_trigger(
        &mut self,
        obstacle: EntityId,
        gate: GoodieGate,
        id: i32,
        delay: f32,
        handler: impl TriggerHandler + 'static,
    ) -> Result<()> {
        self.obstacle(obstacle)?;
        let trigger = self.collision_trigger(gate, id, delay, handler);
        self.obstacle_mut(obstacle)?.projectile_trigger = Some(trigger);
        Ok(())
    }
}
