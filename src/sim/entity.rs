//! Entity model shared by every kind of game object
//!
//! An entity is a physics body plus a visual plus kind-specific behavior. The
//! level owns all entities in an arena and hands out copyable [`EntityId`]s.
//! Entities are never freed during a level; removal only disables them.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::destination::Destination;
use super::enemy::Enemy;
use super::goodie::Goodie;
use super::hero::Hero;
use super::level::{GameEvent, Level};
use super::motion::Drive;
use super::obstacle::Obstacle;
use super::physics::{BodyHandle, BodyType, Material};
use super::projectile::Projectile;
use super::trigger::TouchTrigger;
use crate::assets::{ImageId, SoundId};
use crate::error::{EngineError, Result};

/// Arena index of an entity within its level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Closed set of entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Hero,
    Enemy,
    Goodie,
    Projectile,
    Obstacle,
    Destination,
}

impl EntityKind {
    /// Collision priority. The lower-ranked side of a contact initiates its
    /// resolution.
    pub fn rank(self) -> u8 {
        match self {
            EntityKind::Hero => 0,
            EntityKind::Enemy => 1,
            EntityKind::Goodie => 2,
            EntityKind::Projectile => 3,
            EntityKind::Obstacle => 4,
            EntityKind::Destination => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Hero => "hero",
            EntityKind::Enemy => "enemy",
            EntityKind::Goodie => "goodie",
            EntityKind::Projectile => "projectile",
            EntityKind::Obstacle => "obstacle",
            EntityKind::Destination => "destination",
        }
    }
}

/// Collision footprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    Box,
    /// Radius is half the larger of width and height
    Circle,
}

/// One of the four sides of an axis-aligned body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

/// Free-form tag for level-script bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Info {
    Text(String),
    Number(i32),
}

/// How a selected entity moves when the player pokes empty space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PokeMode {
    /// Teleport to the poked point
    Place,
    /// Travel toward the poked point at a fixed speed
    Velocity(f32),
}

/// Kind-specific state
#[derive(Debug, Clone)]
pub enum Role {
    Hero(Hero),
    Enemy(Enemy),
    Goodie(Goodie),
    Projectile(Projectile),
    Obstacle(Obstacle),
    Destination(Destination),
}

impl Role {
    pub fn kind(&self) -> EntityKind {
        match self {
            Role::Hero(_) => EntityKind::Hero,
            Role::Enemy(_) => EntityKind::Enemy,
            Role::Goodie(_) => EntityKind::Goodie,
            Role::Projectile(_) => EntityKind::Projectile,
            Role::Obstacle(_) => EntityKind::Obstacle,
            Role::Destination(_) => EntityKind::Destination,
        }
    }
}

/// A physics-backed game object
#[derive(Debug)]
pub struct Entity {
    pub id: EntityId,
    pub(crate) body: BodyHandle,
    pub shape: Shape,
    pub width: f32,
    pub height: f32,
    pub image: Option<ImageId>,
    /// 0 collides with everything; equal nonzero groups pass through each other
    pub pass_through: u32,
    /// False once removed, defeated or collected
    pub enabled: bool,
    pub info: Option<Info>,
    pub disappear_sound: Option<SoundId>,
    /// The single active drive (route, chase, tilt, ...)
    pub drive: Drive,
    pub touch_trigger: Option<TouchTrigger>,
    pub draggable: bool,
    pub poke: Option<PokeMode>,
    pub role: Role,
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        self.role.kind()
    }

    pub fn half_size(&self) -> Vec2 {
        Vec2::new(self.width, self.height) / 2.0
    }
}

/// Everything a renderer needs to draw one entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub entity: EntityId,
    pub center: Vec2,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    pub image: Option<ImageId>,
}

/// Error for a kind-specific operation applied to the wrong kind
pub(crate) fn wrong_kind(entity: EntityId, expected: &'static str) -> EngineError {
    EngineError::WrongKind { entity, expected }
}

/// Creation parameters shared by all factories
pub(crate) struct Spawn {
    pub shape: Shape,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub image: Option<ImageId>,
    pub body_type: BodyType,
    pub sensor: bool,
}

impl Level {
    /// Create an entity; `(x, y)` is the bottom-left corner of its footprint
    pub(crate) fn spawn(&mut self, spawn: Spawn, role: Role) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        let center = Vec2::new(spawn.x + spawn.width / 2.0, spawn.y + spawn.height / 2.0);
        let body = self.physics.create_body(
            id,
            spawn.shape,
            spawn.width,
            spawn.height,
            spawn.body_type,
            Material::default(),
            spawn.sensor,
            center,
        );
        log::debug!("Spawned {} {} at ({}, {})", role.kind().as_str(), id, spawn.x, spawn.y);
        self.entities.push(Entity {
            id,
            body,
            shape: spawn.shape,
            width: spawn.width,
            height: spawn.height,
            image: spawn.image,
            pass_through: 0,
            enabled: true,
            info: None,
            disappear_sound: None,
            drive: Drive::None,
            touch_trigger: None,
            draggable: false,
            poke: None,
            role,
        });
        id
    }

    /// Borrow an entity.
    ///
    /// # Panics
    /// If `id` did not come from this level.
    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.0 as usize]
    }

    pub fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.0 as usize]
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn kind(&self, id: EntityId) -> EntityKind {
        self.entity(id).kind()
    }

    pub fn is_enabled(&self, id: EntityId) -> bool {
        self.entity(id).enabled
    }

    /// Ids of every entity of one kind, in creation order
    pub fn entities_of(&self, kind: EntityKind) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|e| e.kind() == kind)
            .map(|e| e.id)
            .collect()
    }

    /// Poses of all enabled entities, in creation order
    pub fn sprites(&self) -> Vec<Sprite> {
        self.entities
            .iter()
            .filter(|e| e.enabled)
            .map(|e| Sprite {
                entity: e.id,
                center: self.physics.center(e.body),
                width: e.width,
                height: e.height,
                rotation: self.physics.rotation(e.body),
                image: e.image,
            })
            .collect()
    }

    // === Pose ===

    /// Bottom-left corner
    pub fn position(&self, id: EntityId) -> Vec2 {
        let e = self.entity(id);
        self.physics.center(e.body) - e.half_size()
    }

    /// Move so the bottom-left corner lands on `pos`
    pub fn set_position(&mut self, id: EntityId, pos: Vec2) {
        let e = self.entity(id);
        let (body, half) = (e.body, e.half_size());
        self.physics.set_center(body, pos + half);
    }

    pub fn center(&self, id: EntityId) -> Vec2 {
        self.physics.center(self.entity(id).body)
    }

    pub fn set_center(&mut self, id: EntityId, center: Vec2) {
        let body = self.entity(id).body;
        self.physics.set_center(body, center);
    }

    pub fn velocity(&self, id: EntityId) -> Vec2 {
        self.physics.velocity(self.entity(id).body)
    }

    pub fn set_velocity(&mut self, id: EntityId, velocity: Vec2) {
        let body = self.entity(id).body;
        self.physics.set_velocity(body, velocity);
    }

    pub fn add_velocity(&mut self, id: EntityId, delta: Vec2) {
        let body = self.entity(id).body;
        let v = self.physics.velocity(body);
        self.physics.set_velocity(body, v + delta);
    }

    pub fn apply_impulse(&mut self, id: EntityId, impulse: Vec2) {
        let body = self.entity(id).body;
        self.physics.apply_impulse(body, impulse);
    }

    pub fn rotation(&self, id: EntityId) -> f32 {
        self.physics.rotation(self.entity(id).body)
    }

    pub fn set_rotation(&mut self, id: EntityId, angle: f32) {
        let body = self.entity(id).body;
        self.physics.set_rotation(body, angle);
    }

    // === Physics properties ===

    /// Change density, elasticity and friction in place
    pub fn set_physics(&mut self, id: EntityId, density: f32, elasticity: f32, friction: f32) {
        let body = self.entity(id).body;
        self.physics.set_material(
            body,
            Material {
                density,
                elasticity,
                friction,
            },
        );
    }

    /// Swap between box and circle footprints, optionally resizing
    pub fn set_shape(&mut self, id: EntityId, shape: Shape, width: f32, height: f32) {
        let e = self.entity_mut(id);
        e.shape = shape;
        e.width = width;
        e.height = height;
        let body = e.body;
        self.physics.set_shape(body, shape, width, height);
    }

    pub fn set_body_type(&mut self, id: EntityId, body_type: BodyType) {
        let body = self.entity(id).body;
        self.physics.set_body_type(body, body_type);
    }

    pub fn set_fixed_rotation(&mut self, id: EntityId, fixed: bool) {
        let body = self.entity(id).body;
        self.physics.set_fixed_rotation(body, fixed);
    }

    pub fn set_gravity_scale(&mut self, id: EntityId, scale: f32) {
        let body = self.entity(id).body;
        self.physics.set_gravity_scale(body, scale);
    }

    /// Turn physical collision response on or off (off makes a sensor)
    pub fn set_collisions_enabled(&mut self, id: EntityId, enabled: bool) {
        let body = self.entity(id).body;
        self.physics.set_sensor(body, !enabled);
    }

    pub fn is_sensor(&self, id: EntityId) -> bool {
        self.physics.is_sensor(self.entity(id).body)
    }

    pub fn set_pass_through(&mut self, id: EntityId, group: u32) {
        let e = self.entity_mut(id);
        e.pass_through = group;
        let body = e.body;
        self.physics.set_pass_through(body, group);
    }

    // === Bookkeeping ===

    pub fn set_info(&mut self, id: EntityId, info: Info) {
        self.entity_mut(id).info = Some(info);
    }

    pub fn info(&self, id: EntityId) -> Option<&Info> {
        self.entity(id).info.as_ref()
    }

    pub fn set_disappear_sound(&mut self, id: EntityId, sound: &str) -> Result<()> {
        let sound = self.assets.sound(sound)?;
        self.entity_mut(id).disappear_sound = Some(sound);
        Ok(())
    }

    pub fn set_draggable(&mut self, id: EntityId, draggable: bool) {
        self.entity_mut(id).draggable = draggable;
    }

    pub fn set_poke(&mut self, id: EntityId, mode: PokeMode) {
        self.entity_mut(id).poke = Some(mode);
    }

    /// Logically remove an entity. A quiet removal skips the disappear sound.
    /// Removing an already removed entity does nothing.
    pub fn remove(&mut self, id: EntityId, quiet: bool) {
        let e = self.entity_mut(id);
        if !e.enabled {
            return;
        }
        e.enabled = false;
        let (body, sound) = (e.body, e.disappear_sound);
        self.physics.set_velocity(body, Vec2::ZERO);
        self.physics.set_enabled(body, false);
        if !quiet {
            if let Some(sound) = sound {
                self.play_sound(sound);
            }
        }
        if self.touch.dragging == Some(id) {
            self.touch.dragging = None;
        }
        if self.touch.poke_selected == Some(id) {
            self.touch.poke_selected = None;
        }
        self.events.push(GameEvent::EntityRemoved { entity: id, quiet });
    }

    /// Bring a removed entity back (projectile recycling uses this)
    pub(crate) fn revive(&mut self, id: EntityId) {
        let e = self.entity_mut(id);
        e.enabled = true;
        let body = e.body;
        self.physics.set_enabled(body, true);
    }

    /// Is `point` inside the entity's axis-aligned footprint?
    pub fn contains_point(&self, id: EntityId, point: Vec2) -> bool {
        let e = self.entity(id);
        let offset = (point - self.physics.center(e.body)).abs();
        let half = e.half_size();
        offset.x <= half.x && offset.y <= half.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::test_util::{run_frames, test_level};
    use crate::sim::tick::{TickInput, tick};

    #[test]
    fn test_rank_order() {
        let order = [
            EntityKind::Hero,
            EntityKind::Enemy,
            EntityKind::Goodie,
            EntityKind::Projectile,
            EntityKind::Obstacle,
            EntityKind::Destination,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn test_position_is_bottom_left() {
        let mut level = test_level();
        let id = level.make_obstacle_as_box(2.0, 3.0, 4.0, 2.0, "wall.png").unwrap();
        assert_eq!(level.center(id), Vec2::new(4.0, 4.0));
        assert_eq!(level.position(id), Vec2::new(2.0, 3.0));

        level.set_position(id, Vec2::new(10.0, 10.0));
        assert_eq!(level.center(id), Vec2::new(12.0, 11.0));
    }

    #[test]
    fn test_remove_is_logical_and_idempotent() {
        let mut level = test_level();
        let id = level.make_goodie_as_circle(0.0, 0.0, 1.0, 1.0, "coin.png").unwrap();
        level.remove(id, false);
        level.remove(id, false);
        assert!(!level.is_enabled(id));
        assert_eq!(level.entity_count(), 1);
        let removals = level
            .events()
            .iter()
            .filter(|e| matches!(e, GameEvent::EntityRemoved { .. }))
            .count();
        assert_eq!(removals, 1);
    }

    #[test]
    fn test_unknown_image_is_error() {
        let mut level = test_level();
        assert!(level.make_hero_as_box(0.0, 0.0, 1.0, 1.0, "nope.png").is_err());
        assert_eq!(level.entity_count(), 0);
    }

    #[test]
    fn test_contains_point() {
        let mut level = test_level();
        let id = level.make_obstacle_as_box(0.0, 0.0, 2.0, 2.0, "wall.png").unwrap();
        assert!(level.contains_point(id, Vec2::new(1.5, 0.5)));
        assert!(!level.contains_point(id, Vec2::new(2.5, 0.5)));
    }

    #[test]
    fn test_pass_through_still_resolves() {
        let mut level = test_level();
        let hero = level.make_hero_as_box(0.0, 0.0, 1.0, 1.0, "hero.png").unwrap();
        let coin = level.make_goodie_as_box(0.0, 0.0, 1.0, 1.0, "coin.png").unwrap();
        level.set_pass_through(hero, 3);
        level.set_pass_through(coin, 3);
        assert_eq!(level.entity(coin).pass_through, 3);
        run_frames(&mut level, 5);
        assert_eq!(level.goodies(0), 1);
        assert!(!level.is_enabled(coin));
    }

    #[test]
    fn test_density_change_updates_mass() {
        let mut level = test_level();
        let light = level.make_hero_as_box(0.0, 0.0, 1.0, 1.0, "hero.png").unwrap();
        let heavy = level.make_hero_as_box(10.0, 0.0, 1.0, 1.0, "hero.png").unwrap();
        level.set_physics(heavy, 4.0, 0.0, 0.0);
        level.set_move_by_tilting(light);
        level.set_move_by_tilting(heavy);
        let input = TickInput {
            tilt: Some(Vec2::new(4.0, 0.0)),
            ..Default::default()
        };
        tick(&mut level, &input, SIM_DT);

        let ratio = level.velocity(light).x / level.velocity(heavy).x;
        assert!((ratio - 4.0).abs() < 1.0e-2, "ratio {ratio}");
    }

    #[test]
    fn test_sprites_skip_removed() {
        let mut level = test_level();
        let a = level.make_obstacle_as_box(0.0, 0.0, 1.0, 1.0, "wall.png").unwrap();
        let b = level.make_obstacle_as_box(3.0, 0.0, 1.0, 1.0, "wall.png").unwrap();
        level.remove(a, true);
        let sprites = level.sprites();
        assert_eq!(sprites.len(), 1);
        assert_eq!(sprites[0].entity, b);
    }
}
