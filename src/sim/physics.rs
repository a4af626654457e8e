//! rapier2d world adapter
//!
//! Owns the rigid-body simulation and turns its collision stream into
//! begin-contact pairs of entity ids. Everything outside this file speaks
//! `glam::Vec2`; nalgebra types never leak out.
//!
//! Bodies are never destroyed while a level runs. Removing an entity disables
//! its body, which takes it out of the broad phase so no further contacts are
//! reported for it.
//!
//! Each collider carries a packed tag in `user_data`:
//! bits 0..32 entity id, 32..64 pass-through group, 64..72 one-sided side.
//! The physics hooks read it to strip the collision response from
//! pass-through pairs (their contacts are still reported) and to turn
//! one-sided obstacles into one-way platforms.

use glam::Vec2;
use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

use super::entity::{EntityId, Shape, Side};

/// Contacts whose normal deviates more than this from a one-sided obstacle's
/// open side are ignored (radians)
const ONE_SIDED_TOLERANCE: Real = 0.1;

/// How a body participates in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    /// Never moves
    Static,
    /// Fully simulated (forces, gravity, collisions)
    Dynamic,
    /// Moved by velocity only, unaffected by forces
    Kinematic,
}

/// Surface and mass properties of a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub density: f32,
    pub elasticity: f32,
    pub friction: f32,
}

impl Default for Material {
    fn default() -> Self {
        use crate::consts::*;
        Self {
            density: DEFAULT_DENSITY,
            elasticity: DEFAULT_ELASTICITY,
            friction: DEFAULT_FRICTION,
        }
    }
}

/// Handle to one entity's body and its single collider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyHandle {
    body: RigidBodyHandle,
    collider: ColliderHandle,
}

/// Two entities that started touching during a step (order is arbitrary)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactPair {
    pub a: EntityId,
    pub b: EntityId,
}

/// Decoded collider tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColliderTag {
    entity: EntityId,
    pass_through: u32,
    one_sided: Option<Side>,
}

impl ColliderTag {
    fn pack(&self) -> u128 {
        let side = match self.one_sided {
            None => 0u128,
            Some(Side::Top) => 1,
            Some(Side::Bottom) => 2,
            Some(Side::Left) => 3,
            Some(Side::Right) => 4,
        };
        (self.entity.0 as u128) | ((self.pass_through as u128) << 32) | (side << 64)
    }

    fn unpack(data: u128) -> Self {
        let one_sided = match (data >> 64) & 0xff {
            1 => Some(Side::Top),
            2 => Some(Side::Bottom),
            3 => Some(Side::Left),
            4 => Some(Side::Right),
            _ => None,
        };
        Self {
            entity: EntityId((data & 0xffff_ffff) as u32),
            pass_through: ((data >> 32) & 0xffff_ffff) as u32,
            one_sided,
        }
    }

    fn passes_through(&self, other: &ColliderTag) -> bool {
        self.pass_through != 0 && self.pass_through == other.pass_through
    }
}

/// Outward normal of the side a one-sided obstacle can be hit from
fn open_side_normal(side: Side) -> Vector<Real> {
    match side {
        Side::Top => vector![0.0, 1.0],
        Side::Bottom => vector![0.0, -1.0],
        Side::Left => vector![-1.0, 0.0],
        Side::Right => vector![1.0, 0.0],
    }
}

/// Pass-through groups and one-sided obstacles
struct EngineHooks;

impl PhysicsHooks for EngineHooks {
    fn filter_contact_pair(&self, context: &PairFilterContext) -> Option<SolverFlags> {
        let a = ColliderTag::unpack(context.colliders[context.collider1].user_data);
        let b = ColliderTag::unpack(context.colliders[context.collider2].user_data);
        // Pass-through pairs still report contacts, they just never push
        if a.passes_through(&b) {
            Some(SolverFlags::empty())
        } else {
            Some(SolverFlags::COMPUTE_IMPULSES)
        }
    }

    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let a = ColliderTag::unpack(context.colliders[context.collider1].user_data);
        let b = ColliderTag::unpack(context.colliders[context.collider2].user_data);
        if let Some(side) = a.one_sided {
            context.update_as_oneway_platform(&open_side_normal(side), ONE_SIDED_TOLERANCE);
        } else if let Some(side) = b.one_sided {
            context.update_as_oneway_platform(&(-open_side_normal(side)), ONE_SIDED_TOLERANCE);
        }
    }
}

/// Build the collision shape for an entity footprint
fn shared_shape(shape: Shape, width: f32, height: f32) -> SharedShape {
    match shape {
        Shape::Box => SharedShape::cuboid(width / 2.0, height / 2.0),
        Shape::Circle => SharedShape::ball(width.max(height) / 2.0),
    }
}

fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn to_vec2(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// The rigid-body world of one level
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    hooks: EngineHooks,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: to_vector(gravity),
            integration_params: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            hooks: EngineHooks,
        }
    }

    pub fn gravity(&self) -> Vec2 {
        to_vec2(&self.gravity)
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = to_vector(gravity);
    }

    /// Create a body with one collider centered at `center`
    #[allow(clippy::too_many_arguments)]
    pub fn create_body(
        &mut self,
        entity: EntityId,
        shape: Shape,
        width: f32,
        height: f32,
        body_type: BodyType,
        material: Material,
        sensor: bool,
        center: Vec2,
    ) -> BodyHandle {
        let builder = match body_type {
            BodyType::Static => RigidBodyBuilder::fixed(),
            BodyType::Dynamic => RigidBodyBuilder::dynamic(),
            BodyType::Kinematic => RigidBodyBuilder::kinematic_velocity_based(),
        };
        let body = self
            .bodies
            .insert(builder.translation(to_vector(center)).build());

        let tag = ColliderTag {
            entity,
            pass_through: 0,
            one_sided: None,
        };
        let collider = ColliderBuilder::new(shared_shape(shape, width, height))
            .density(material.density)
            .restitution(material.elasticity)
            .friction(material.friction)
            .sensor(sensor)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .active_hooks(
                ActiveHooks::FILTER_CONTACT_PAIRS | ActiveHooks::MODIFY_SOLVER_CONTACTS,
            )
            .active_collision_types(ActiveCollisionTypes::all())
            .user_data(tag.pack())
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);

        BodyHandle { body, collider }
    }

    /// Change density/elasticity/friction in place and refresh mass data
    pub fn set_material(&mut self, handle: BodyHandle, material: Material) {
        let collider = &mut self.colliders[handle.collider];
        collider.set_density(material.density);
        collider.set_restitution(material.elasticity);
        collider.set_friction(material.friction);
        let colliders = &self.colliders;
        self.bodies[handle.body].recompute_mass_properties_from_colliders(colliders);
    }

    /// Replace the collision shape. This is the one "rebuild" operation; it
    /// keeps the body, its velocity and its tags.
    pub fn set_shape(&mut self, handle: BodyHandle, shape: Shape, width: f32, height: f32) {
        self.colliders[handle.collider].set_shape(shared_shape(shape, width, height));
        let colliders = &self.colliders;
        self.bodies[handle.body].recompute_mass_properties_from_colliders(colliders);
    }

    pub fn set_sensor(&mut self, handle: BodyHandle, sensor: bool) {
        self.colliders[handle.collider].set_sensor(sensor);
    }

    pub fn is_sensor(&self, handle: BodyHandle) -> bool {
        self.colliders[handle.collider].is_sensor()
    }

    pub fn set_body_type(&mut self, handle: BodyHandle, body_type: BodyType) {
        let rb_type = match body_type {
            BodyType::Static => RigidBodyType::Fixed,
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Kinematic => RigidBodyType::KinematicVelocityBased,
        };
        self.bodies[handle.body].set_body_type(rb_type, true);
    }

    pub fn body_type(&self, handle: BodyHandle) -> BodyType {
        let rb = &self.bodies[handle.body];
        if rb.is_dynamic() {
            BodyType::Dynamic
        } else if rb.is_kinematic() {
            BodyType::Kinematic
        } else {
            BodyType::Static
        }
    }

    fn update_tag(&mut self, handle: BodyHandle, edit: impl FnOnce(&mut ColliderTag)) {
        let collider = &mut self.colliders[handle.collider];
        let mut tag = ColliderTag::unpack(collider.user_data);
        edit(&mut tag);
        collider.user_data = tag.pack();
    }

    pub fn set_pass_through(&mut self, handle: BodyHandle, group: u32) {
        self.update_tag(handle, |tag| tag.pass_through = group);
    }

    pub fn set_one_sided(&mut self, handle: BodyHandle, side: Option<Side>) {
        self.update_tag(handle, |tag| tag.one_sided = side);
    }

    /// Enable or disable a body; disabled bodies generate no contacts
    pub fn set_enabled(&mut self, handle: BodyHandle, enabled: bool) {
        self.bodies[handle.body].set_enabled(enabled);
    }

    pub fn is_enabled(&self, handle: BodyHandle) -> bool {
        self.bodies[handle.body].is_enabled()
    }

    pub fn center(&self, handle: BodyHandle) -> Vec2 {
        to_vec2(self.bodies[handle.body].translation())
    }

    pub fn set_center(&mut self, handle: BodyHandle, center: Vec2) {
        self.bodies[handle.body].set_translation(to_vector(center), true);
    }

    pub fn velocity(&self, handle: BodyHandle) -> Vec2 {
        to_vec2(self.bodies[handle.body].linvel())
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        self.bodies[handle.body].set_linvel(to_vector(velocity), true);
    }

    /// Replace the persistent force acting on a body
    pub fn set_force(&mut self, handle: BodyHandle, force: Vec2) {
        let rb = &mut self.bodies[handle.body];
        rb.reset_forces(false);
        rb.add_force(to_vector(force), true);
    }

    pub fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec2) {
        self.bodies[handle.body].apply_impulse(to_vector(impulse), true);
    }

    pub fn rotation(&self, handle: BodyHandle) -> f32 {
        self.bodies[handle.body].rotation().angle()
    }

    pub fn set_rotation(&mut self, handle: BodyHandle, angle: f32) {
        self.bodies[handle.body].set_rotation(Rotation::new(angle), true);
    }

    pub fn set_fixed_rotation(&mut self, handle: BodyHandle, fixed: bool) {
        let rb = &mut self.bodies[handle.body];
        rb.lock_rotations(fixed, true);
        if fixed {
            rb.set_angvel(0.0, true);
        }
    }

    pub fn set_gravity_scale(&mut self, handle: BodyHandle, scale: f32) {
        self.bodies[handle.body].set_gravity_scale(scale, true);
    }

    /// Mark a small fast body for continuous collision detection
    pub fn set_bullet(&mut self, handle: BodyHandle, bullet: bool) {
        self.bodies[handle.body].enable_ccd(bullet);
    }

    /// Number of bodies in the world (enabled or not)
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Step the simulation by `dt` and return the pairs that began touching
    pub fn step(&mut self, dt: f32) -> Vec<ContactPair> {
        self.integration_params.dt = dt;

        let (collision_send, collision_recv) =
            rapier2d::crossbeam::channel::unbounded::<CollisionEvent>();
        let (force_send, _force_recv) =
            rapier2d::crossbeam::channel::unbounded::<ContactForceEvent>();
        let event_handler = ChannelEventCollector::new(collision_send, force_send);

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &self.hooks,
            &event_handler,
        );

        let mut contacts = Vec::new();
        while let Ok(event) = collision_recv.try_recv() {
            if let CollisionEvent::Started(h1, h2, _flags) = event {
                let (Some(c1), Some(c2)) = (self.colliders.get(h1), self.colliders.get(h2)) else {
                    continue;
                };
                contacts.push(ContactPair {
                    a: ColliderTag::unpack(c1.user_data).entity,
                    b: ColliderTag::unpack(c2.user_data).entity,
                });
            }
        }

        // Channel delivery order is not stable; sort for deterministic replays
        contacts.sort_by_key(|c| (c.a.min(c.b), c.a.max(c.b)));
        contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(
        world: &mut PhysicsWorld,
        id: u32,
        body_type: BodyType,
        center: Vec2,
    ) -> BodyHandle {
        world.create_body(
            EntityId(id),
            Shape::Box,
            1.0,
            1.0,
            body_type,
            Material::default(),
            false,
            center,
        )
    }

    #[test]
    fn test_tag_pack_unpack() {
        let tag = ColliderTag {
            entity: EntityId(42),
            pass_through: 7,
            one_sided: Some(Side::Left),
        };
        assert_eq!(ColliderTag::unpack(tag.pack()), tag);
    }

    #[test]
    fn test_pass_through_requires_same_nonzero_group() {
        let tag = |group| ColliderTag {
            entity: EntityId(0),
            pass_through: group,
            one_sided: None,
        };
        assert!(tag(3).passes_through(&tag(3)));
        assert!(!tag(3).passes_through(&tag(4)));
        assert!(!tag(0).passes_through(&tag(0)));
    }

    #[test]
    fn test_dynamic_body_moves_after_step() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let h = unit_box(&mut world, 0, BodyType::Dynamic, Vec2::ZERO);
        world.set_velocity(h, Vec2::new(10.0, 0.0));
        world.step(1.0 / 60.0);
        assert!(world.center(h).x > 0.0);
    }

    #[test]
    fn test_gravity_scale_zero_floats() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, -10.0));
        let h = unit_box(&mut world, 0, BodyType::Dynamic, Vec2::ZERO);
        world.set_gravity_scale(h, 0.0);
        for _ in 0..30 {
            world.step(1.0 / 60.0);
        }
        assert!(world.center(h).y.abs() < 1.0e-4);
    }

    #[test]
    fn test_overlapping_bodies_report_contact() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let mover = unit_box(&mut world, 1, BodyType::Dynamic, Vec2::new(0.0, 0.0));
        unit_box(&mut world, 2, BodyType::Static, Vec2::new(3.0, 0.0));
        world.set_velocity(mover, Vec2::new(10.0, 0.0));

        let mut seen = false;
        for _ in 0..60 {
            for pair in world.step(1.0 / 60.0) {
                let ids = (pair.a.min(pair.b), pair.a.max(pair.b));
                if ids == (EntityId(1), EntityId(2)) {
                    seen = true;
                }
            }
        }
        assert!(seen);
    }

    #[test]
    fn test_disabled_body_reports_nothing() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let mover = unit_box(&mut world, 1, BodyType::Dynamic, Vec2::new(0.0, 0.0));
        let wall = unit_box(&mut world, 2, BodyType::Static, Vec2::new(3.0, 0.0));
        world.set_enabled(wall, false);
        world.set_velocity(mover, Vec2::new(10.0, 0.0));

        for _ in 0..60 {
            assert!(world.step(1.0 / 60.0).is_empty());
        }
        assert!(!world.is_enabled(wall));
    }

    #[test]
    fn test_pass_through_pair_reports_contact_without_response() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let mover = unit_box(&mut world, 1, BodyType::Dynamic, Vec2::new(0.0, 0.0));
        let wall = unit_box(&mut world, 2, BodyType::Static, Vec2::new(3.0, 0.0));
        world.set_pass_through(mover, 5);
        world.set_pass_through(wall, 5);
        world.set_velocity(mover, Vec2::new(10.0, 0.0));

        let mut seen = false;
        for _ in 0..60 {
            seen |= !world.step(1.0 / 60.0).is_empty();
        }
        assert!(seen);
        // Went straight through the wall
        assert!(world.center(mover).x > 4.5);
    }

    #[test]
    fn test_set_material_keeps_body() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let h = unit_box(&mut world, 0, BodyType::Dynamic, Vec2::new(2.0, 3.0));
        world.set_material(
            h,
            Material {
                density: 5.0,
                elasticity: 0.5,
                friction: 0.2,
            },
        );
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.center(h), Vec2::new(2.0, 3.0));
    }
}
