//! Waypoint routes
//!
//! A route drives an entity's velocity so its bottom-left corner travels from
//! waypoint to waypoint at constant speed. At the last waypoint a looping route
//! teleports back to the first one; a non-looping route stops there.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use super::level::Level;
use super::motion::Drive;
use super::physics::BodyType;
use crate::consts::ROUTE_EPSILON;
use crate::error::{EngineError, Result};

/// Ordered waypoints (bottom-left positions)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    points: Vec<Vec2>,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a waypoint
    pub fn to(mut self, x: f32, y: f32) -> Self {
        self.points.push(Vec2::new(x, y));
        self
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Distance from the first waypoint to the last
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

/// What the driven entity should do this step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteStep {
    Velocity(Vec2),
    /// Snap to `position` and continue with `velocity`
    Teleport { position: Vec2, velocity: Vec2 },
    /// Snap to `position` and stay there
    Stop { position: Vec2 },
    /// Route already finished
    Done,
}

/// Traversal state of one entity along a route
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDriver {
    route: Route,
    speed: f32,
    looping: bool,
    next: usize,
    done: bool,
}

impl RouteDriver {
    pub fn new(route: Route, speed: f32, looping: bool) -> Result<Self> {
        if route.len() < 2 {
            return Err(EngineError::InvalidRoute(route.len()));
        }
        Ok(Self {
            route,
            speed,
            looping,
            next: 1,
            done: false,
        })
    }

    pub fn start(&self) -> Vec2 {
        self.route.points[0]
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Velocity from `from` toward waypoint `to`
    fn heading_to(&self, from: Vec2, to: usize) -> Vec2 {
        (self.route.points[to] - from).normalize_or_zero() * self.speed
    }

    /// Advance along the route from `position` over `dt` seconds
    pub fn update(&mut self, position: Vec2, dt: f32) -> RouteStep {
        if self.done {
            return RouteStep::Done;
        }
        let target = self.route.points[self.next];
        let distance = position.distance(target);
        if distance > (self.speed * dt).max(ROUTE_EPSILON) {
            return RouteStep::Velocity(self.heading_to(position, self.next));
        }

        // Waypoint reached this step
        if self.next + 1 < self.route.len() {
            self.next += 1;
            RouteStep::Teleport {
                position: target,
                velocity: self.heading_to(target, self.next),
            }
        } else if self.looping {
            self.next = 1;
            let start = self.start();
            RouteStep::Teleport {
                position: start,
                velocity: self.heading_to(start, 1),
            }
        } else {
            self.done = true;
            RouteStep::Stop { position: target }
        }
    }
}

impl Level {
    /// Put `id` on a route. The entity jumps to the first waypoint; static
    /// bodies become kinematic so they can move.
    pub fn set_route(
        &mut self,
        id: EntityId,
        route: Route,
        speed: f32,
        looping: bool,
    ) -> Result<()> {
        let driver = RouteDriver::new(route, speed, looping)?;
        let body = self.entity(id).body;
        if self.physics.body_type(body) == BodyType::Static {
            self.physics.set_body_type(body, BodyType::Kinematic);
        }
        self.set_position(id, driver.start());
        self.entity_mut(id).drive = Drive::Route(driver);
        Ok(())
    }

    pub(crate) fn apply_route_step(&mut self, id: EntityId, step: RouteStep) {
        match step {
            RouteStep::Velocity(v) => self.set_velocity(id, v),
            RouteStep::Teleport { position, velocity } => {
                self.set_position(id, position);
                self.set_velocity(id, velocity);
            }
            RouteStep::Stop { position } => {
                self.set_position(id, position);
                self.set_velocity(id, Vec2::ZERO);
            }
            RouteStep::Done => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::test_util::{run_frames, test_level};

    fn square() -> Route {
        Route::new().to(0.0, 0.0).to(4.0, 0.0).to(4.0, 4.0).to(0.0, 4.0)
    }

    /// Integrate a driver the way a kinematic body would
    fn drive(driver: &mut RouteDriver, mut pos: Vec2, steps: usize) -> (Vec2, Vec<RouteStep>) {
        let mut log = Vec::new();
        let mut vel = Vec2::ZERO;
        for _ in 0..steps {
            let step = driver.update(pos, SIM_DT);
            match step {
                RouteStep::Velocity(v) => vel = v,
                RouteStep::Teleport { position, velocity } => {
                    pos = position;
                    vel = velocity;
                }
                RouteStep::Stop { position } => {
                    pos = position;
                    vel = Vec2::ZERO;
                }
                RouteStep::Done => {}
            }
            log.push(step);
            pos += vel * SIM_DT;
        }
        (pos, log)
    }

    #[test]
    fn test_needs_two_points() {
        let route = Route::new().to(1.0, 1.0);
        assert!(matches!(
            RouteDriver::new(route, 1.0, true),
            Err(EngineError::InvalidRoute(1))
        ));
    }

    #[test]
    fn test_looping_returns_to_start() {
        let route = square();
        let loop_time = route.length() / 2.0;
        let mut driver = RouteDriver::new(route, 2.0, true).unwrap();
        let steps = (loop_time / SIM_DT).ceil() as usize + 5;
        let (_, log) = drive(&mut driver, Vec2::ZERO, steps);

        let restart = log.iter().find(|s| {
            matches!(s, RouteStep::Teleport { position, .. } if *position == Vec2::ZERO)
        });
        assert!(restart.is_some());
        assert!(!driver.is_done());
    }

    #[test]
    fn test_non_looping_stops_at_last_point() {
        let mut driver = RouteDriver::new(square(), 3.0, false).unwrap();
        let (pos, log) = drive(&mut driver, Vec2::ZERO, 600);
        assert_eq!(pos, Vec2::new(0.0, 4.0));
        assert!(driver.is_done());
        assert!(log.contains(&RouteStep::Stop {
            position: Vec2::new(0.0, 4.0)
        }));
        assert_eq!(log.last(), Some(&RouteStep::Done));
    }

    #[test]
    fn test_enemy_route_in_world() {
        let mut level = test_level();
        let enemy = level.make_enemy_as_box(0.0, 0.0, 1.0, 1.0, "enemy.png").unwrap();
        let route = Route::new().to(2.0, 2.0).to(6.0, 2.0);
        level.set_route(enemy, route, 4.0, false).unwrap();
        assert_eq!(level.position(enemy), Vec2::new(2.0, 2.0));

        run_frames(&mut level, 120);
        assert!((level.position(enemy) - Vec2::new(6.0, 2.0)).length() < 1.0e-3);
        assert_eq!(level.velocity(enemy), Vec2::ZERO);
    }
}
