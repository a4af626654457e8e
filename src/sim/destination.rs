//! Destinations: where heroes go to finish a level

use super::entity::{EntityId, Role, Shape, Spawn, wrong_kind};
use super::level::{GameEvent, Level};
use super::physics::BodyType;
use super::trigger::GoodieGate;
use crate::assets::SoundId;
use crate::consts::*;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Destination {
    pub capacity: u32,
    /// Never exceeds `capacity`
    pub holding: u32,
    /// Goodie counts required before any hero may arrive
    pub activation: GoodieGate,
    pub arrival_sound: Option<SoundId>,
}

impl Default for Destination {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_DESTINATION_CAPACITY,
            holding: 0,
            activation: GoodieGate::OPEN,
            arrival_sound: None,
        }
    }
}

impl Level {
    pub fn make_destination_as_box(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: &str,
    ) -> Result<EntityId> {
        self.make_destination(Shape::Box, x, y, width, height, image)
    }

    pub fn make_destination_as_circle(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: &str,
    ) -> Result<EntityId> {
        self.make_destination(Shape::Circle, x, y, width, height, image)
    }

    fn make_destination(
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
            sensor: true,
        };
        Ok(self.spawn(spawn, Role::Destination(Destination::default())))
    }

    pub fn destination(&self, id: EntityId) -> Result<&Destination> {
        match &self.entity(id).role {
            Role::Destination(d) => Ok(d),
            _ => Err(wrong_kind(id, "destination")),
        }
    }

    pub fn destination_mut(&mut self, id: EntityId) -> Result<&mut Destination> {
        match &mut self.entity_mut(id).role {
            Role::Destination(d) => Ok(d),
            _ => Err(wrong_kind(id, "destination")),
        }
    }

    pub fn set_capacity(&mut self, id: EntityId, capacity: u32) -> Result<()> {
        self.destination_mut(id)?.capacity = capacity;
        Ok(())
    }

    pub fn set_activation_score(
        &mut self,
        id: EntityId,
        thresholds: [i32; GOODIE_CHANNELS],
    ) -> Result<()> {
        self.destination_mut(id)?.activation = GoodieGate::new(thresholds);
        Ok(())
    }

    pub fn set_arrival_sound(&mut self, id: EntityId, sound: &str) -> Result<()> {
        let sound = self.assets.sound(sound)?;
        self.destination_mut(id)?.arrival_sound = Some(sound);
        Ok(())
    }

    /// `hero` touches `destination`. Returns whether the hero was accepted.
    pub(crate) fn arrive(&mut self, hero: EntityId, destination: EntityId) -> bool {
        let goodies = self.score.goodies;
        let Ok(dest) = self.destination_mut(destination) else {
            return false;
        };
        if !dest.activation.is_met(&goodies) || dest.holding >= dest.capacity {
            return false;
        }
        dest.holding += 1;
        let sound = dest.arrival_sound;

        self.remove(hero, true);
        if let Some(sound) = sound {
            self.play_sound(sound);
        }
        self.score.destination_arrivals += 1;
        self.events.push(GameEvent::HeroArrived { hero, destination });
        log::debug!("Hero {hero} arrived at {destination}");
        self.check_victory();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::test_util::test_level;

    #[test]
    fn test_capacity_is_respected() {
        let mut level = test_level();
        let a = level.make_hero_as_box(0.0, 0.0, 1.0, 1.0, "hero.png").unwrap();
        let b = level.make_hero_as_box(0.0, 0.0, 1.0, 1.0, "hero.png").unwrap();
        let flag = level.make_destination_as_box(0.0, 0.0, 2.0, 2.0, "flag.png").unwrap();

        assert!(level.arrive(a, flag));
        assert!(!level.arrive(b, flag));
        assert!(level.is_enabled(b));
        assert_eq!(level.destination(flag).unwrap().holding, 1);
        assert_eq!(level.score().destination_arrivals, 1);
    }

    #[test]
    fn test_activation_gate() {
        let mut level = test_level();
        let hero = level.make_hero_as_box(0.0, 0.0, 1.0, 1.0, "hero.png").unwrap();
        let flag = level.make_destination_as_box(0.0, 0.0, 2.0, 2.0, "flag.png").unwrap();
        level.set_activation_score(flag, [1, 0, 0, 0]).unwrap();

        assert!(!level.arrive(hero, flag));
        level.add_goodies(0, 1);
        assert!(level.arrive(hero, flag));
    }

    #[test]
    fn test_arrival_is_quiet_but_plays_arrival_sound() {
        let mut level = test_level();
        let hero = level.make_hero_as_box(0.0, 0.0, 1.0, 1.0, "hero.png").unwrap();
        level.set_disappear_sound(hero, "pop.ogg").unwrap();
        let flag = level.make_destination_as_box(0.0, 0.0, 2.0, 2.0, "flag.png").unwrap();
        level.set_arrival_sound(flag, "win.ogg").unwrap();
        let win = level.assets().sound("win.ogg").unwrap();

        level.arrive(hero, flag);
        let sounds: Vec<_> = level
            .events()
            .iter()
            .filter_map(|e| match e {
                GameEvent::PlaySound(s) => Some(*s),
                _ => None,
            })
            .collect();
        assert_eq!(sounds, vec![win]);
    }
}
