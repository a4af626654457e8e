//! Goodies: collectibles that feed the four score channels

use super::entity::{EntityId, Role, Shape, Spawn, wrong_kind};
use super::level::{GameEvent, Level};
use super::physics::BodyType;
use crate::consts::GOODIE_CHANNELS;
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct Goodie {
    /// Added to the level's goodie counters on pickup (may be negative)
    pub scores: [i32; GOODIE_CHANNELS],
    pub strength_boost: i32,
    /// Seconds of invincibility granted to the collector
    pub invincibility: f32,
}

impl Level {
    pub fn make_goodie_as_box(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: &str,
    ) -> Result<EntityId> {
        self.make_goodie(Shape::Box, x, y, width, height, image)
    }

    pub fn make_goodie_as_circle(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: &str,
    ) -> Result<EntityId> {
        self.make_goodie(Shape::Circle, x, y, width, height, image)
    }

    fn make_goodie(
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
        // Goodies count toward channel 0 unless told otherwise
        let goodie = Goodie {
            scores: [1, 0, 0, 0],
            ..Default::default()
        };
        Ok(self.spawn(spawn, Role::Goodie(goodie)))
    }

    pub fn goodie(&self, id: EntityId) -> Result<&Goodie> {
        match &self.entity(id).role {
            Role::Goodie(goodie) => Ok(goodie),
            _ => Err(wrong_kind(id, "goodie")),
        }
    }

    pub fn goodie_mut(&mut self, id: EntityId) -> Result<&mut Goodie> {
        match &mut self.entity_mut(id).role {
            Role::Goodie(goodie) => Ok(goodie),
            _ => Err(wrong_kind(id, "goodie")),
        }
    }

    pub fn set_goodie_score(&mut self, id: EntityId, scores: [i32; GOODIE_CHANNELS]) -> Result<()> {
        self.goodie_mut(id)?.scores = scores;
        Ok(())
    }

    pub fn set_strength_boost(&mut self, id: EntityId, boost: i32) -> Result<()> {
        self.goodie_mut(id)?.strength_boost = boost;
        Ok(())
    }

    pub fn set_invincibility_duration(&mut self, id: EntityId, seconds: f32) -> Result<()> {
        self.goodie_mut(id)?.invincibility = seconds;
        Ok(())
    }

    /// `hero` picks up `goodie`
    pub(crate) fn collect_goodie(&mut self, hero: EntityId, goodie: EntityId) {
        let Role::Goodie(g) = &self.entity(goodie).role else {
            return;
        };
        let g = g.clone();
        self.remove(goodie, false);
        if let Some(h) = self.hero_state(hero) {
            h.strength = (h.strength + g.strength_boost).max(0);
            if g.invincibility > 0.0 {
                h.invincible_remaining = h.invincible_remaining.max(0.0) + g.invincibility;
            }
        }
        for (have, delta) in self.score.goodies.iter_mut().zip(g.scores) {
            *have += delta;
        }
        self.events.push(GameEvent::GoodieCollected { goodie, hero });
        self.check_victory();
    }
}

#[cfg(test)]
mod tests {
    use crate::sim::test_util::test_level;

    #[test]
    fn test_goodie_is_sensor_by_default() {
        let mut level = test_level();
        let id = level.make_goodie_as_circle(0.0, 0.0, 1.0, 1.0, "coin.png").unwrap();
        assert!(level.is_sensor(id));
        assert_eq!(level.goodie(id).unwrap().scores, [1, 0, 0, 0]);
    }

    #[test]
    fn test_collect_applies_everything() {
        let mut level = test_level();
        let hero = level.make_hero_as_box(0.0, 0.0, 1.0, 1.0, "hero.png").unwrap();
        let coin = level.make_goodie_as_circle(0.0, 0.0, 1.0, 1.0, "coin.png").unwrap();
        level.set_goodie_score(coin, [0, 2, -1, 0]).unwrap();
        level.set_strength_boost(coin, 3).unwrap();
        level.set_invincibility_duration(coin, 2.0).unwrap();

        level.collect_goodie(hero, coin);
        assert!(!level.is_enabled(coin));
        assert_eq!(level.score().goodies, [0, 2, -1, 0]);
        assert_eq!(level.strength(hero).unwrap(), 4);
        assert!(level.hero(hero).unwrap().is_invincible());
    }
}
