//! Enemies: things that hurt heroes

use super::entity::{EntityId, EntityKind, Role, Shape, Spawn, wrong_kind};
use super::level::{GameEvent, Level};
use super::physics::BodyType;
use super::trigger::{HandlerId, TriggerEvent, TriggerHandler};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Enemy {
    /// Strength taken from a hero on contact; projectile hits wear it down
    pub damage: i32,
    /// Invincible heroes neither harm nor are harmed by this enemy
    pub resist_invincibility: bool,
    /// Hurts heroes even while they are invincible
    pub immune_to_invincibility: bool,
    pub defeat_by_crawl: bool,
    pub defeat_by_jump: bool,
    /// Pressing the enemy defeats it
    pub disappear_on_touch: bool,
    /// Shown if this enemy defeats the last hero; empty for the default
    pub defeat_text: String,
    pub on_defeat: Option<HandlerId>,
}

impl Enemy {
    fn new(damage: i32) -> Self {
        Self {
            damage,
            resist_invincibility: false,
            immune_to_invincibility: false,
            defeat_by_crawl: false,
            defeat_by_jump: false,
            disappear_on_touch: false,
            defeat_text: String::new(),
            on_defeat: None,
        }
    }
}

impl Level {
    pub fn make_enemy_as_box(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: &str,
    ) -> Result<EntityId> {
        self.make_enemy(Shape::Box, x, y, width, height, image)
    }

    pub fn make_enemy_as_circle(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: &str,
    ) -> Result<EntityId> {
        self.make_enemy(Shape::Circle, x, y, width, height, image)
    }

    fn make_enemy(
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
        let id = self.spawn(spawn, Role::Enemy(Enemy::new(self.config.enemy_damage)));
        self.score.enemies_created += 1;
        Ok(id)
    }

    pub fn enemy(&self, id: EntityId) -> Result<&Enemy> {
        match &self.entity(id).role {
            Role::Enemy(enemy) => Ok(enemy),
            _ => Err(wrong_kind(id, "enemy")),
        }
    }

    pub fn enemy_mut(&mut self, id: EntityId) -> Result<&mut Enemy> {
        match &mut self.entity_mut(id).role {
            Role::Enemy(enemy) => Ok(enemy),
            _ => Err(wrong_kind(id, "enemy")),
        }
    }

    pub fn damage(&self, id: EntityId) -> Result<i32> {
        Ok(self.enemy(id)?.damage)
    }

    pub fn set_damage(&mut self, id: EntityId, damage: i32) -> Result<()> {
        self.enemy_mut(id)?.damage = damage;
        Ok(())
    }

    pub fn set_resist_invincibility(&mut self, id: EntityId) -> Result<()> {
        self.enemy_mut(id)?.resist_invincibility = true;
        Ok(())
    }

    pub fn set_immune_to_invincibility(&mut self, id: EntityId) -> Result<()> {
        self.enemy_mut(id)?.immune_to_invincibility = true;
        Ok(())
    }

    pub fn set_defeat_by_crawl(&mut self, id: EntityId) -> Result<()> {
        self.enemy_mut(id)?.defeat_by_crawl = true;
        Ok(())
    }

    pub fn set_defeat_by_jump(&mut self, id: EntityId) -> Result<()> {
        self.enemy_mut(id)?.defeat_by_jump = true;
        Ok(())
    }

    pub fn set_disappear_on_touch(&mut self, id: EntityId) -> Result<()> {
        self.enemy_mut(id)?.disappear_on_touch = true;
        Ok(())
    }

    pub fn set_defeat_text(&mut self, id: EntityId, text: &str) -> Result<()> {
        self.enemy_mut(id)?.defeat_text = text.to_string();
        Ok(())
    }

    /// Run `handler` with `EnemyDefeated` when this enemy is defeated
    pub fn set_on_defeat(
        &mut self,
        id: EntityId,
        handler: impl TriggerHandler + 'static,
    ) -> Result<()> {
        self.enemy(id)?;
        let handler = self.register_handler(handler);
        self.enemy_mut(id)?.on_defeat = Some(handler);
        Ok(())
    }

    /// Defeat an enemy. Returns false if it was already gone, in which case
    /// nothing is counted again.
    pub fn defeat_enemy(&mut self, id: EntityId) -> bool {
        if !self.is_enabled(id) || self.kind(id) != EntityKind::Enemy {
            return false;
        }
        let on_defeat = match &self.entity(id).role {
            Role::Enemy(enemy) => enemy.on_defeat,
            _ => None,
        };
        self.remove(id, false);
        self.score.enemies_defeated += 1;
        self.events.push(GameEvent::EnemyDefeated { enemy: id });
        log::debug!(
            "Enemy {id} defeated ({}/{})",
            self.score.enemies_defeated,
            self.score.enemies_created
        );
        if let Some(handler) = on_defeat {
            self.queue(handler, TriggerEvent::EnemyDefeated { enemy: id });
        }
        self.flush_triggers();
        self.check_victory();
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::sim::score::EnemyGoal;
    use crate::sim::test_util::test_level;

    #[test]
    fn test_default_damage() {
        let mut level = test_level();
        let id = level.make_enemy_as_circle(0.0, 0.0, 1.0, 1.0, "enemy.png").unwrap();
        assert_eq!(level.damage(id).unwrap(), 2);
        assert_eq!(level.score().enemies_created, 1);
    }

    #[test]
    fn test_defeat_is_idempotent() {
        let mut level = test_level();
        let id = level.make_enemy_as_box(0.0, 0.0, 1.0, 1.0, "enemy.png").unwrap();
        level.make_enemy_as_box(3.0, 0.0, 1.0, 1.0, "enemy.png").unwrap();
        assert!(level.defeat_enemy(id));
        assert!(!level.defeat_enemy(id));
        assert_eq!(level.score().enemies_defeated, 1);
    }

    #[test]
    fn test_defeat_callback_and_victory() {
        let mut level = test_level();
        level.set_victory_enemy_count(EnemyGoal::All);
        let a = level.make_enemy_as_box(0.0, 0.0, 1.0, 1.0, "enemy.png").unwrap();
        let b = level.make_enemy_as_box(3.0, 0.0, 1.0, 1.0, "enemy.png").unwrap();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        level
            .set_on_defeat(a, move |level: &mut Level, event: &TriggerEvent| {
                assert_eq!(*event, TriggerEvent::EnemyDefeated { enemy: a });
                assert!(!level.is_enabled(a));
                h.set(h.get() + 1);
            })
            .unwrap();

        level.defeat_enemy(a);
        assert_eq!(hits.get(), 1);
        assert!(level.phase().is_active());
        level.defeat_enemy(b);
        assert!(level.phase().is_won());
    }
}
