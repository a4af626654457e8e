//! Touch handling
//!
//! Each press is offered to the HUD controls first (screen space), then to
//! the topmost entity under it (world space). A press on empty space moves the
//! poke-selected entity, if any.

use glam::Vec2;

use super::entity::{EntityId, PokeMode, Role};
use super::hero::HeroTouch;
use super::level::Level;
use super::motion::Drive;
use super::tick::{Touch, TouchPhase};
use super::trigger::TriggerEvent;

impl Level {
    pub(crate) fn process_touch(&mut self, touch: &Touch) {
        match touch.phase {
            TouchPhase::Down => self.touch_down(touch),
            TouchPhase::Move => self.touch_move(touch.world),
            TouchPhase::Up => self.touch_up(),
        }
    }

    /// Topmost (most recently created) enabled entity under `point`
    pub fn entity_at(&self, point: Vec2) -> Option<EntityId> {
        self.entities
            .iter()
            .rev()
            .filter(|e| e.enabled)
            .map(|e| e.id)
            .find(|&id| self.contains_point(id, point))
    }

    fn touch_down(&mut self, touch: &Touch) {
        if let Some(control) = self.controls.hit(touch.screen) {
            self.press_control(control);
            return;
        }
        self.set_finger_targets(Some(touch.world));
        match self.entity_at(touch.world) {
            Some(id) => self.touch_entity(id),
            None => self.poke_empty(touch.world),
        }
    }

    fn touch_entity(&mut self, id: EntityId) {
        if let Some(trigger) = self.entity(id).touch_trigger {
            if trigger.gate.is_met(&self.score.goodies) {
                if trigger.disappear {
                    self.remove(id, false);
                }
                self.queue(
                    trigger.handler,
                    TriggerEvent::Touched {
                        entity: id,
                        id: trigger.id,
                    },
                );
                self.flush_triggers();
            }
            return;
        }

        let (defeat, hero_touch) = match &self.entity(id).role {
            Role::Enemy(enemy) => (enemy.disappear_on_touch, None),
            Role::Hero(hero) => (false, hero.touch),
            _ => (false, None),
        };
        if defeat {
            self.defeat_enemy(id);
            return;
        }
        match hero_touch {
            Some(HeroTouch::Jump) => {
                if let Err(e) = self.jump(id) {
                    log::warn!("Touch jump: {e}");
                }
            }
            Some(HeroTouch::Throw { offset, velocity }) => {
                if let Err(e) = self.throw_fixed(id, offset, velocity) {
                    log::warn!("Touch throw: {e}");
                }
            }
            None => {}
        }

        let e = self.entity(id);
        let (draggable, poke) = (e.draggable, e.poke);
        if draggable {
            self.touch.dragging = Some(id);
        }
        if poke.is_some() {
            self.touch.poke_selected = Some(id);
        }
    }

    fn poke_empty(&mut self, point: Vec2) {
        let Some(selected) = self.touch.poke_selected.take() else {
            return;
        };
        if !self.is_enabled(selected) {
            return;
        }
        match self.entity(selected).poke {
            Some(PokeMode::Place) => self.set_center(selected, point),
            Some(PokeMode::Velocity(speed)) => self.seek(selected, point, speed),
            None => {}
        }
    }

    fn touch_move(&mut self, point: Vec2) {
        if let Some(id) = self.touch.dragging {
            self.set_center(id, point);
        }
        self.set_finger_targets(Some(point));
    }

    fn touch_up(&mut self) {
        self.touch.dragging = None;
        self.set_finger_targets(None);
        for control in std::mem::take(&mut self.touch.pressed) {
            self.release_control(control);
        }
    }

    fn set_finger_targets(&mut self, point: Option<Vec2>) {
        for e in &mut self.entities {
            if let Drive::FingerChase { target, .. } = &mut e.drive {
                *target = point;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::test_util::{run_frames, test_level};
    use crate::sim::trigger::GoodieGate;

    fn press(level: &mut Level, world: Vec2) {
        level.process_touch(&Touch::down(world, world));
    }

    #[test]
    fn test_topmost_entity_is_hit() {
        let mut level = test_level();
        level.make_obstacle_as_box(0.0, 0.0, 4.0, 4.0, "wall.png").unwrap();
        let top = level.make_goodie_as_box(1.0, 1.0, 1.0, 1.0, "coin.png").unwrap();
        assert_eq!(level.entity_at(Vec2::new(1.5, 1.5)), Some(top));
        level.remove(top, true);
        assert_ne!(level.entity_at(Vec2::new(1.5, 1.5)), Some(top));
    }

    #[test]
    fn test_touch_trigger_removes_before_callback() {
        let mut level = test_level();
        let coin = level.make_goodie_as_box(0.0, 0.0, 1.0, 1.0, "coin.png").unwrap();
        let seen_enabled = Rc::new(Cell::new(None));
        let s = seen_enabled.clone();
        level.set_touch_trigger(
            coin,
            GoodieGate::OPEN,
            4,
            true,
            move |level: &mut Level, event: &TriggerEvent| {
                if let TriggerEvent::Touched { entity, id } = *event {
                    assert_eq!(id, 4);
                    s.set(Some(level.is_enabled(entity)));
                }
            },
        );
        press(&mut level, Vec2::new(0.5, 0.5));
        assert_eq!(seen_enabled.get(), Some(false));
    }

    #[test]
    fn test_touch_trigger_gated() {
        let mut level = test_level();
        let wall = level.make_obstacle_as_box(0.0, 0.0, 1.0, 1.0, "wall.png").unwrap();
        let fired = Rc::new(Cell::new(0));
        let f = fired.clone();
        level.set_touch_trigger(
            wall,
            GoodieGate::new([0, 0, 0, 1]),
            0,
            false,
            move |_: &mut Level, _: &TriggerEvent| f.set(f.get() + 1),
        );
        press(&mut level, Vec2::new(0.5, 0.5));
        assert_eq!(fired.get(), 0);
        level.add_goodies(3, 1);
        press(&mut level, Vec2::new(0.5, 0.5));
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_disappear_on_touch_enemy() {
        let mut level = test_level();
        let enemy = level.make_enemy_as_box(0.0, 0.0, 1.0, 1.0, "enemy.png").unwrap();
        level.set_disappear_on_touch(enemy).unwrap();
        press(&mut level, Vec2::new(0.5, 0.5));
        assert!(!level.is_enabled(enemy));
        assert_eq!(level.score().enemies_defeated, 1);
    }

    #[test]
    fn test_drag_follows_finger() {
        let mut level = test_level();
        let block = level.make_obstacle_as_box(0.0, 0.0, 2.0, 2.0, "wall.png").unwrap();
        level.set_draggable(block, true);
        press(&mut level, Vec2::new(1.0, 1.0));
        let to = Vec2::new(6.0, 3.0);
        level.process_touch(&Touch::moved(to, to));
        assert_eq!(level.center(block), to);
        level.process_touch(&Touch::up(to, to));
        level.process_touch(&Touch::moved(Vec2::ZERO, Vec2::ZERO));
        assert_eq!(level.center(block), to);
    }

    #[test]
    fn test_poke_place() {
        let mut level = test_level();
        let block = level.make_obstacle_as_box(0.0, 0.0, 2.0, 2.0, "wall.png").unwrap();
        level.set_poke(block, PokeMode::Place);
        press(&mut level, Vec2::new(1.0, 1.0));
        press(&mut level, Vec2::new(10.0, 10.0));
        assert_eq!(level.center(block), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_control_takes_precedence() {
        let mut level = test_level();
        let hero = level.make_hero_as_box(0.0, 0.0, 1.0, 1.0, "hero.png").unwrap();
        level.set_draggable(hero, true);
        level.add_crawl_control(crate::sim::controls::Rect::new(0.0, 0.0, 1.0, 1.0), hero);
        level.process_touch(&Touch::down(Vec2::new(0.5, 0.5), Vec2::new(0.5, 0.5)));
        assert!(level.hero(hero).unwrap().crawling);
        assert_eq!(level.touch.dragging, None);
        level.process_touch(&Touch::up(Vec2::ZERO, Vec2::ZERO));
        assert!(!level.hero(hero).unwrap().crawling);
    }

    #[test]
    fn test_finger_chase_follows_held_finger() {
        let mut level = test_level();
        let hero = level.make_hero_as_box(0.0, 0.0, 1.0, 1.0, "hero.png").unwrap();
        level.set_finger_chase(hero, 2.0);
        press(&mut level, Vec2::new(10.5, 0.5));
        level.apply_drives(SIM_DT, None);
        assert_eq!(level.velocity(hero), Vec2::new(2.0, 0.0));

        level.process_touch(&Touch::up(Vec2::ZERO, Vec2::ZERO));
        level.apply_drives(SIM_DT, None);
        assert_eq!(level.velocity(hero), Vec2::ZERO);
    }

    #[test]
    fn test_poke_velocity_travels_and_stops() {
        let mut level = test_level();
        let block = level.make_obstacle_as_box(0.0, 0.0, 2.0, 2.0, "wall.png").unwrap();
        level.set_poke(block, PokeMode::Velocity(5.0));
        press(&mut level, Vec2::new(1.0, 1.0));
        press(&mut level, Vec2::new(11.0, 1.0));
        assert_eq!(level.center(block), Vec2::new(1.0, 1.0));

        run_frames(&mut level, 180);
        assert_eq!(level.position(block), Vec2::new(10.0, 0.0));
        assert_eq!(level.velocity(block), Vec2::ZERO);
        assert_eq!(*level.drive(block), Drive::None);
    }
}
