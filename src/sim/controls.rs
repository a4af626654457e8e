//! On-screen control regions
//!
//! The HUD itself is drawn by the host; the engine only knows each control's
//! screen rectangle and what pressing it does.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use super::level::Level;
use super::trigger::{HandlerId, TriggerEvent, TriggerHandler};

/// Axis-aligned screen rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + width, y + height),
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    /// Run a handler on press
    Tap { handler: HandlerId, id: i32 },
    /// Separate handlers for press and release
    Toggle {
        down: HandlerId,
        up: HandlerId,
        id: i32,
    },
    Jump(EntityId),
    Throw {
        hero: EntityId,
        offset: Vec2,
        velocity: Vec2,
    },
    /// Crawl while held
    Crawl(EntityId),
}

#[derive(Debug, Clone)]
struct Control {
    rect: Rect,
    action: ControlAction,
    /// Held down (toggles and crawl)
    active: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Controls {
    list: Vec<Control>,
}

impl Controls {
    fn add(&mut self, rect: Rect, action: ControlAction) -> usize {
        self.list.push(Control {
            rect,
            action,
            active: false,
        });
        self.list.len() - 1
    }

    /// Topmost (last added) control under `screen`
    pub fn hit(&self, screen: Vec2) -> Option<usize> {
        self.list.iter().rposition(|c| c.rect.contains(screen))
    }
}

impl Level {
    pub fn add_tap_control(
        &mut self,
        rect: Rect,
        id: i32,
        handler: impl TriggerHandler + 'static,
    ) -> usize {
        let handler = self.register_handler(handler);
        self.controls.add(rect, ControlAction::Tap { handler, id })
    }

    pub fn add_toggle_control(
        &mut self,
        rect: Rect,
        id: i32,
        down: impl TriggerHandler + 'static,
        up: impl TriggerHandler + 'static,
    ) -> usize {
        let down = self.register_handler(down);
        let up = self.register_handler(up);
        self.controls.add(rect, ControlAction::Toggle { down, up, id })
    }

    pub fn add_jump_control(&mut self, rect: Rect, hero: EntityId) -> usize {
        self.controls.add(rect, ControlAction::Jump(hero))
    }

    pub fn add_throw_control(
        &mut self,
        rect: Rect,
        hero: EntityId,
        offset: Vec2,
        velocity: Vec2,
    ) -> usize {
        self.controls.add(
            rect,
            ControlAction::Throw {
                hero,
                offset,
                velocity,
            },
        )
    }

    pub fn add_crawl_control(&mut self, rect: Rect, hero: EntityId) -> usize {
        self.controls.add(rect, ControlAction::Crawl(hero))
    }

    pub fn is_control_active(&self, control: usize) -> bool {
        self.controls.list.get(control).is_some_and(|c| c.active)
    }

    /// Press a control. Pressing a held toggle again does nothing.
    pub(crate) fn press_control(&mut self, index: usize) {
        let Some(control) = self.controls.list.get_mut(index) else {
            return;
        };
        let action = control.action;
        let held = matches!(action, ControlAction::Toggle { .. } | ControlAction::Crawl(_));
        if held {
            if control.active {
                return;
            }
            control.active = true;
        }
        match action {
            ControlAction::Tap { handler, id } => {
                self.queue(handler, TriggerEvent::ControlPressed { id });
            }
            ControlAction::Toggle { down, id, .. } => {
                self.queue(down, TriggerEvent::ControlPressed { id });
            }
            ControlAction::Jump(hero) => {
                if let Err(e) = self.jump(hero) {
                    log::warn!("Jump control: {e}");
                }
            }
            ControlAction::Throw {
                hero,
                offset,
                velocity,
            } => {
                if let Err(e) = self.throw_fixed(hero, offset, velocity) {
                    log::warn!("Throw control: {e}");
                }
            }
            ControlAction::Crawl(hero) => {
                if let Err(e) = self.crawl_on(hero) {
                    log::warn!("Crawl control: {e}");
                }
            }
        }
        if held {
            self.touch.pressed.push(index);
        }
        self.flush_triggers();
    }

    /// Release a control. Releasing one that is not held does nothing.
    pub(crate) fn release_control(&mut self, index: usize) {
        let Some(control) = self.controls.list.get_mut(index) else {
            return;
        };
        if !control.active {
            return;
        }
        control.active = false;
        let action = control.action;
        match action {
            ControlAction::Toggle { up, id, .. } => {
                self.queue(up, TriggerEvent::ControlReleased { id });
            }
            ControlAction::Crawl(hero) => {
                if let Err(e) = self.crawl_off(hero) {
                    log::warn!("Crawl control: {e}");
                }
            }
            _ => {}
        }
        self.flush_triggers();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::sim::test_util::test_level;

    #[test]
    fn test_rect_contains() {
        let r = Rect::new(0.0, 0.0, 2.0, 1.0);
        assert!(r.contains(Vec2::new(2.0, 1.0)));
        assert!(!r.contains(Vec2::new(2.1, 0.5)));
    }

    #[test]
    fn test_toggle_press_twice_is_noop() {
        let mut level = test_level();
        let log = Rc::new(RefCell::new(Vec::new()));
        let (d, u) = (log.clone(), log.clone());
        let c = level.add_toggle_control(
            Rect::new(0.0, 0.0, 1.0, 1.0),
            3,
            move |_: &mut Level, e: &TriggerEvent| d.borrow_mut().push(e.clone()),
            move |_: &mut Level, e: &TriggerEvent| u.borrow_mut().push(e.clone()),
        );
        level.press_control(c);
        level.press_control(c);
        assert!(level.is_control_active(c));
        level.release_control(c);
        level.release_control(c);
        assert_eq!(
            *log.borrow(),
            vec![
                TriggerEvent::ControlPressed { id: 3 },
                TriggerEvent::ControlReleased { id: 3 }
            ]
        );
    }

    #[test]
    fn test_topmost_control_wins() {
        let mut level = test_level();
        let hero = level.make_hero_as_box(0.0, 0.0, 1.0, 1.0, "hero.png").unwrap();
        level.add_jump_control(Rect::new(0.0, 0.0, 10.0, 10.0), hero);
        let crawl = level.add_crawl_control(Rect::new(0.0, 0.0, 2.0, 2.0), hero);
        assert_eq!(level.controls.hit(Vec2::new(1.0, 1.0)), Some(crawl));
        assert_eq!(level.controls.hit(Vec2::new(20.0, 1.0)), None);
    }
}
