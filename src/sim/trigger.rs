//! Goodie-gated triggers and the handler registry
//!
//! Level scripts register handlers once and get a [`HandlerId`] back. Engine
//! code never calls a handler inline: it queues a `(handler, event)` pair and
//! the queue is flushed between steps, so handlers can freely create entities,
//! move things around, or win/lose the level through the `&mut Level` they
//! receive.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use super::level::Level;
use super::timer::{TimerAction, TimerId};
use crate::consts::GOODIE_CHANNELS;

/// Registered handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandlerId(pub u32);

/// Four goodie-count thresholds that must all be met
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodieGate {
    pub thresholds: [i32; GOODIE_CHANNELS],
}

impl GoodieGate {
    /// Always met
    pub const OPEN: Self = Self {
        thresholds: [0; GOODIE_CHANNELS],
    };

    pub fn new(thresholds: [i32; GOODIE_CHANNELS]) -> Self {
        Self { thresholds }
    }

    pub fn is_met(&self, goodies: &[i32; GOODIE_CHANNELS]) -> bool {
        goodies
            .iter()
            .zip(self.thresholds.iter())
            .all(|(have, need)| have >= need)
    }
}

/// What happened, as seen by a handler. `id` is the script-chosen tag given
/// at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TriggerEvent {
    HeroCollided {
        obstacle: EntityId,
        hero: EntityId,
        id: i32,
    },
    EnemyCollided {
        obstacle: EntityId,
        enemy: EntityId,
        id: i32,
    },
    ProjectileCollided {
        obstacle: EntityId,
        projectile: EntityId,
        id: i32,
    },
    Touched {
        entity: EntityId,
        id: i32,
    },
    EnemyDefeated {
        enemy: EntityId,
    },
    TimerFired {
        timer: TimerId,
        id: i32,
    },
    ControlPressed {
        id: i32,
    },
    ControlReleased {
        id: i32,
    },
    LevelWon,
    LevelLost,
}

/// Level-supplied reaction to a [`TriggerEvent`]
pub trait TriggerHandler {
    fn handle(&mut self, level: &mut Level, event: &TriggerEvent);
}

impl<F> TriggerHandler for F
where
    F: FnMut(&mut Level, &TriggerEvent),
{
    fn handle(&mut self, level: &mut Level, event: &TriggerEvent) {
        self(level, event)
    }
}

/// Handler storage. A handler is taken out while it runs so it can receive
/// the level mutably, then put back.
#[derive(Default)]
pub(crate) struct HandlerRegistry {
    slots: Vec<Option<Box<dyn TriggerHandler>>>,
}

impl HandlerRegistry {
    pub fn register(&mut self, handler: Box<dyn TriggerHandler>) -> HandlerId {
        self.slots.push(Some(handler));
        HandlerId(self.slots.len() as u32 - 1)
    }

    pub fn take(&mut self, id: HandlerId) -> Option<Box<dyn TriggerHandler>> {
        self.slots.get_mut(id.0 as usize).and_then(Option::take)
    }

    pub fn restore(&mut self, id: HandlerId, handler: Box<dyn TriggerHandler>) {
        if let Some(slot) = self.slots.get_mut(id.0 as usize) {
            *slot = Some(handler);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.slots.len())
            .finish()
    }
}

/// Registration on an obstacle for hero, enemy or projectile contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionTrigger {
    pub gate: GoodieGate,
    pub handler: HandlerId,
    pub id: i32,
    /// Seconds to wait before running; 0 runs right after the contact
    pub delay: f32,
}

/// Registration on any entity for a press on it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchTrigger {
    pub gate: GoodieGate,
    pub handler: HandlerId,
    pub id: i32,
    /// Remove the entity (before the handler runs)
    pub disappear: bool,
}

impl Level {
    pub fn register_handler(&mut self, handler: impl TriggerHandler + 'static) -> HandlerId {
        self.handlers.register(Box::new(handler))
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Make `entity` react to presses on it
    pub fn set_touch_trigger(
        &mut self,
        entity: EntityId,
        gate: GoodieGate,
        id: i32,
        disappear: bool,
        handler: impl TriggerHandler + 'static,
    ) {
        let handler = self.register_handler(handler);
        self.entity_mut(entity).touch_trigger = Some(TouchTrigger {
            gate,
            handler,
            id,
            disappear,
        });
    }

    pub(crate) fn queue(&mut self, handler: HandlerId, event: TriggerEvent) {
        self.pending.push_back((handler, event));
    }

    /// Run every queued handler in order. Handlers queued while flushing run
    /// in the same pass. Once the level has ended only the win/lose callbacks
    /// still run.
    pub(crate) fn flush_triggers(&mut self) {
        if self.flushing {
            return;
        }
        self.flushing = true;
        while let Some((id, event)) = self.pending.pop_front() {
            if !self.phase.allows(&event) {
                log::debug!("Dropping {event:?}, level already ended");
                continue;
            }
            let Some(mut handler) = self.handlers.take(id) else {
                log::warn!("Handler {} is missing or already running", id.0);
                continue;
            };
            handler.handle(self, &event);
            self.handlers.restore(id, handler);
        }
        self.flushing = false;
    }

    /// A qualifying collision happened; run or schedule its trigger if the
    /// gate is met now. Delayed triggers check the gate again when they fire.
    pub(crate) fn fire_collision_trigger(
        &mut self,
        trigger: CollisionTrigger,
        event: TriggerEvent,
    ) {
        if !trigger.gate.is_met(&self.score.goodies) {
            return;
        }
        if trigger.delay > 0.0 {
            self.timers.schedule(
                trigger.delay,
                0.0,
                TimerAction::Deferred {
                    handler: trigger.handler,
                    gate: trigger.gate,
                    event,
                },
            );
        } else {
            self.queue(trigger.handler, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::sim::test_util::test_level;

    #[test]
    fn test_gate_requires_every_channel() {
        let gate = GoodieGate::new([2, 0, 1, 0]);
        assert!(!gate.is_met(&[2, 0, 0, 0]));
        assert!(!gate.is_met(&[1, 5, 5, 5]));
        assert!(gate.is_met(&[2, 0, 1, 0]));
        assert!(GoodieGate::OPEN.is_met(&[0; GOODIE_CHANNELS]));
    }

    #[test]
    fn test_flush_runs_in_order_with_level_access() {
        let mut level = test_level();
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let log = seen.clone();
        let h = level.register_handler(move |level: &mut Level, event: &TriggerEvent| {
            if let TriggerEvent::ControlPressed { id } = event {
                log.borrow_mut().push(*id);
                level.add_goodies(0, 1);
            }
        });
        level.queue(h, TriggerEvent::ControlPressed { id: 1 });
        level.queue(h, TriggerEvent::ControlPressed { id: 2 });
        level.flush_triggers();
        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(level.goodies(0), 2);
    }

    #[test]
    fn test_handler_can_queue_more_work() {
        let mut level = test_level();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let second = level.register_handler(move |_: &mut Level, _: &TriggerEvent| {
            c.set(c.get() + 1);
        });
        let first = level.register_handler(move |level: &mut Level, _: &TriggerEvent| {
            level.queue(second, TriggerEvent::ControlPressed { id: 0 });
            level.flush_triggers();
        });
        level.queue(first, TriggerEvent::ControlPressed { id: 0 });
        level.flush_triggers();
        assert_eq!(count.get(), 1);
        assert!(level.pending.is_empty());
    }

    #[test]
    fn test_ended_level_drops_ordinary_events() {
        let mut level = test_level();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let h = level.register_handler(move |_: &mut Level, _: &TriggerEvent| c.set(c.get() + 1));
        level.lose("caught");
        level.queue(h, TriggerEvent::ControlPressed { id: 0 });
        level.flush_triggers();
        assert_eq!(count.get(), 0);
    }
}
