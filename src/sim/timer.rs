//! One-shot and repeating timers
//!
//! Timers accumulate only unpaused simulation time and are cancelled en masse
//! when the level ends.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use super::level::Level;
use super::trigger::{GoodieGate, HandlerId, TriggerEvent, TriggerHandler};
use crate::consts::SIM_DT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u32);

/// What a timer does when it fires
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TimerAction {
    /// Run a script handler with `TimerFired`
    Call { handler: HandlerId, id: i32 },
    /// A delayed collision trigger; the gate is checked again on fire
    Deferred {
        handler: HandlerId,
        gate: GoodieGate,
        event: TriggerEvent,
    },
    /// Take back a temporary speed boost
    EndSpeedBoost { hero: EntityId, velocity: Vec2 },
}

#[derive(Debug)]
struct Timer {
    id: TimerId,
    remaining: f32,
    /// 0 for one-shot
    interval: f32,
    action: TimerAction,
}

#[derive(Debug, Default)]
pub(crate) struct Timers {
    timers: Vec<Timer>,
    next_id: u32,
}

impl Timers {
    /// Queue an action. A repeating interval is raised to at least one
    /// simulation step.
    pub fn schedule(&mut self, delay: f32, interval: f32, action: TimerAction) -> TimerId {
        let interval = if interval > 0.0 {
            interval.max(SIM_DT)
        } else {
            0.0
        };
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            remaining: delay.max(0.0),
            interval,
            action,
        });
        id
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Advance every timer by `dt` and return the actions that came due, in
    /// firing order. A repeating timer fires once per elapsed interval.
    pub fn advance(&mut self, dt: f32) -> Vec<(TimerId, TimerAction)> {
        let mut due: Vec<(f32, TimerId, TimerAction)> = Vec::new();
        for timer in &mut self.timers {
            timer.remaining -= dt;
            while timer.remaining <= 0.0 {
                // How far into this dt the firing happened, for ordering
                due.push((timer.remaining, timer.id, timer.action.clone()));
                if timer.interval > 0.0 {
                    timer.remaining += timer.interval;
                } else {
                    break;
                }
            }
        }
        self.timers
            .retain(|t| t.remaining > 0.0 || t.interval > 0.0);

        // Most negative remaining fired earliest
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.0.cmp(&b.1.0)));
        due.into_iter().map(|(_, id, action)| (id, action)).collect()
    }
}

impl Level {
    /// Run `handler` after `delay` seconds, then every `repeat` seconds if
    /// `repeat > 0`, until the level ends. Repeats never run more than once
    /// per simulation step.
    pub fn schedule(
        &mut self,
        delay: f32,
        repeat: f32,
        id: i32,
        handler: impl TriggerHandler + 'static,
    ) -> TimerId {
        let handler = self.register_handler(handler);
        self.timers
            .schedule(delay, repeat, TimerAction::Call { handler, id })
    }

    /// Number of timers that have not finished yet
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Fire every timer that came due during `dt`
    pub(crate) fn run_timers(&mut self, dt: f32) {
        for (timer, action) in self.timers.advance(dt) {
            if !self.phase.is_active() {
                break;
            }
            match action {
                TimerAction::Call { handler, id } => {
                    self.queue(handler, TriggerEvent::TimerFired { timer, id });
                }
                TimerAction::Deferred {
                    handler,
                    gate,
                    event,
                } => {
                    if gate.is_met(&self.score.goodies) {
                        self.queue(handler, event);
                    } else {
                        log::debug!("Delayed trigger gate no longer met");
                    }
                }
                TimerAction::EndSpeedBoost { hero, velocity } => {
                    if self.is_enabled(hero) {
                        self.add_velocity(hero, -velocity);
                    }
                }
            }
            self.flush_triggers();
        }
    }
}
