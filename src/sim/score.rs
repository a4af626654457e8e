//! Score counters, victory/defeat evaluation and fact stores

use serde::{Deserialize, Serialize};

use super::level::{GameEvent, Level};
use super::trigger::{HandlerId, TriggerEvent, TriggerHandler};
use crate::consts::GOODIE_CHANNELS;

/// Per-level counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelScore {
    pub goodies: [i32; GOODIE_CHANNELS],
    pub enemies_created: u32,
    pub enemies_defeated: u32,
    pub destination_arrivals: u32,
    pub heroes_created: u32,
    pub heroes_defeated: u32,
}

/// Level outcome state machine. Won and Lost are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelPhase {
    Active,
    Won,
    Lost,
}

impl LevelPhase {
    pub fn is_active(self) -> bool {
        self == LevelPhase::Active
    }

    pub fn is_won(self) -> bool {
        self == LevelPhase::Won
    }

    pub fn is_lost(self) -> bool {
        self == LevelPhase::Lost
    }

    /// Which queued handler events may still run in this phase
    pub(crate) fn allows(self, event: &TriggerEvent) -> bool {
        match self {
            LevelPhase::Active => true,
            LevelPhase::Won => matches!(event, TriggerEvent::LevelWon),
            LevelPhase::Lost => matches!(event, TriggerEvent::LevelLost),
        }
    }
}

/// How many enemies must be defeated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyGoal {
    Count(u32),
    /// Every enemy created so far; never met before the first enemy exists
    All,
}

/// Victory conditions; any one that is met wins
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictoryGoals {
    pub destination_arrivals: Option<u32>,
    pub goodies: Option<[i32; GOODIE_CHANNELS]>,
    pub enemies: Option<EnemyGoal>,
}

impl VictoryGoals {
    pub fn is_met(&self, score: &LevelScore) -> bool {
        let arrivals = self
            .destination_arrivals
            .is_some_and(|n| score.destination_arrivals >= n);
        let goodies = self.goodies.is_some_and(|need| {
            score
                .goodies
                .iter()
                .zip(need.iter())
                .all(|(have, need)| have >= need)
        });
        let enemies = match self.enemies {
            Some(EnemyGoal::Count(n)) => score.enemies_defeated >= n,
            Some(EnemyGoal::All) => {
                score.enemies_created > 0 && score.enemies_defeated >= score.enemies_created
            }
            None => false,
        };
        arrivals || goodies || enemies
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LoseCountdown {
    pub remaining: f32,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct EndCallbacks {
    pub on_win: Option<HandlerId>,
    pub on_lose: Option<HandlerId>,
}

impl Level {
    pub fn phase(&self) -> LevelPhase {
        self.phase
    }

    pub fn score(&self) -> &LevelScore {
        &self.score
    }

    // === Victory configuration ===

    /// Win once `count` heroes have arrived at destinations
    pub fn set_victory_destination(&mut self, count: u32) {
        self.goals.destination_arrivals = Some(count);
    }

    /// Win once every goodie channel reaches its target
    pub fn set_victory_goodies(&mut self, targets: [i32; GOODIE_CHANNELS]) {
        self.goals.goodies = Some(targets);
    }

    pub fn set_victory_enemy_count(&mut self, goal: EnemyGoal) {
        self.goals.enemies = Some(goal);
    }

    pub fn victory_goals(&self) -> &VictoryGoals {
        &self.goals
    }

    /// Win immediately if any victory goal is met
    pub(crate) fn check_victory(&mut self) {
        if self.phase.is_active() && self.goals.is_met(&self.score) {
            self.win();
        }
    }

    // === Countdowns ===

    /// Lose with `text` after `seconds` of unpaused play
    pub fn set_lose_countdown(&mut self, seconds: f32, text: &str) {
        self.lose_countdown = Some(LoseCountdown {
            remaining: seconds,
            text: text.to_string(),
        });
    }

    /// Win after `seconds` of unpaused play
    pub fn set_win_countdown(&mut self, seconds: f32) {
        self.win_countdown = Some(seconds);
    }

    pub fn lose_countdown_remaining(&self) -> Option<f32> {
        self.lose_countdown.as_ref().map(|c| c.remaining.max(0.0))
    }

    pub fn win_countdown_remaining(&self) -> Option<f32> {
        self.win_countdown.map(|r| r.max(0.0))
    }

    pub(crate) fn advance_countdowns(&mut self, dt: f32) {
        if let Some(countdown) = &mut self.lose_countdown {
            countdown.remaining -= dt;
            if countdown.remaining <= 0.0 {
                let text = countdown.text.clone();
                self.lose(&text);
            }
        }
        if let Some(remaining) = &mut self.win_countdown {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.win();
            }
        }
    }

    // === Transitions ===

    /// Run `handler` with `LevelWon` when the level is won
    pub fn set_on_win(&mut self, handler: impl TriggerHandler + 'static) {
        self.end_callbacks.on_win = Some(self.register_handler(handler));
    }

    /// Run `handler` with `LevelLost` when the level is lost
    pub fn set_on_lose(&mut self, handler: impl TriggerHandler + 'static) {
        self.end_callbacks.on_lose = Some(self.register_handler(handler));
    }

    /// Win the level. Does nothing once the level has ended.
    pub fn win(&mut self) {
        if !self.phase.is_active() {
            return;
        }
        self.phase = LevelPhase::Won;
        self.timers.cancel_all();
        log::info!("Level {} won after {:.1}s", self.index, self.elapsed);
        self.events.push(GameEvent::LevelWon {
            text: self.config.win_text.clone(),
        });
        if let Some(handler) = self.end_callbacks.on_win {
            self.queue(handler, TriggerEvent::LevelWon);
        }
        self.flush_triggers();
    }

    /// Lose the level with `text` (empty for the configured default). Does
    /// nothing once the level has ended.
    pub fn lose(&mut self, text: &str) {
        if !self.phase.is_active() {
            return;
        }
        self.phase = LevelPhase::Lost;
        self.timers.cancel_all();
        let text = if text.is_empty() {
            self.config.lose_text.clone()
        } else {
            text.to_string()
        };
        log::info!("Level {} lost: {}", self.index, text);
        self.events.push(GameEvent::LevelLost { text });
        if let Some(handler) = self.end_callbacks.on_lose {
            self.queue(handler, TriggerEvent::LevelLost);
        }
        self.flush_triggers();
    }

    // === Goodie counters (channels 0..4) ===

    /// Current count on one channel.
    ///
    /// # Panics
    /// If `channel >= GOODIE_CHANNELS`. The same holds for `set_goodies` and
    /// `add_goodies`.
    pub fn goodies(&self, channel: usize) -> i32 {
        self.score.goodies[channel]
    }

    pub fn set_goodies(&mut self, channel: usize, value: i32) {
        self.score.goodies[channel] = value;
        self.check_victory();
    }

    pub fn add_goodies(&mut self, channel: usize, delta: i32) {
        self.score.goodies[channel] += delta;
        self.check_victory();
    }

    // === Facts ===

    /// Fact that lives as long as this level attempt
    pub fn level_fact(&self, key: &str, default: i32) -> i32 {
        self.level_facts.get(key).copied().unwrap_or(default)
    }

    pub fn put_level_fact(&mut self, key: &str, value: i32) {
        self.level_facts.insert(key.to_string(), value);
    }

    /// Fact that lives as long as the game session
    pub fn session_fact(&self, key: &str, default: i32) -> i32 {
        self.session.borrow().fact(key, default)
    }

    pub fn put_session_fact(&mut self, key: &str, value: i32) {
        self.session.borrow_mut().put_fact(key, value);
    }

    /// Fact kept in the progress store across runs
    pub fn game_fact(&self, key: &str, default: i32) -> i32 {
        self.session.borrow().store().get_int(key, default)
    }

    pub fn put_game_fact(&mut self, key: &str, value: i32) {
        self.session.borrow_mut().store_mut().set_int(key, value);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::sim::test_util::{test_level, test_level_in};

    #[test]
    fn test_second_transition_is_noop() {
        let mut level = test_level();
        level.win();
        level.lose("late");
        level.win();
        assert!(level.phase().is_won());
        let ends = level
            .events()
            .iter()
            .filter(|e| matches!(e, GameEvent::LevelWon { .. } | GameEvent::LevelLost { .. }))
            .count();
        assert_eq!(ends, 1);
    }

    #[test]
    fn test_end_callback_runs_once() {
        let mut level = test_level();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        level.set_on_lose(move |_: &mut Level, event: &TriggerEvent| {
            assert_eq!(*event, TriggerEvent::LevelLost);
            c.set(c.get() + 1);
        });
        level.lose("");
        level.lose("");
        assert_eq!(count.get(), 1);
        assert_eq!(
            level.events().last(),
            Some(&GameEvent::LevelLost {
                text: "Try Again".to_string()
            })
        );
    }

    #[test]
    fn test_goodie_victory() {
        let mut level = test_level();
        level.set_victory_goodies([2, 1, 0, 0]);
        level.add_goodies(0, 2);
        assert!(level.phase().is_active());
        level.add_goodies(1, 1);
        assert!(level.phase().is_won());
    }

    #[test]
    fn test_enemy_goal_all_needs_an_enemy() {
        let mut level = test_level();
        level.make_hero_as_box(0.0, 0.0, 1.0, 1.0, "hero.png").unwrap();
        level.set_victory_enemy_count(EnemyGoal::All);
        level.add_goodies(0, 1);
        assert!(level.phase().is_active());

        // Enemies spawned later still have to be beaten
        let enemy = level.make_enemy_as_box(5.0, 0.0, 1.0, 1.0, "enemy.png").unwrap();
        level.add_goodies(0, 1);
        assert!(level.phase().is_active());
        level.defeat_enemy(enemy);
        assert!(level.phase().is_won());
    }

    #[test]
    fn test_on_win_runs_once() {
        let mut level = test_level();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        level.set_on_win(move |level: &mut Level, event: &TriggerEvent| {
            assert_eq!(*event, TriggerEvent::LevelWon);
            assert!(level.phase().is_won());
            c.set(c.get() + 1);
        });
        level.win();
        level.win();
        level.lose("");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_enemy_goal_all() {
        let goals = VictoryGoals {
            enemies: Some(EnemyGoal::All),
            ..Default::default()
        };
        let mut score = LevelScore {
            enemies_created: 3,
            enemies_defeated: 2,
            ..Default::default()
        };
        assert!(!goals.is_met(&score));
        score.enemies_defeated = 3;
        assert!(goals.is_met(&score));
    }

    #[test]
    fn test_countdowns() {
        let mut level = test_level();
        level.set_lose_countdown(1.0, "Out of time");
        level.advance_countdowns(0.6);
        assert!(level.phase().is_active());
        assert!((level.lose_countdown_remaining().unwrap() - 0.4).abs() < 1.0e-5);
        level.advance_countdowns(0.6);
        assert!(level.phase().is_lost());

        let mut level = test_level();
        level.set_win_countdown(0.5);
        level.advance_countdowns(0.5);
        assert!(level.phase().is_won());
    }

    #[test]
    fn test_fact_scopes() {
        let (mut first, session) = test_level_in(None);
        first.put_level_fact("coins", 3);
        first.put_session_fact("deaths", 1);
        first.put_game_fact("best", 9);

        let (second, _) = test_level_in(Some(session));
        assert_eq!(second.level_fact("coins", 0), 0);
        assert_eq!(second.session_fact("deaths", 0), 1);
        assert_eq!(second.game_fact("best", 0), 9);
    }
}
