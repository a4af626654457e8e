//! Contact resolution
//!
//! The physics step reports contact pairs in no particular order. Each pair is
//! put in canonical order (lower kind rank first, then lower id) and looked up
//! in [`RESOLUTION_TABLE`]. Pairs with no entry have no gameplay effect.

use super::entity::{EntityId, EntityKind};
use super::level::Level;
use super::timer::TimerAction;
use super::trigger::TriggerEvent;
use crate::consts::STOMP_TOLERANCE;

type Resolver = fn(&mut Level, EntityId, EntityId);

/// `(first, second, resolver)` with `first.rank() <= second.rank()`
const RESOLUTION_TABLE: &[(EntityKind, EntityKind, Resolver)] = &[
    (EntityKind::Hero, EntityKind::Enemy, hero_enemy as Resolver),
    (EntityKind::Hero, EntityKind::Goodie, hero_goodie as Resolver),
    (EntityKind::Hero, EntityKind::Obstacle, hero_obstacle as Resolver),
    (EntityKind::Hero, EntityKind::Destination, hero_destination as Resolver),
    (EntityKind::Enemy, EntityKind::Projectile, enemy_projectile as Resolver),
    (EntityKind::Enemy, EntityKind::Obstacle, enemy_obstacle as Resolver),
    (EntityKind::Projectile, EntityKind::Projectile, projectile_projectile as Resolver),
    (EntityKind::Projectile, EntityKind::Obstacle, projectile_obstacle as Resolver),
];

/// Order a pair by kind rank, breaking ties by id
pub fn canonical(level: &Level, a: EntityId, b: EntityId) -> (EntityId, EntityId) {
    let key = |id: EntityId| (level.kind(id).rank(), id.0);
    if key(a) <= key(b) { (a, b) } else { (b, a) }
}

/// Resolve one contact that began this step
pub fn resolve_contact(level: &mut Level, a: EntityId, b: EntityId) {
    if !level.phase().is_active() || a == b {
        return;
    }
    if !level.is_enabled(a) || !level.is_enabled(b) {
        return;
    }
    let (first, second) = canonical(level, a, b);
    let kinds = (level.kind(first), level.kind(second));
    let resolver = RESOLUTION_TABLE
        .iter()
        .find(|(k1, k2, _)| (*k1, *k2) == kinds)
        .map(|(_, _, resolve)| *resolve);
    if let Some(resolve) = resolver {
        log::trace!("Contact {first} {} / {second} {}", kinds.0.as_str(), kinds.1.as_str());
        resolve(level, first, second);
        level.flush_triggers();
    }
}

fn hero_enemy(level: &mut Level, hero: EntityId, enemy: EntityId) {
    let (Ok(h), Ok(e)) = (level.hero(hero), level.enemy(enemy)) else {
        return;
    };
    let (crawling, in_air, invincible, strength) =
        (h.crawling, h.in_air, h.is_invincible(), h.strength);
    let damage = e.damage;
    let by_crawl = e.defeat_by_crawl;
    let by_jump = e.defeat_by_jump;
    let resist = e.resist_invincibility;
    let immune = e.immune_to_invincibility;
    let text = e.defeat_text.clone();

    if crawling && by_crawl {
        level.defeat_enemy(enemy);
        return;
    }
    if in_air && by_jump {
        let hero_bottom = level.position(hero).y;
        let enemy_top = level.center(enemy).y + level.entity(enemy).half_size().y;
        if hero_bottom + STOMP_TOLERANCE >= enemy_top {
            level.defeat_enemy(enemy);
            return;
        }
    }
    if invincible && !immune {
        if !resist {
            level.defeat_enemy(enemy);
        }
        return;
    }
    if strength > damage {
        if let Some(h) = level.hero_state(hero) {
            h.strength -= damage;
        }
        level.defeat_enemy(enemy);
    } else {
        level.defeat_hero(hero, &text);
    }
}

fn hero_goodie(level: &mut Level, hero: EntityId, goodie: EntityId) {
    level.collect_goodie(hero, goodie);
}

fn hero_destination(level: &mut Level, hero: EntityId, destination: EntityId) {
    level.arrive(hero, destination);
}

fn hero_obstacle(level: &mut Level, hero: EntityId, obstacle: EntityId) {
    let Ok(o) = level.obstacle(obstacle) else {
        return;
    };
    let o = o.clone();

    if let Some(sound) = o.collide_sound {
        level.play_sound(sound);
    }
    if let Some(factor) = o.dampening {
        let v = level.velocity(hero);
        level.set_velocity(hero, v * factor);
    }
    if let Some(boost) = o.speed_boost {
        level.add_velocity(hero, boost.velocity);
        if let Some(duration) = boost.duration {
            level.timers.schedule(
                duration,
                0.0,
                TimerAction::EndSpeedBoost {
                    hero,
                    velocity: boost.velocity,
                },
            );
        }
    }
    let sensor = level.is_sensor(obstacle);
    if let Some(h) = level.hero_state(hero) {
        if o.sticky {
            h.stuck_to = Some(obstacle);
        }
        if !sensor && !o.no_jump_reenable {
            h.in_air = false;
        }
    }
    if let Some(trigger) = o.hero_trigger {
        let event = TriggerEvent::HeroCollided {
            obstacle,
            hero,
            id: trigger.id,
        };
        level.fire_collision_trigger(trigger, event);
    }
}

fn enemy_obstacle(level: &mut Level, enemy: EntityId, obstacle: EntityId) {
    let Ok(o) = level.obstacle(obstacle) else {
        return;
    };
    let (jump, trigger) = (o.enemy_jump, o.enemy_trigger);
    if let Some(v) = jump {
        level.add_velocity(enemy, v);
    }
    if let Some(trigger) = trigger {
        let event = TriggerEvent::EnemyCollided {
            obstacle,
            enemy,
            id: trigger.id,
        };
        level.fire_collision_trigger(trigger, event);
    }
}

fn enemy_projectile(level: &mut Level, enemy: EntityId, projectile: EntityId) {
    let Ok(p) = level.projectile(projectile) else {
        return;
    };
    let strength = p.strength;
    level.remove(projectile, true);
    let defeated = match level.enemy_mut(enemy) {
        Ok(e) => {
            e.damage -= strength;
            e.damage <= 0
        }
        Err(_) => false,
    };
    if defeated {
        level.defeat_enemy(enemy);
    }
}

fn projectile_projectile(level: &mut Level, a: EntityId, b: EntityId) {
    let collision_ok = level.projectile_pool().is_some_and(|p| p.collision_ok);
    if !collision_ok {
        level.remove(a, false);
        level.remove(b, false);
    }
}

fn projectile_obstacle(level: &mut Level, projectile: EntityId, obstacle: EntityId) {
    let Ok(o) = level.obstacle(obstacle) else {
        return;
    };
    if let Some(trigger) = o.projectile_trigger {
        if trigger.gate.is_met(&level.score().goodies) {
            let event = TriggerEvent::ProjectileCollided {
                obstacle,
                projectile,
                id: trigger.id,
            };
            level.fire_collision_trigger(trigger, event);
            return;
        }
    }
    if !level.is_sensor(obstacle) {
        level.remove(projectile, false);
    }
}
