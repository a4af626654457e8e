//! LOL Engine demo entry point
//!
//! Runs a short scripted level headlessly and logs what happens. Pass a config
//! JSON path as the first argument and a progress file as the second to use
//! them instead of the defaults.

use std::process::ExitCode;

use glam::Vec2;
use lol_engine::consts::SIM_DT;
use lol_engine::persistence::{JsonFileStore, MemoryStore, ProgressStore};
use lol_engine::sim::{FrameClock, GameEvent, Level, Route, TickInput, TriggerEvent};
use lol_engine::{AssetRegistry, EngineConfig, Game, Result};

/// Seconds of simulated play before giving up
const DEMO_SECONDS: f32 = 30.0;

fn demo_assets() -> AssetRegistry {
    let mut assets = AssetRegistry::new();
    for image in ["hero.png", "enemy.png", "wall.png", "coin.png", "flag.png"] {
        assets.register_image(image);
    }
    for sound in ["coin.ogg", "win.ogg", "lose.ogg"] {
        assets.register_sound(sound);
    }
    assets
}

/// A walled room: collect both coins, then reach the flag while a guard
/// patrols the middle
fn build_level(level: &mut Level) -> Result<()> {
    level.make_obstacle_as_box(0.0, 0.0, 32.0, 0.5, "wall.png")?;
    level.make_obstacle_as_box(0.0, 20.0, 32.0, 0.5, "wall.png")?;
    level.make_obstacle_as_box(0.0, 0.0, 0.5, 20.0, "wall.png")?;
    level.make_obstacle_as_box(31.5, 0.0, 0.5, 20.0, "wall.png")?;

    let hero = level.make_hero_as_box(2.0, 2.0, 1.0, 1.0, "hero.png")?;
    level.set_move_by_tilting(hero);
    level.set_tilt_as_velocity(true);

    for x in [10.0, 18.0] {
        let coin = level.make_goodie_as_circle(x, 2.0, 1.0, 1.0, "coin.png")?;
        level.set_disappear_sound(coin, "coin.ogg")?;
    }

    let guard = level.make_enemy_as_box(14.0, 12.0, 1.0, 1.0, "enemy.png")?;
    level.set_route(guard, Route::new().to(14.0, 12.0).to(14.0, 17.0), 2.0, true)?;

    let flag = level.make_destination_as_box(28.0, 2.0, 2.0, 2.0, "flag.png")?;
    level.set_activation_score(flag, [2, 0, 0, 0])?;
    level.set_victory_destination(1);
    level.set_lose_countdown(DEMO_SECONDS, "Out of time");

    level.schedule(5.0, 5.0, 0, |level: &mut Level, _: &TriggerEvent| {
        log::info!("{:.0}s in, {} coins", level.elapsed(), level.goodies(0));
    });
    Ok(())
}

fn open_store(path: Option<String>) -> Result<Box<dyn ProgressStore>> {
    Ok(match path {
        Some(path) => Box::new(JsonFileStore::open(path)?),
        None => Box::new(MemoryStore::new()),
    })
}

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let store = open_store(args.next())?;
    let mut game = Game::new(config, demo_assets(), store);

    let mut level = game.start_level(1, &mut build_level)?;
    let mut clock = FrameClock::new();
    // The hero's tilt stays pointed along the floor toward the flag
    let input = TickInput {
        tilt: Some(Vec2::new(4.0, 0.0)),
        ..Default::default()
    };
    clock.advance(&mut level, input, SIM_DT);

    let frames = (DEMO_SECONDS / SIM_DT) as usize + 2;
    for _ in 0..frames {
        clock.advance(&mut level, TickInput::default(), SIM_DT);
        for event in level.drain_events() {
            match event {
                GameEvent::GoodieCollected { goodie, .. } => log::info!("Collected {goodie}"),
                GameEvent::LevelWon { text } | GameEvent::LevelLost { text } => {
                    log::info!("{text}");
                }
                other => log::debug!("{other:?}"),
            }
        }
        if !level.phase().is_active() {
            break;
        }
    }

    let outcome = game.finish_level(&level);
    log::info!(
        "Outcome {:?} after {:.1}s, unlocked up to level {}",
        outcome,
        level.elapsed(),
        game.unlocked_level()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("LOL Engine demo starting...");
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
