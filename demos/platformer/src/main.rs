use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use env_logger::{Builder, Env};
use hammer2d::{
    BodyId, HammerConfig, HammerEvent, HammerInstance, MotionType, ShapeSettings, Vec2,
};

const DT: f32 = 1.0 / 60.0;
const STEPS: usize = 60 * 20;
const RUN_SPEED: f32 = 4.0;
const JUMP_FORCE: f32 = 30.0;
const JUMP_INTERVAL: usize = 90;
const CRATE_COUNT: usize = 6;

/// `#` is solid ground, `o` a coin. The bottom row sits at y = 0.
const LEVEL: &[&str] = &[
    "                                        ",
    "                     ###      o         ",
    "         o   ###              ###       ",
    "      ###                               ",
    "                o         #####     o   ",
    "########################################",
    "########################################",
];

/// Merge horizontal runs of `#` into tile boxes.
fn parse_tiles(level: &[&str]) -> Vec<(Vec2, Vec2)> {
    let height = level.len();
    let mut tiles = Vec::new();
    for (row, line) in level.iter().enumerate() {
        let y = (height - 1 - row) as f32;
        let mut run_start = None;
        for (col, ch) in line.chars().chain(std::iter::once(' ')).enumerate() {
            match (ch == '#', run_start) {
                (true, None) => run_start = Some(col),
                (false, Some(start)) => {
                    tiles.push((
                        Vec2::new(start as f32, y),
                        Vec2::new(col as f32, y + 1.0),
                    ));
                    run_start = None;
                }
                _ => {}
            }
        }
    }
    tiles
}

fn coin_positions(level: &[&str]) -> Vec<Vec2> {
    let height = level.len();
    level
        .iter()
        .enumerate()
        .flat_map(|(row, line)| {
            line.char_indices()
                .filter(|(_, ch)| *ch == 'o')
                .map(move |(col, _)| Vec2::new(col as f32, (height - 1 - row) as f32))
        })
        .collect()
}

fn load_config() -> Result<HammerConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config {path}"))?;
            HammerConfig::from_json_str(&json).with_context(|| format!("invalid config {path}"))
        }
        None => Ok(HammerConfig::default().with_gravity(60.0)),
    }
}

/// Logs at `info` unless the filter variable in `env` says otherwise.
fn log_builder(env: Env<'_>) -> Builder {
    Builder::from_env(env.default_filter_or("info"))
}

fn main() -> Result<()> {
    log_builder(Env::default()).init();

    let instance = HammerInstance::with_config(load_config()?)?;
    let api = instance.interface().clone();

    let tiles = parse_tiles(LEVEL);
    log::info!("level has {} tile runs", tiles.len());
    api.create_and_add_body(ShapeSettings::tiles(tiles), MotionType::Static, Vec2::ZERO, false)?;

    let sprite = || ShapeSettings::sprite_box(Vec2::ZERO, Vec2::ONE);
    let player = api.create_and_add_body(sprite(), MotionType::Dynamic, Vec2::new(1.0, 3.0), false)?;

    let mut coins: Vec<BodyId> = Vec::new();
    for at in coin_positions(LEVEL) {
        coins.push(api.create_and_add_body(sprite(), MotionType::Static, at, true)?);
    }

    let mut crates = Vec::new();
    for _ in 0..CRATE_COUNT {
        let at = Vec2::new(fastrand::f32() * 36.0 + 2.0, 6.0 + fastrand::f32() * 4.0);
        crates.push(api.create_and_add_body(sprite(), MotionType::Dynamic, at, false)?);
    }

    let bumps = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&bumps);
    instance.on_contact_added(move |a, b| {
        log::debug!("contact {a} <-> {b}");
        counter.fetch_add(1, Ordering::Relaxed);
    });
    let landings = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&landings);
    instance.on_tilemap_contact_persisted(move |body| {
        if body == player {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    });
    let events = instance.subscribe();

    let mut collected = 0;
    for step in 0..STEPS {
        let velocity = api.linear_velocity(player)?;
        api.set_linear_velocity(player, Vec2::new(RUN_SPEED, velocity.y))?;
        if step % JUMP_INTERVAL == 0 && api.grounded(player)? {
            log::info!("step {step}: jump");
            api.add_force(player, Vec2::new(0.0, JUMP_FORCE))?;
        }

        instance.simulate(DT);

        for event in events.try_iter() {
            let HammerEvent::ContactAdded { a, b } = event else {
                continue;
            };
            let other = if a == player { b } else if b == player { a } else { continue };
            if let Some(index) = coins.iter().position(|&coin| coin == other) {
                api.remove_body(coins.swap_remove(index))?;
                collected += 1;
                log::info!("step {step}: coin collected ({collected})");
            }
        }

        if api.position(player)?.x > LEVEL[0].len() as f32 {
            log::info!("step {step}: reached the end of the level");
            break;
        }
    }

    let grounded_crates = crates
        .iter()
        .map(|&id| api.grounded(id))
        .collect::<hammer2d::Result<Vec<_>>>()?
        .into_iter()
        .filter(|grounded| *grounded)
        .count();

    println!("coins collected: {collected}, remaining: {}", coins.len());
    println!("contacts started: {}", bumps.load(Ordering::Relaxed));
    println!("player tile contacts: {}", landings.load(Ordering::Relaxed));
    println!("crates at rest: {grounded_crates}/{CRATE_COUNT}");
    println!("{}", serde_json::to_string_pretty(&api.snapshot(player)?)?);

    Ok(())
}
