//! Cellspace Demo
//!
//! Builds a small scene (floor, wall, player, crate, lantern), runs it for
//! a few seconds of frames and replays it to check the state hash.
//!
//! Usage: `cellspace-demo [config.json]`

use std::fs;

use anyhow::{Context, Result};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use cellspace::{
    core::fixed::{floor_div, to_float},
    core::hash::StateHash,
    space::{CellCoord, ObjectId, Space, SpaceConfig},
    Direction, FixedVec2, Shape, Transform, FIXED_ONE, VERSION,
};

/// Frames per demo run (four seconds at 60 Hz)
const DEMO_FRAMES: u64 = 240;

/// Frames between progress reports
const REPORT_INTERVAL: u64 = 60;

struct Actors {
    player: ObjectId,
    crate_box: ObjectId,
    lantern: ObjectId,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Cellspace Demo v{}", VERSION);

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = fs::read_to_string(&path).with_context(|| format!("reading config {}", path))?;
            SpaceConfig::from_json_str(&json).with_context(|| format!("parsing config {}", path))?
        }
        None => SpaceConfig::default(),
    };
    info!(
        "Cells: {:.1} x {:.1}, draw mode {:?}",
        to_float(config.cell_width),
        to_float(config.cell_height),
        config.draw_mode
    );

    info!("=== Running Demo Scene ===");
    let hash = run(&config, true)?;
    info!("Final State Hash: {}", hex::encode(hash));

    info!("=== Verifying Determinism ===");
    let replay_hash = run(&config, false)?;
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
    } else {
        warn!("DETERMINISM FAILURE: Hashes differ!");
    }
    Ok(())
}

/// A static block, solid on every face.
fn block(space: &mut Space, position: FixedVec2, width: i32, height: i32) -> Result<ObjectId> {
    let shape = Shape::centered_box(width * FIXED_ONE, height * FIXED_ONE);
    let locator = space.create_hitbox(shape.clone(), Transform::at(position));
    let id = space.create_object(locator)?;
    let solid = space.create_hitbox(shape, Transform::default());
    space.set_solid_hitbox(id, Some(solid))?;
    space.set_surfaces(id, [true; 4])?;
    Ok(id)
}

/// A mobile box whose collision hitbox matches its locator.
fn mover(space: &mut Space, position: FixedVec2, size: i32, priority: i32) -> Result<ObjectId> {
    let shape = Shape::centered_box(size * FIXED_ONE, size * FIXED_ONE);
    let locator = space.create_hitbox(shape.clone(), Transform::at(position));
    let collision = space.create_hitbox(shape, Transform::default());
    let id = space.create_mobile_object(locator, collision)?;
    space.set_movement_priority(id, priority)?;
    Ok(id)
}

fn build_scene(config: &SpaceConfig) -> Result<(Space, Actors)> {
    let mut space = Space::new(config.clone());

    let floor = block(&mut space, FixedVec2::from_ints(100, 20), 400, 8)?;
    let wall = block(&mut space, FixedVec2::from_ints(300, 0), 8, 40)?;

    // The player pushes with its right face.
    let player = mover(&mut space, FixedVec2::ZERO, 8, 10)?;
    let solid = space.create_hitbox(Shape::centered_box(8 * FIXED_ONE, 8 * FIXED_ONE), Transform::default());
    space.set_solid_hitbox(player, Some(solid))?;
    space.set_surface(player, Direction::Right, true)?;
    space.set_velocity(player, FixedVec2::from_ints(1, 1))?;

    let crate_box = mover(&mut space, FixedVec2::from_ints(40, 0), 8, 0)?;
    space.set_velocity(crate_box, FixedVec2::from_ints(0, 1))?;

    // Point-sized lantern carried above the player.
    let lantern_locator = space.create_hitbox(Shape::Point, Transform::at(FixedVec2::from_ints(0, -10)));
    let lantern_body = space.create_hitbox(Shape::Point, Transform::default());
    let lantern = space.create_mobile_object(lantern_locator, lantern_body)?;
    space.set_leader(lantern, Some(player))?;
    space.set_draw_priority(lantern, 1)?;

    for id in [floor, wall, player, crate_box, lantern] {
        space.add_object(id)?;
    }
    Ok((space, Actors { player, crate_box, lantern }))
}

/// Run the scene and return its final hash.
fn run(config: &SpaceConfig, verbose: bool) -> Result<StateHash> {
    let (mut space, actors) = build_scene(config)?;
    let mut total_collisions = 0;

    for _ in 0..DEMO_FRAMES {
        let report = space.advance_frame();
        total_collisions += report.collisions;

        if verbose && report.frame % REPORT_INTERVAL == 0 {
            let (px, py) = space.position(actors.player).unwrap_or_default().to_floats();
            let (cx, cy) = space.position(actors.crate_box).unwrap_or_default().to_floats();
            info!(
                "Frame {}: player ({:.2}, {:.2}), crate ({:.2}, {:.2}), {} moved, hash {}",
                report.frame,
                px,
                py,
                cx,
                cy,
                report.moved,
                hex::encode(&space.compute_hash()[..8])
            );
        }
    }

    if verbose {
        let (lx, ly) = space.position(actors.lantern).unwrap_or_default().to_floats();
        info!("Lantern at ({:.2}, {:.2})", lx, ly);
        info!("Total collision records: {}", total_collisions);

        let center = space.position(actors.player).unwrap_or_default();
        let nearby = space.objects_within_circle(center, 32 * FIXED_ONE);
        info!("Objects within 32 of the player: {}", nearby.len());

        let cell = CellCoord::new(floor_div(center.x, config.cell_width), floor_div(center.y, config.cell_height));
        info!("Draw order in player's cell {:?}: {:?}", cell, space.draw_order(cell));
    }

    Ok(space.compute_hash())
}
