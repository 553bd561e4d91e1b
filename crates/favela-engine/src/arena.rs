//! Headless arena map.
//!
//! A 100 x 100 walled ground with seeded box buildings through the middle
//! and ten spawn points per team at opposite ends: police in the south
//! (z 35 - 45), criminals up in the favela (z -35 - -20).

use favela_common::Team;
use favela_gameplay::{Aabb, BoxWorld};
use glam::Vec3;
use tracing::debug;

/// Half extent of the ground square.
pub const HALF_SIZE: f32 = 50.0;
/// Spawn points generated per team.
pub const SPAWNS_PER_TEAM: usize = 10;

const WALL_HEIGHT: f32 = 6.0;
const WALL_THICKNESS: f32 = 1.0;
const BUILDING_COUNT: usize = 14;
const SPAWN_HALF_WIDTH: f32 = 30.0;

/// Builds the arena for `seed`. The same seed always yields the same map.
#[must_use]
pub fn build_arena(seed: u64) -> BoxWorld {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut world = BoxWorld::open_ground();

    for aabb in boundary_walls() {
        world = world.with_box(aabb);
    }

    for _ in 0..BUILDING_COUNT {
        let half = Vec3::new(
            rng.f32() * 2.5 + 1.5,
            rng.f32() * 3.0 + 1.5,
            rng.f32() * 2.5 + 1.5,
        );
        // Buildings stay clear of both spawn bands.
        let center = Vec3::new(
            (rng.f32() * 2.0 - 1.0) * 40.0,
            half.y,
            rng.f32() * 44.0 - 15.0,
        );
        world = world.with_box(Aabb::from_center(center, half));
    }

    let police = spawn_band(&mut rng, 35.0, 45.0);
    let criminal = spawn_band(&mut rng, -35.0, -20.0);
    debug!(
        "Arena built from seed {seed}: {} colliders, {} spawn points",
        world.boxes.len(),
        police.len() + criminal.len()
    );

    world
        .with_spawns(Team::Police, police)
        .with_spawns(Team::Criminal, criminal)
}

fn boundary_walls() -> [Aabb; 4] {
    let h = HALF_SIZE;
    let t = WALL_THICKNESS;
    let y = WALL_HEIGHT;
    [
        Aabb::new(Vec3::new(-h - t, 0.0, h), Vec3::new(h + t, y, h + t)),
        Aabb::new(Vec3::new(-h - t, 0.0, -h - t), Vec3::new(h + t, y, -h)),
        Aabb::new(Vec3::new(h, 0.0, -h), Vec3::new(h + t, y, h)),
        Aabb::new(Vec3::new(-h - t, 0.0, -h), Vec3::new(-h, y, h)),
    ]
}

fn spawn_band(rng: &mut fastrand::Rng, z_min: f32, z_max: f32) -> Vec<Vec3> {
    (0..SPAWNS_PER_TEAM)
        .map(|_| {
            Vec3::new(
                (rng.f32() * 2.0 - 1.0) * SPAWN_HALF_WIDTH,
                0.0,
                z_min + rng.f32() * (z_max - z_min),
            )
        })
        .collect()
}
