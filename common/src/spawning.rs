use std::collections::HashSet;

use rand::Rng;

use crate::{
    constants::*,
    grid::{grid_to_world, random_cell},
    protocol::*,
};

// Re-rolls per player before accepting a shared cell
const PLAYER_SPAWN_ATTEMPTS: usize = 20;

// ============================================================================
// World Initialization
// ============================================================================

// Everything a new match starts from
#[derive(Debug, Clone)]
pub struct WorldLayout {
    pub doors: Vec<Door>,
    pub enemies: Vec<Enemy>,
    pub players: Vec<Player>,
}

// Build a fresh world: fixed doors and cameras, randomized patrol routes, and
// a random spawn cell per player. Every call starts from scratch, so calling
// it again for a restart never carries enemies over.
pub fn initialize_world(spawn: &SpawnToggles, players: &[Player], rng: &mut impl Rng) -> WorldLayout {
    WorldLayout {
        doors: initialize_doors(),
        enemies: initialize_enemies(spawn, rng),
        players: randomize_player_positions(players, rng),
    }
}

#[must_use]
pub fn initialize_doors() -> Vec<Door> {
    DOOR_CELLS
        .iter()
        .enumerate()
        .map(|(i, &(cx, cy))| Door {
            id: DoorId::new(format!("door-{}", i + 1)),
            position: grid_to_world(cx, cy),
        })
        .collect()
}

pub fn initialize_enemies(spawn: &SpawnToggles, rng: &mut impl Rng) -> Vec<Enemy> {
    let mut enemies = Vec::new();

    if spawn.guard {
        enemies.push(row_patroller(rng, "guard-1", Archetype::Guard, (1, 7), (8, 14)));
    }
    if spawn.dog {
        enemies.push(row_patroller(rng, "dog-1", Archetype::Dog, (1, 6), (9, 14)));
    }
    if spawn.drone {
        enemies.push(row_patroller(rng, "drone-1", Archetype::Drone, (2, 6), (10, 14)));
    }
    if spawn.camera {
        enemies.extend(cameras());
    }

    enemies
}

// Players keep their identity and lose any freeze from the previous match
pub fn randomize_player_positions(players: &[Player], rng: &mut impl Rng) -> Vec<Player> {
    let mut taken = HashSet::new();

    players
        .iter()
        .map(|p| {
            let mut cell = random_cell(rng, MIN_SPAWN_MARGIN);
            for _ in 0..PLAYER_SPAWN_ATTEMPTS {
                if !taken.contains(&cell) {
                    break;
                }
                cell = random_cell(rng, MIN_SPAWN_MARGIN);
            }
            taken.insert(cell);

            Player {
                position: Some(grid_to_world(cell.0, cell.1)),
                frozen: false,
                ..p.clone()
            }
        })
        .collect()
}

// --- private helpers ---

// Two-point route on one random row; columns drawn from the half-open ranges
fn row_patroller(
    rng: &mut impl Rng,
    id: &str,
    archetype: Archetype,
    start_cols: (i32, i32),
    end_cols: (i32, i32),
) -> Enemy {
    let row = rng.random_range(2..MAP_BLOCKS - 2);
    let start_col = rng.random_range(start_cols.0..start_cols.1);
    let end_col = rng.random_range(end_cols.0..end_cols.1);

    Enemy::patrolling(
        id,
        archetype,
        vec![grid_to_world(start_col, row), grid_to_world(end_col, row)],
    )
}

// Mounted cameras look toward the middle of the map
fn cameras() -> impl Iterator<Item = Enemy> {
    CAMERA_CELLS.iter().enumerate().map(|(i, &(cx, cy))| {
        let mut camera = Enemy::patrolling(format!("camera-{}", i + 1), Archetype::Camera, vec![grid_to_world(cx, cy)]);
        camera.facing = Some(if cx < MAP_BLOCKS / 2 { Facing::Right } else { Facing::Left });
        camera
    })
}
