use rand::Rng;

use crate::{constants::*, protocol::Position};

// ============================================================================
// Grid Conversions
// ============================================================================

// Center of cell (cx, cy) in world units
#[must_use]
pub fn grid_to_world(cx: i32, cy: i32) -> Position {
    Position {
        x: (cx as f32).mul_add(GRID_SIZE, GRID_SIZE / 2.0),
        y: (cy as f32).mul_add(GRID_SIZE, GRID_SIZE / 2.0),
    }
}

#[must_use]
pub fn world_to_grid(pos: &Position) -> (i32, i32) {
    ((pos.x / GRID_SIZE).floor() as i32, (pos.y / GRID_SIZE).floor() as i32)
}

// Snap a world position to the center of the cell containing it
#[must_use]
pub fn cell_center(pos: &Position) -> Position {
    let (cx, cy) = world_to_grid(pos);
    grid_to_world(cx, cy)
}

#[must_use]
pub fn clamp_to_world(pos: Position) -> Position {
    Position {
        x: pos.x.clamp(WORLD_MARGIN, WORLD_SIZE - WORLD_MARGIN),
        y: pos.y.clamp(WORLD_MARGIN, WORLD_SIZE - WORLD_MARGIN),
    }
}

#[must_use]
pub fn map_center() -> Position {
    Position::new(CENTER_POS, CENTER_POS)
}

// Uniformly random cell at least `margin` cells away from every edge
pub fn random_cell(rng: &mut impl Rng, margin: i32) -> (i32, i32) {
    let cx = rng.random_range(margin..MAP_BLOCKS - margin);
    let cy = rng.random_range(margin..MAP_BLOCKS - margin);
    (cx, cy)
}

// ============================================================================
// Movement Helpers
// ============================================================================

// Move from `from` toward `to` at `speed` for `delta` seconds along the atan2
// heading. Never steps past the destination.
#[must_use]
pub fn step_toward(from: &Position, to: &Position, speed: f32, delta: f32) -> Position {
    let distance = from.distance(to);
    if distance < PHYSICS_EPSILON {
        return *to;
    }

    let step = (speed * delta).min(distance);
    let angle = (to.y - from.y).atan2(to.x - from.x);
    Position {
        x: angle.cos().mul_add(step, from.x),
        y: angle.sin().mul_add(step, from.y),
    }
}
