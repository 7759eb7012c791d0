use crate::{constants::RETURN_ARRIVAL_THRESHOLD, grid::step_toward, protocol::*};

// ============================================================================
// Return Behavior
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReturnStep {
    Moving(Position),
    // Transient guards despawn on arrival; everyone else resumes the route
    Arrived { despawn: bool },
}

// Explicit target if there is one, else the start of the route
#[must_use]
pub fn return_destination(enemy: &Enemy) -> Position {
    enemy.target_position.unwrap_or(enemy.patrol_points[0])
}

#[must_use]
pub fn return_step(enemy: &Enemy, delta: f32) -> ReturnStep {
    let destination = return_destination(enemy);

    if enemy.position.distance(&destination) < RETURN_ARRIVAL_THRESHOLD {
        return ReturnStep::Arrived {
            despawn: enemy.is_transient(),
        };
    }

    let speed = enemy.archetype.profile().patrol_speed;
    ReturnStep::Moving(step_toward(&enemy.position, &destination, speed, delta))
}
