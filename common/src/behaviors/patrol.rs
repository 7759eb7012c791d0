use crate::{constants::PATROL_WAYPOINT_THRESHOLD, grid::step_toward, protocol::*};

// ============================================================================
// Patrol Behavior
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatrolStep {
    pub position: Position,
    // Set when the current waypoint was reached
    pub next_index: Option<usize>,
}

// Walk toward the current waypoint at patrol speed. Once within the
// threshold the enemy holds still for this tick and the route advances,
// wrapping at the end.
#[must_use]
pub fn patrol_step(enemy: &Enemy, delta: f32) -> PatrolStep {
    let waypoint = enemy.current_waypoint();

    if enemy.position.distance(&waypoint) < PATROL_WAYPOINT_THRESHOLD {
        return PatrolStep {
            position: enemy.position,
            next_index: Some((enemy.patrol_index + 1) % enemy.patrol_points.len()),
        };
    }

    let speed = enemy.archetype.profile().patrol_speed;
    PatrolStep {
        position: step_toward(&enemy.position, &waypoint, speed, delta),
        next_index: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard_route() -> Enemy {
        Enemy::patrolling(
            "guard-1",
            Archetype::Guard,
            vec![Position::new(96.0, 160.0), Position::new(608.0, 160.0)],
        )
    }

    #[test]
    fn advances_and_wraps_route() {
        let mut guard = guard_route();

        let step = patrol_step(&guard, 0.016);
        assert_eq!(step.next_index, Some(1));
        assert_eq!(step.position, guard.position);

        guard.patrol_index = 1;
        guard.position = Position::new(606.0, 160.0);
        assert_eq!(patrol_step(&guard, 0.016).next_index, Some(0));
    }

    #[test]
    fn moves_at_patrol_speed() {
        let mut guard = guard_route();
        guard.patrol_index = 1;
        let step = patrol_step(&guard, 0.5);
        assert_eq!(step.next_index, None);
        assert!((step.position.x - 144.0).abs() < 1e-3);
        assert!((step.position.y - 160.0).abs() < 1e-3);
    }

    #[test]
    fn index_stays_valid_over_many_ticks() {
        let mut guard = guard_route();
        for _ in 0..2_000 {
            let step = patrol_step(&guard, 0.05);
            guard.position = step.position;
            if let Some(next) = step.next_index {
                guard.patrol_index = next;
            }
            assert!(guard.patrol_index < guard.patrol_points.len());
        }
    }

    #[test]
    fn camera_holds_its_mount() {
        let camera = Enemy::patrolling("camera-1", Archetype::Camera, vec![Position::new(288.0, 288.0)]);
        let step = patrol_step(&camera, 0.1);
        assert_eq!(step.position, camera.position);
        assert_eq!(step.next_index, Some(0));
    }
}
