use thiserror::Error;

use crate::{grid::cell_center, protocol::*};

// ============================================================================
// Alarm
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlarmError {
    #[error("detected player {0} has no position")]
    PlayerWithoutPosition(PlayerId),
    #[error("no doors to dispatch a guard from")]
    NoDoors,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlarmOutcome {
    // An existing guard was sent to the alarm; it was mutated in place
    Redirected { alarm: Position, guard: EnemyId },
    // Nobody could respond, so a new guard enters at the nearest door
    Spawned { alarm: Position, guard: Enemy },
}

impl AlarmOutcome {
    #[must_use]
    pub const fn alarm(&self) -> Position {
        match self {
            Self::Redirected { alarm, .. } | Self::Spawned { alarm, .. } => *alarm,
        }
    }
}

#[must_use]
pub fn spawned_guard_id(seq: u32) -> EnemyId {
    EnemyId::new(format!("spawned-guard-{seq}"))
}

// Raise an alarm at the cell of `detected`. The first guard that is patrolling
// (or already investigating) is redirected there; otherwise a fresh guard is
// dispatched from the door nearest to the alarm.
pub fn trigger_alarm(
    detected: &Player,
    doors: &[Door],
    enemies: &mut [Enemy],
    spawn_seq: u32,
) -> Result<AlarmOutcome, AlarmError> {
    let player_pos = detected
        .position
        .ok_or_else(|| AlarmError::PlayerWithoutPosition(detected.id.clone()))?;
    let alarm = cell_center(&player_pos);
    let door = nearest_door(&alarm, doors).ok_or(AlarmError::NoDoors)?;

    if let Some(guard) = enemies.iter_mut().find(|e| can_respond(e)) {
        guard.state = EnemyState::Investigating;
        guard.target_player = None;
        guard.target_position = Some(alarm);
        guard.investigation_timer = 0.0;
        guard.origin_door = Some(door.id.clone());
        return Ok(AlarmOutcome::Redirected {
            alarm,
            guard: guard.id.clone(),
        });
    }

    let mut guard = Enemy::patrolling(spawned_guard_id(spawn_seq).0, Archetype::Guard, vec![door.position]);
    guard.state = EnemyState::Investigating;
    guard.target_position = Some(alarm);
    guard.origin_door = Some(door.id.clone());

    Ok(AlarmOutcome::Spawned { alarm, guard })
}

fn can_respond(enemy: &Enemy) -> bool {
    enemy.archetype == Archetype::Guard
        && match enemy.state {
            EnemyState::Patrolling => true,
            EnemyState::Investigating => enemy.id.0.contains("guard"),
            _ => false,
        }
}

// First door at minimal distance
fn nearest_door<'a>(target: &Position, doors: &'a [Door]) -> Option<&'a Door> {
    doors.iter().fold(None, |best: Option<&Door>, door| match best {
        Some(b) if b.position.distance(target) <= door.position.distance(target) => Some(b),
        _ => Some(door),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawning::initialize_doors;

    fn spotted_at(x: f32, y: f32) -> Player {
        Player {
            id: PlayerId::new("spotted"),
            name: "Spotted".to_string(),
            is_host: false,
            peer_id: PeerId::new("peer"),
            color: String::new(),
            position: Some(Position::new(x, y)),
            frozen: false,
        }
    }

    fn drone() -> Enemy {
        Enemy::patrolling("drone-1", Archetype::Drone, vec![Position::new(200.0, 200.0)])
    }

    #[test]
    fn alarm_snaps_to_cell_and_picks_nearest_door() {
        let doors = initialize_doors();
        let mut enemies = vec![drone()];
        let outcome = trigger_alarm(&spotted_at(160.0, 160.0), &doors, &mut enemies, 1).expect("alarm");

        let AlarmOutcome::Spawned { alarm, guard } = outcome else {
            panic!("expected a spawned guard");
        };
        assert_eq!(alarm, Position::new(160.0, 160.0));
        assert_eq!(guard.position, Position::new(96.0, 96.0));
        assert_eq!(guard.origin_door, Some(DoorId::new("door-1")));
        assert_eq!(guard.state, EnemyState::Investigating);
        assert_eq!(guard.target_position, Some(alarm));
        assert_eq!(guard.patrol_points, vec![Position::new(96.0, 96.0)]);
        assert_eq!(guard.id, EnemyId::new("spawned-guard-1"));
    }

    #[test]
    fn patrolling_guard_is_redirected_in_place() {
        let doors = initialize_doors();
        let guard = Enemy::patrolling("guard-1", Archetype::Guard, vec![Position::new(600.0, 600.0)]);
        let mut enemies = vec![drone(), guard];

        let outcome = trigger_alarm(&spotted_at(900.0, 130.0), &doors, &mut enemies, 1).expect("alarm");

        assert_eq!(
            outcome,
            AlarmOutcome::Redirected {
                alarm: Position::new(928.0, 160.0),
                guard: EnemyId::new("guard-1"),
            }
        );
        assert_eq!(enemies.len(), 2);
        let redirected = &enemies[1];
        assert_eq!(redirected.state, EnemyState::Investigating);
        assert_eq!(redirected.target_position, Some(Position::new(928.0, 160.0)));
        assert_eq!(redirected.origin_door, Some(DoorId::new("door-2")));
        assert!(redirected.investigation_timer.abs() < f32::EPSILON);
    }

    #[test]
    fn busy_guard_does_not_respond() {
        let doors = initialize_doors();
        let mut chasing = Enemy::patrolling("guard-1", Archetype::Guard, vec![Position::new(600.0, 600.0)]);
        chasing.state = EnemyState::Chasing;
        let mut enemies = vec![chasing];

        let outcome = trigger_alarm(&spotted_at(500.0, 500.0), &doors, &mut enemies, 7).expect("alarm");
        assert!(matches!(outcome, AlarmOutcome::Spawned { ref guard, .. } if guard.id.0 == "spawned-guard-7"));
        assert_eq!(enemies[0].state, EnemyState::Chasing);
    }

    #[test]
    fn preconditions_are_reported() {
        let mut enemies = vec![drone()];
        let mut unplaced = spotted_at(0.0, 0.0);
        unplaced.position = None;
        assert_eq!(
            trigger_alarm(&unplaced, &initialize_doors(), &mut enemies, 1),
            Err(AlarmError::PlayerWithoutPosition(PlayerId::new("spotted")))
        );
        assert_eq!(
            trigger_alarm(&spotted_at(10.0, 10.0), &[], &mut enemies, 1),
            Err(AlarmError::NoDoors)
        );
    }
}
