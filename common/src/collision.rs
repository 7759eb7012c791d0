use crate::{
    archetypes::Contact,
    constants::COLLISION_DISTANCE,
    protocol::{Enemy, Player, PlayerId, Position},
};

// ============================================================================
// Enemy Contact
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnemyContact {
    pub player: PlayerId,
    pub should_freeze: bool,
    pub should_game_over: bool,
}

fn touching(a: &Position, b: &Position) -> bool {
    a.distance(b) < COLLISION_DISTANCE
}

// Players `enemy` touches this tick, in roster order. Frozen or unplaced
// players never collide.
#[must_use]
pub fn check_enemy_collisions(enemy: &Enemy, players: &[Player]) -> Vec<EnemyContact> {
    let contact = enemy.archetype.profile().contact;
    if contact == Contact::None {
        return Vec::new();
    }

    players
        .iter()
        .filter(|p| !p.frozen)
        .filter(|p| p.position.is_some_and(|pos| touching(&enemy.position, &pos)))
        .map(|p| EnemyContact {
            player: p.id.clone(),
            should_freeze: contact == Contact::Freeze,
            should_game_over: contact == Contact::GameOver,
        })
        .collect()
}

// ============================================================================
// Player Rescue
// ============================================================================

// Frozen players touched by at least one free teammate, in roster order
#[must_use]
pub fn check_player_unfreeze_collisions(players: &[Player]) -> Vec<PlayerId> {
    let free: Vec<Position> = players
        .iter()
        .filter(|p| !p.frozen)
        .filter_map(|p| p.position)
        .collect();

    players
        .iter()
        .filter(|p| p.frozen)
        .filter(|p| {
            p.position
                .is_some_and(|pos| free.iter().any(|other| touching(&pos, other)))
        })
        .map(|p| p.id.clone())
        .collect()
}
