use crate::{
    archetypes::FieldOfView,
    constants::CAMERA_ROW_THRESHOLD,
    protocol::{Enemy, Facing, Player},
};

// ============================================================================
// Detection
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Sighting<'a> {
    pub player: &'a Player,
    pub distance: f32,
}

// Nearest player `enemy` can see within `range`. Players without a position
// and frozen players are invisible. Ties go to the earlier roster entry.
#[must_use]
pub fn detect<'a>(enemy: &Enemy, players: &'a [Player], range: f32) -> Option<Sighting<'a>> {
    let mut closest: Option<Sighting<'a>> = None;

    for player in players {
        if player.frozen {
            continue;
        }
        let Some(pos) = player.position else {
            continue;
        };

        let dx = pos.x - enemy.position.x;
        let dy = pos.y - enemy.position.y;
        let distance = dx.hypot(dy);

        if distance >= range || !in_view(enemy, dx, dy, range) {
            continue;
        }

        if closest.is_none_or(|c| distance < c.distance) {
            closest = Some(Sighting { player, distance });
        }
    }

    closest
}

fn in_view(enemy: &Enemy, dx: f32, dy: f32, range: f32) -> bool {
    match enemy.archetype.profile().field_of_view {
        FieldOfView::Omni => true,
        FieldOfView::Directional => {
            if dy.abs() >= CAMERA_ROW_THRESHOLD || dx.abs() >= range {
                return false;
            }
            // No facing means the sensor looks nowhere
            match enemy.facing {
                Some(Facing::Left) => dx < 0.0,
                Some(Facing::Right) => dx > 0.0,
                None => false,
            }
        }
    }
}
