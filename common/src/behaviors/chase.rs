use crate::{grid::step_toward, protocol::*};

// ============================================================================
// Chase Behavior
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChaseStep {
    Moved(Position),
    Lost,
}

// Pursue `target` at chase speed. The chase is lost when the target is gone,
// unplaced, frozen, or has slipped past the archetype's leash.
#[must_use]
pub fn chase_step(enemy: &Enemy, target: Option<&Player>, delta: f32) -> ChaseStep {
    let Some(target) = target.filter(|p| !p.frozen) else {
        return ChaseStep::Lost;
    };
    let Some(target_pos) = target.position else {
        return ChaseStep::Lost;
    };

    let profile = enemy.archetype.profile();
    if enemy.position.distance(&target_pos) > profile.leash {
        return ChaseStep::Lost;
    }

    ChaseStep::Moved(step_toward(&enemy.position, &target_pos, profile.chase_speed, delta))
}
