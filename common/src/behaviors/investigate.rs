use crate::{
    archetypes::Investigation,
    constants::INVESTIGATE_ARRIVAL_THRESHOLD,
    grid::step_toward,
    protocol::*,
};

// ============================================================================
// Investigate Behavior
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvestigateOutcome {
    Continue,
    // Head back; None when there is no known place to go
    Return(Option<Position>),
    // Stationary sensors go straight back to watching
    Resume,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvestigateStep {
    pub position: Position,
    pub timer: f32,
    pub outcome: InvestigateOutcome,
}

// Responders walk to the point of interest and dwell there before returning
// to the door they came from. Sensors only dwell where they are.
#[must_use]
pub fn investigate_step(enemy: &Enemy, doors: &[Door], delta: f32) -> InvestigateStep {
    let profile = enemy.archetype.profile();

    match profile.investigation {
        Investigation::Respond => respond(enemy, doors, profile.investigate_speed, profile.dwell, delta),
        Investigation::Linger => linger(enemy, profile.dwell, delta),
    }
}

fn respond(enemy: &Enemy, doors: &[Door], speed: f32, dwell: f32, delta: f32) -> InvestigateStep {
    let Some(target) = enemy.target_position else {
        return InvestigateStep {
            position: enemy.position,
            timer: enemy.investigation_timer,
            outcome: InvestigateOutcome::Return(None),
        };
    };

    if enemy.position.distance(&target) > INVESTIGATE_ARRIVAL_THRESHOLD {
        return InvestigateStep {
            position: step_toward(&enemy.position, &target, speed, delta),
            timer: enemy.investigation_timer,
            outcome: InvestigateOutcome::Continue,
        };
    }

    let timer = enemy.investigation_timer + delta;
    let outcome = if timer >= dwell {
        let door = enemy
            .origin_door
            .as_ref()
            .and_then(|id| doors.iter().find(|d| &d.id == id));
        InvestigateOutcome::Return(door.map(|d| d.position))
    } else {
        InvestigateOutcome::Continue
    };

    InvestigateStep {
        position: enemy.position,
        timer,
        outcome,
    }
}

fn linger(enemy: &Enemy, dwell: f32, delta: f32) -> InvestigateStep {
    let timer = enemy.investigation_timer + delta;
    let outcome = if timer < dwell {
        InvestigateOutcome::Continue
    } else if enemy.archetype.is_stationary() {
        InvestigateOutcome::Resume
    } else {
        InvestigateOutcome::Return(Some(enemy.current_waypoint()))
    };

    InvestigateStep {
        position: enemy.position,
        timer,
        outcome,
    }
}
