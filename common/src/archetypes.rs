use crate::{constants::*, protocol::Archetype};

// ============================================================================
// Archetype Profiles
// ============================================================================

// How an enemy perceives players
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOfView {
    // Any direction within range
    Omni,
    // Along its own row, on the side it faces
    Directional,
}

// What an enemy does when it spots a player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SightingReaction {
    Pursue,
    RaiseAlarm,
}

// What an enemy does after losing its chase target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LostTarget {
    // Head back to the current patrol waypoint
    Return,
    // Hover in place for the dwell time first
    Pause,
}

// How an enemy investigates a point of interest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Investigation {
    // Walk to the point, linger, then return to the origin door
    Respond,
    // Stay put, linger, then go back to the route
    Linger,
}

// What touching a player does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    None,
    Freeze,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArchetypeProfile {
    pub patrol_speed: f32,      // world units per second
    pub chase_speed: f32,       // world units per second
    pub investigate_speed: f32, // world units per second
    pub detection_range: f32,   // world units
    pub leash: f32,             // world units
    pub dwell: f32,             // seconds
    pub field_of_view: FieldOfView,
    pub reaction: SightingReaction,
    pub lost_target: LostTarget,
    pub investigation: Investigation,
    pub contact: Contact,
}

const GUARD: ArchetypeProfile = ArchetypeProfile {
    patrol_speed: GUARD_PATROL_SPEED * GRID_SIZE,
    chase_speed: GUARD_CHASE_SPEED * GRID_SIZE,
    investigate_speed: PLAYER_BASE_SPEED * INVESTIGATE_SPEED_FACTOR,
    detection_range: GUARD_DETECTION_RANGE * GRID_SIZE,
    leash: GROUND_LEASH * GRID_SIZE,
    dwell: INVESTIGATION_DURATION,
    field_of_view: FieldOfView::Omni,
    reaction: SightingReaction::Pursue,
    lost_target: LostTarget::Return,
    investigation: Investigation::Respond,
    contact: Contact::Freeze,
};

const DOG: ArchetypeProfile = ArchetypeProfile {
    patrol_speed: DOG_PATROL_SPEED * GRID_SIZE,
    chase_speed: DOG_CHASE_SPEED * GRID_SIZE,
    investigate_speed: PLAYER_BASE_SPEED * INVESTIGATE_SPEED_FACTOR,
    detection_range: DOG_DETECTION_RANGE * GRID_SIZE,
    leash: GROUND_LEASH * GRID_SIZE,
    dwell: INVESTIGATION_DURATION,
    field_of_view: FieldOfView::Omni,
    reaction: SightingReaction::Pursue,
    lost_target: LostTarget::Return,
    investigation: Investigation::Respond,
    contact: Contact::GameOver,
};

const DRONE: ArchetypeProfile = ArchetypeProfile {
    patrol_speed: DRONE_PATROL_SPEED * GRID_SIZE,
    chase_speed: DRONE_CHASE_SPEED * GRID_SIZE,
    investigate_speed: 0.0,
    detection_range: DRONE_DETECTION_RANGE * GRID_SIZE,
    leash: DRONE_LEASH * GRID_SIZE,
    dwell: SENSOR_DWELL_DURATION,
    field_of_view: FieldOfView::Omni,
    reaction: SightingReaction::RaiseAlarm,
    lost_target: LostTarget::Pause,
    investigation: Investigation::Linger,
    contact: Contact::None,
};

const CAMERA: ArchetypeProfile = ArchetypeProfile {
    patrol_speed: 0.0,
    chase_speed: 0.0,
    investigate_speed: 0.0,
    detection_range: CAMERA_DETECTION_RANGE * GRID_SIZE,
    leash: 0.0,
    dwell: SENSOR_DWELL_DURATION,
    field_of_view: FieldOfView::Directional,
    reaction: SightingReaction::RaiseAlarm,
    lost_target: LostTarget::Pause,
    investigation: Investigation::Linger,
    contact: Contact::None,
};

impl Archetype {
    #[must_use]
    pub const fn profile(self) -> &'static ArchetypeProfile {
        match self {
            Self::Guard => &GUARD,
            Self::Dog => &DOG,
            Self::Drone => &DRONE,
            Self::Camera => &CAMERA,
        }
    }

    // Cameras never leave their mount
    #[must_use]
    pub const fn is_stationary(self) -> bool {
        matches!(self, Self::Camera)
    }
}
