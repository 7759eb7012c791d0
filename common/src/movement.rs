use std::collections::HashMap;

use crate::{
    constants::*,
    grid::{clamp_to_world, map_center},
    protocol::{Player, PlayerId, Position},
};

// ============================================================================
// Local Player Movement
// ============================================================================

// Directional keys held this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveInput {
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        !(self.up || self.down || self.left || self.right)
    }
}

// The peer's own avatar, predicted locally every frame. Positions start at the
// map centre until the first authoritative spawn is adopted.
#[derive(Debug, Clone)]
pub struct LocalPlayer {
    pub position: Position,
    clock: f32,
    last_echo: Option<f32>,
}

impl Default for LocalPlayer {
    fn default() -> Self {
        Self {
            position: map_center(),
            clock: 0.0,
            last_echo: None,
        }
    }
}

impl LocalPlayer {
    // Integrate one frame of input. Returns the position to echo to the other
    // peers, if the player moved and the echo interval has elapsed.
    pub fn update(&mut self, input: MoveInput, delta: f32, locked: bool) -> Option<Position> {
        self.clock += delta;

        if locked || input.is_idle() {
            return None;
        }

        let step = PLAYER_BASE_SPEED * delta;
        let mut next = self.position;
        if input.up {
            next.y -= step;
        }
        if input.down {
            next.y += step;
        }
        if input.left {
            next.x -= step;
        }
        if input.right {
            next.x += step;
        }
        self.position = clamp_to_world(next);

        if self.last_echo.is_some_and(|t| self.clock - t <= PLAYER_MOVE_INTERVAL) {
            return None;
        }
        self.last_echo = Some(self.clock);
        Some(self.position)
    }

    // Adopt the authoritative position when the two have drifted far apart or
    // the player has not moved off the centre yet. Returns true if adopted.
    pub fn reconcile(&mut self, authoritative: Position) -> bool {
        let untouched = self.position == map_center();
        if untouched || self.position.distance(&authoritative) > RECONCILE_SNAP_DISTANCE {
            self.position = authoritative;
            return true;
        }
        false
    }

    // Back to the centre, e.g. after leaving a match
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// Remote Player Smoothing
// ============================================================================

// Displayed positions of the other players, eased toward the last known
// authoritative position every frame.
#[derive(Debug, Clone, Default)]
pub struct RemoteSmoothing {
    display: HashMap<PlayerId, Position>,
}

impl RemoteSmoothing {
    pub fn update(&mut self, players: &[Player], local: &PlayerId, delta: f32) {
        let factor = 1.0 - (-REMOTE_SMOOTHING_RATE * delta).exp();

        self.display.retain(|id, _| players.iter().any(|p| &p.id == id));

        for player in players.iter().filter(|p| &p.id != local) {
            let target = player.position.unwrap_or_else(map_center);
            let shown = self.display.entry(player.id.clone()).or_insert(target);
            *shown = shown.to_vec2().lerp(target.to_vec2(), factor).into();
        }
    }

    #[must_use]
    pub fn display_position(&self, id: &PlayerId) -> Option<Position> {
        self.display.get(id).copied()
    }

    pub fn clear(&mut self) {
        self.display.clear();
    }
}
