use bevy_ecs::prelude::*;
use rand::rngs::StdRng;

use common::{
    movement::{LocalPlayer, MoveInput},
    protocol::*,
};

// ============================================================================
// Outbound Messages
// ============================================================================

// One delivery instruction for the transport
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    // Every connected guest
    Broadcast(HostMessage),
    // Every connected guest except the given peer
    AllExcept(PeerId, HostMessage),
    To(PeerId, HostMessage),
    // Drop the connection after anything queued before it went out
    Close(PeerId),
}

impl Outbound {
    // The message carried, if any
    #[must_use]
    pub const fn message(&self) -> Option<&HostMessage> {
        match self {
            Self::Broadcast(msg) | Self::AllExcept(_, msg) | Self::To(_, msg) => Some(msg),
            Self::Close(_) => None,
        }
    }

    // Whether `peer` receives this instruction's message
    #[must_use]
    pub fn reaches(&self, peer: &PeerId) -> bool {
        match self {
            Self::Broadcast(_) => true,
            Self::AllExcept(skip, _) => skip != peer,
            Self::To(target, _) => target == peer,
            Self::Close(_) => false,
        }
    }
}

// Messages produced during a tick (or by an administrative call), drained by
// whoever drives the session.
#[derive(Resource, Debug, Default)]
pub struct Outbox(Vec<Outbound>);

impl Outbox {
    pub fn broadcast_to_all(&mut self, msg: HostMessage) {
        self.0.push(Outbound::Broadcast(msg));
    }

    pub fn broadcast_to_others(&mut self, skip: PeerId, msg: HostMessage) {
        self.0.push(Outbound::AllExcept(skip, msg));
    }

    pub fn send_to(&mut self, peer: PeerId, msg: HostMessage) {
        self.0.push(Outbound::To(peer, msg));
    }

    pub fn close(&mut self, peer: PeerId) {
        self.0.push(Outbound::Close(peer));
    }

    pub fn drain(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Host State
// ============================================================================

// Enemy AI bookkeeping that outlives a single tick
#[derive(Resource, Debug)]
pub struct AiState {
    // Suffix for the next alarm-spawned guard
    pub next_spawn_seq: u32,
    // The enemy roster gained members and guests need a fresh LOBBY_UPDATE
    pub roster_changed: bool,
}

impl Default for AiState {
    fn default() -> Self {
        Self {
            next_spawn_seq: 1,
            roster_changed: false,
        }
    }
}

// The host's own avatar
#[derive(Resource, Debug, Default)]
pub struct LocalAvatar {
    pub id: Option<PlayerId>,
    pub player: LocalPlayer,
}

// Keys held by the host player for the current tick
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct LocalInput(pub MoveInput);

// Source of all host-side randomness (spawn cells, patrol rows)
#[derive(Resource)]
pub struct HostRng(pub StdRng);
