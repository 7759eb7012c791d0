use tracing::{debug, info, warn};

use crate::resources::Outbox;
use common::{constants::MAX_LOBBY_PLAYERS, lobby::Lobby, protocol::*};

// ============================================================================
// Helper Functions
// ============================================================================

#[must_use]
pub fn players_update(lobby: &Lobby) -> HostMessage {
    HostMessage::LobbyUpdate(HLobbyUpdate {
        players: Some(lobby.players.clone()),
        enemies: None,
    })
}

#[must_use]
pub fn enemies_update(lobby: &Lobby) -> HostMessage {
    HostMessage::LobbyUpdate(HLobbyUpdate {
        players: None,
        enemies: Some(lobby.enemies.clone()),
    })
}

// ============================================================================
// Guest Message Processing
// ============================================================================

pub fn process_guest_message(lobby: &mut Lobby, outbox: &mut Outbox, peer: &PeerId, msg: GuestMessage) {
    match msg {
        GuestMessage::JoinRequest(join) => process_join_request(lobby, outbox, peer, join.player),
        GuestMessage::PlayerMove(mv) => process_player_move(lobby, outbox, peer, mv),
        GuestMessage::Leave(_) => {
            debug!("{} left", peer);
            process_disconnect(lobby, outbox, peer);
        }
    }
}

fn process_join_request(lobby: &mut Lobby, outbox: &mut Outbox, peer: &PeerId, summary: PlayerSummary) {
    let existing = lobby.player(&summary.id).cloned();

    if existing.as_ref().is_some_and(|p| p.is_host) {
        warn!("{} tried to join as the host player {}", peer, summary.id);
        return;
    }

    if existing.is_none() && lobby.players.len() >= MAX_LOBBY_PLAYERS {
        info!("rejected {} from {}: lobby full", summary.id, peer);
        outbox.send_to(
            peer.clone(),
            HostMessage::Kicked(HKicked {
                reason: KickReason::LobbyFull,
            }),
        );
        outbox.close(peer.clone());
        return;
    }

    let name = if summary.name.is_empty() {
        format!("Player {}", lobby.players.len() + 1)
    } else {
        summary.name
    };

    // A returning player keeps their slot, colour and match state
    let player = match existing {
        Some(prev) => Player {
            name,
            peer_id: peer.clone(),
            color: summary.color.unwrap_or(prev.color),
            ..prev
        },
        None => Player {
            id: summary.id,
            name,
            is_host: false,
            peer_id: peer.clone(),
            color: summary.color.unwrap_or_default(),
            position: None,
            frozen: false,
        },
    };

    info!("{} joined from {}", player.id, peer);
    lobby.add_player(player);

    outbox.send_to(peer.clone(), HostMessage::LobbySync(HLobbySync { lobby: lobby.snapshot() }));
    outbox.broadcast_to_others(peer.clone(), players_update(lobby));
}

fn process_player_move(lobby: &mut Lobby, outbox: &mut Outbox, peer: &PeerId, mv: GPlayerMove) {
    if lobby.status != MatchStatus::Playing {
        debug!("ignoring move from {} outside a match", peer);
        return;
    }

    let Some(player) = lobby.player(&mv.id) else {
        debug!("ignoring move for unknown {}", mv.id);
        return;
    };
    if &player.peer_id != peer {
        warn!("{} sent a move for {} which it does not own", peer, mv.id);
        return;
    }
    if player.frozen {
        return;
    }

    lobby.set_player_position(&mv.id, mv.pos);
    outbox.broadcast_to_others(peer.clone(), HostMessage::PlayerMove(HPlayerMove { id: mv.id, pos: mv.pos }));
}

// A guest left or its connection dropped
pub fn process_disconnect(lobby: &mut Lobby, outbox: &mut Outbox, peer: &PeerId) {
    let Some(id) = lobby.player_by_peer(peer).map(|p| p.id.clone()) else {
        debug!("{} disconnected without a player", peer);
        return;
    };

    lobby.remove_player(&id);
    info!("{} disconnected ({} players left)", id, lobby.players.len());
    outbox.broadcast_to_others(peer.clone(), players_update(lobby));
}
