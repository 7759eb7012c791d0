#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "bincode")]
use bincode::{Decode, Encode};

use bevy_ecs::prelude::Resource;

use crate::{
    constants::{HOST_COLOR, PLAYER_COLORS},
    protocol::*,
};

// ============================================================================
// World Model
// ============================================================================

// The shared world: rosters plus match setup. The host owns it while a match
// is running; guests keep a replica that inbound messages overwrite.
#[derive(Resource, Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
pub struct Lobby {
    pub id: Option<String>,
    pub host_peer: Option<PeerId>,
    pub players: Vec<Player>,
    pub enemies: Vec<Enemy>,
    pub doors: Vec<Door>,
    pub status: MatchStatus,
    pub collection: Option<Collection>,
    pub spawn: SpawnToggles,
}

impl Lobby {
    // Fresh lobby with the host as its only player
    #[must_use]
    pub fn hosted_by(lobby_id: impl Into<String>, host: &PlayerSummary, host_peer: PeerId) -> Self {
        Self {
            id: Some(lobby_id.into()),
            host_peer: Some(host_peer.clone()),
            players: vec![Player {
                id: host.id.clone(),
                name: host.name.clone(),
                is_host: true,
                peer_id: host_peer,
                color: HOST_COLOR.to_string(),
                position: None,
                frozen: false,
            }],
            status: MatchStatus::Lobby,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.id == id)
    }

    #[must_use]
    pub fn player_by_peer(&self, peer: &PeerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.peer_id == peer)
    }

    #[must_use]
    pub fn host_player(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_host)
    }

    #[must_use]
    pub fn enemy(&self, id: &EnemyId) -> Option<&Enemy> {
        self.enemies.iter().find(|e| &e.id == id)
    }

    pub fn enemy_mut(&mut self, id: &EnemyId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|e| &e.id == id)
    }

    #[must_use]
    pub fn door(&self, id: &DoorId) -> Option<&Door> {
        self.doors.iter().find(|d| &d.id == id)
    }

    // Insert or replace a player. Replacing keeps the roster slot so a
    // rejoining player does not shuffle the order; new players without a
    // color get the first unused one from the palette.
    pub fn add_player(&mut self, mut player: Player) {
        if let Some(existing) = self.player_mut(&player.id) {
            *existing = player;
            return;
        }

        if player.color.is_empty() {
            player.color = self.next_color().to_string();
        }
        self.players.push(player);
    }

    fn next_color(&self) -> &'static str {
        PLAYER_COLORS
            .iter()
            .find(|c| !self.players.iter().any(|p| p.color == **c))
            .copied()
            .unwrap_or(PLAYER_COLORS[0])
    }

    pub fn remove_player(&mut self, id: &PlayerId) -> Option<Player> {
        let index = self.players.iter().position(|p| &p.id == id)?;
        Some(self.players.remove(index))
    }

    pub fn set_player_position(&mut self, id: &PlayerId, pos: Position) -> bool {
        self.player_mut(id).map(|p| p.position = Some(pos)).is_some()
    }

    // Returns true only when the flag actually changed
    pub fn set_player_frozen(&mut self, id: &PlayerId, frozen: bool) -> bool {
        match self.player_mut(id) {
            Some(p) if p.frozen != frozen => {
                p.frozen = frozen;
                true
            }
            _ => false,
        }
    }

    // Apply an authoritative enemy delta. Unknown enemies are left alone; the
    // next roster update brings them in.
    pub fn apply_enemy_move(&mut self, msg: &HEnemyMove) -> bool {
        let Some(enemy) = self.enemy_mut(&msg.id) else {
            return false;
        };
        enemy.position = msg.pos;
        enemy.state = msg.state;
        enemy.target_player.clone_from(&msg.target_id);
        enemy.target_position = msg.target_pos;
        enemy.investigation_timer = msg.investigation_timer;
        true
    }

    // Full copy for GAME_START / LOBBY_SYNC
    #[must_use]
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    // Take over an authoritative snapshot wholesale. Everything the host
    // sends wins over the replica, including this peer's own player entry.
    pub fn apply_snapshot(&mut self, snapshot: Self) {
        *self = snapshot;
    }

    // Drop enemies that finished their lifecycle; returns how many went
    pub fn remove_gone_enemies(&mut self) -> usize {
        let before = self.enemies.len();
        self.enemies.retain(|e| e.state != EnemyState::Gone);
        before - self.enemies.len()
    }

    #[must_use]
    pub fn collection_selectable(&self, collection: Collection) -> bool {
        collection.is_selectable(self.players.len())
    }

    // Back to the entry screen
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str) -> PlayerSummary {
        PlayerSummary {
            id: PlayerId::new(id),
            name: id.to_uppercase(),
            color: None,
        }
    }

    fn guest(id: &str) -> Player {
        Player {
            id: PlayerId::new(id),
            name: id.to_string(),
            is_host: false,
            peer_id: PeerId::new(format!("peer-{id}")),
            color: String::new(),
            position: None,
            frozen: false,
        }
    }

    #[test]
    fn hosted_lobby_starts_with_host() {
        let lobby = Lobby::hosted_by("l1", &summary("alice"), PeerId::new("peer-alice"));
        assert_eq!(lobby.status, MatchStatus::Lobby);
        let host = lobby.host_player().expect("host present");
        assert_eq!(host.color, HOST_COLOR);
        assert!(host.position.is_none());
    }

    #[test]
    fn guests_get_distinct_palette_colors() {
        let mut lobby = Lobby::hosted_by("l1", &summary("alice"), PeerId::new("peer-alice"));
        lobby.add_player(guest("bob"));
        lobby.add_player(guest("carol"));
        assert_eq!(lobby.players[1].color, PLAYER_COLORS[0]);
        assert_eq!(lobby.players[2].color, PLAYER_COLORS[1]);
    }

    #[test]
    fn rejoin_replaces_in_place() {
        let mut lobby = Lobby::hosted_by("l1", &summary("alice"), PeerId::new("peer-alice"));
        lobby.add_player(guest("bob"));
        lobby.add_player(guest("carol"));

        let mut again = guest("bob");
        again.peer_id = PeerId::new("peer-bob-2");
        again.color = PLAYER_COLORS[0].to_string();
        lobby.add_player(again);

        assert_eq!(lobby.players.len(), 3);
        assert_eq!(lobby.players[1].peer_id, PeerId::new("peer-bob-2"));
    }

    #[test]
    fn frozen_flag_reports_changes_only() {
        let mut lobby = Lobby::hosted_by("l1", &summary("alice"), PeerId::new("peer-alice"));
        let alice = PlayerId::new("alice");
        assert!(lobby.set_player_frozen(&alice, true));
        assert!(!lobby.set_player_frozen(&alice, true));
        assert!(lobby.set_player_frozen(&alice, false));
        assert!(!lobby.set_player_frozen(&PlayerId::new("nobody"), true));
    }

    #[test]
    fn gone_enemies_are_pruned() {
        let mut lobby = Lobby::default();
        let mut spawned = Enemy::patrolling("spawned-guard-1", Archetype::Guard, vec![Position::new(96.0, 96.0)]);
        spawned.state = EnemyState::Gone;
        lobby.enemies = vec![
            Enemy::patrolling("guard-1", Archetype::Guard, vec![Position::new(0.0, 0.0)]),
            spawned,
        ];
        assert_eq!(lobby.remove_gone_enemies(), 1);
        assert_eq!(lobby.enemies.len(), 1);
        assert_eq!(lobby.remove_gone_enemies(), 0);
    }

    #[test]
    fn enemy_move_for_unknown_enemy_is_ignored() {
        let mut lobby = Lobby::default();
        let msg = HEnemyMove {
            id: EnemyId::new("ghost"),
            pos: Position::new(1.0, 2.0),
            state: EnemyState::Chasing,
            target_id: None,
            target_pos: None,
            investigation_timer: 0.0,
        };
        assert!(!lobby.apply_enemy_move(&msg));
    }
}
