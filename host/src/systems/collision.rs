use bevy_ecs::prelude::*;
use tracing::info;

use crate::resources::Outbox;
use common::{collision::*, lobby::Lobby, protocol::*};

// ============================================================================
// Contact Application
// ============================================================================

// Apply the contacts found during the AI pass. A game over ends the match at
// once; freezes are announced once per player.
pub fn apply_enemy_contacts(lobby: &mut Lobby, outbox: &mut Outbox, contacts: &[EnemyContact]) {
    for contact in contacts {
        if lobby.status != MatchStatus::Playing {
            return;
        }

        if contact.should_game_over {
            info!("{} was caught by a dog, game over", contact.player);
            lobby.status = MatchStatus::Gameover;
            outbox.broadcast_to_all(HostMessage::GameStatus(HGameStatus {
                status: MatchStatus::Gameover,
            }));
        } else if contact.should_freeze && lobby.set_player_frozen(&contact.player, true) {
            info!("{} was captured", contact.player);
            outbox.broadcast_to_all(HostMessage::PlayerFrozen(HPlayerFrozen {
                id: contact.player.clone(),
                frozen: true,
            }));
        }
    }
}

// ============================================================================
// Rescue System
// ============================================================================

// Free players thaw frozen teammates they touch
pub fn players_rescue_system(mut lobby: ResMut<Lobby>, mut outbox: ResMut<Outbox>) {
    if lobby.status != MatchStatus::Playing {
        return;
    }

    for id in check_player_unfreeze_collisions(&lobby.players) {
        if lobby.set_player_frozen(&id, false) {
            info!("{} was rescued", id);
            outbox.broadcast_to_all(HostMessage::PlayerFrozen(HPlayerFrozen { id, frozen: false }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::Outbound;
    use bevy_ecs::system::RunSystemOnce;

    fn playing_lobby() -> Lobby {
        let mut lobby = Lobby {
            status: MatchStatus::Playing,
            ..Lobby::default()
        };
        for (id, x) in [("a", 100.0), ("b", 500.0)] {
            lobby.add_player(Player {
                id: PlayerId::new(id),
                name: id.to_string(),
                is_host: false,
                peer_id: PeerId::new(id),
                color: String::new(),
                position: Some(Position::new(x, 100.0)),
                frozen: false,
            });
        }
        lobby
    }

    fn freeze(id: &str) -> EnemyContact {
        EnemyContact {
            player: PlayerId::new(id),
            should_freeze: true,
            should_game_over: false,
        }
    }

    #[test]
    fn freeze_is_announced_once() {
        let mut lobby = playing_lobby();
        let mut outbox = Outbox::default();
        apply_enemy_contacts(&mut lobby, &mut outbox, &[freeze("a"), freeze("a")]);
        assert_eq!(outbox.drain().len(), 1);
        apply_enemy_contacts(&mut lobby, &mut outbox, &[freeze("a")]);
        assert!(outbox.is_empty());
    }

    #[test]
    fn game_over_stops_further_contacts() {
        let mut lobby = playing_lobby();
        let mut outbox = Outbox::default();
        let dog = EnemyContact {
            player: PlayerId::new("a"),
            should_freeze: false,
            should_game_over: true,
        };
        apply_enemy_contacts(&mut lobby, &mut outbox, &[dog, freeze("b")]);
        assert_eq!(lobby.status, MatchStatus::Gameover);
        assert_eq!(
            outbox.drain(),
            vec![Outbound::Broadcast(HostMessage::GameStatus(HGameStatus {
                status: MatchStatus::Gameover
            }))]
        );
        assert!(!lobby.players[1].frozen);
    }

    #[test]
    fn touching_teammate_rescues() {
        let mut world = World::new();
        let mut lobby = playing_lobby();
        lobby.set_player_frozen(&PlayerId::new("a"), true);
        lobby.players[1].position = Some(Position::new(120.0, 100.0));
        world.insert_resource(lobby);
        world.insert_resource(Outbox::default());

        world.run_system_once(players_rescue_system).expect("system runs");

        assert!(!world.resource::<Lobby>().players[0].frozen);
        let sent = world.resource_mut::<Outbox>().drain();
        assert_eq!(
            sent,
            vec![Outbound::Broadcast(HostMessage::PlayerFrozen(HPlayerFrozen {
                id: PlayerId::new("a"),
                frozen: false
            }))]
        );
    }
}
