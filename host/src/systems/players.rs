use bevy_ecs::prelude::*;
use bevy_time::Time;
use tracing::debug;

use crate::resources::{LocalAvatar, LocalInput, Outbox};
use common::{lobby::Lobby, protocol::*};

// ============================================================================
// Players Movement System
// ============================================================================

// Predict the host player's own movement and publish it. The roster entry is
// updated every tick so the AI sees the freshest position; the echo to the
// guests is throttled.
pub fn players_movement_system(
    time: Res<Time>,
    input: Res<LocalInput>,
    mut avatar: ResMut<LocalAvatar>,
    mut lobby: ResMut<Lobby>,
    mut outbox: ResMut<Outbox>,
) {
    if lobby.status != MatchStatus::Playing {
        return;
    }
    let Some(id) = avatar.id.clone() else {
        return;
    };
    let Some(me) = lobby.player(&id) else {
        return;
    };
    let frozen = me.frozen;

    // Pick up the spawn cell after a start or restart
    if let Some(authoritative) = me.position {
        if avatar.player.reconcile(authoritative) {
            debug!("{} adopted spawn position {:?}", id, authoritative);
        }
    }

    let echo = avatar.player.update(input.0, time.delta_secs(), frozen);
    if !frozen {
        let pos = avatar.player.position;
        lobby.set_player_position(&id, pos);
    }

    if let Some(pos) = echo {
        outbox.broadcast_to_all(HostMessage::PlayerMove(HPlayerMove { id, pos }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::Outbound;
    use bevy_ecs::system::RunSystemOnce;
    use common::movement::MoveInput;
    use std::time::Duration;

    fn world(frozen: bool) -> World {
        let host = PlayerSummary {
            id: PlayerId::new("host"),
            name: "Host".to_string(),
            color: None,
        };
        let mut lobby = Lobby::hosted_by("l", &host, PeerId::new("peer-host"));
        lobby.status = MatchStatus::Playing;
        lobby.players[0].position = Some(Position::new(200.0, 200.0));
        lobby.players[0].frozen = frozen;

        let mut time = Time::<()>::default();
        time.advance_by(Duration::from_millis(100));

        let mut world = World::new();
        world.insert_resource(lobby);
        world.insert_resource(time);
        world.insert_resource(Outbox::default());
        world.insert_resource(LocalAvatar {
            id: Some(PlayerId::new("host")),
            ..LocalAvatar::default()
        });
        world.insert_resource(LocalInput(MoveInput {
            right: true,
            ..MoveInput::default()
        }));
        world
    }

    #[test]
    fn host_adopts_spawn_then_moves_and_echoes() {
        let mut world = world(false);
        world.run_system_once(players_movement_system).expect("system runs");

        let pos = world.resource::<Lobby>().players[0].position.expect("placed");
        assert!((pos.x - 222.4).abs() < 1e-3);
        let sent = world.resource_mut::<Outbox>().drain();
        assert!(matches!(&sent[..], [Outbound::Broadcast(HostMessage::PlayerMove(mv))] if mv.pos == pos));
    }

    #[test]
    fn frozen_host_stays_put() {
        let mut world = world(true);
        world.run_system_once(players_movement_system).expect("system runs");

        assert_eq!(
            world.resource::<Lobby>().players[0].position,
            Some(Position::new(200.0, 200.0))
        );
        assert!(world.resource::<Outbox>().is_empty());
    }
}
