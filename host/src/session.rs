use std::time::Duration;

use bevy_ecs::{prelude::*, schedule::ExecutorKind};
use bevy_time::Time;
use rand::{Rng, SeedableRng, rngs::StdRng};
use thiserror::Error;
use tracing::info;

use crate::{
    constants::MAX_FRAME_DELTA,
    resources::*,
    systems::{
        enemies_ai_system, enemies_cleanup_system, players_movement_system, players_rescue_system,
        players_update, process_disconnect, process_guest_message,
    },
};
use common::{
    lobby::Lobby,
    movement::MoveInput,
    protocol::*,
    spawning::initialize_world,
};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LobbyError {
    #[error("only possible while in the lobby")]
    NotInLobby,
    #[error("collection {0:?} does not fit the current roster")]
    CollectionUnavailable(Collection),
    #[error("no player {0} in the lobby")]
    UnknownPlayer(PlayerId),
    #[error("the host cannot be kicked")]
    CannotKickHost,
    #[error("cannot go from {from:?} to {to:?}")]
    InvalidTransition { from: MatchStatus, to: MatchStatus },
}

// ============================================================================
// Host Session
// ============================================================================

// The authoritative peer. Owns the world model and runs one simulation tick
// per `tick` call; everything it wants sent ends up in the outbox, which
// `tick` and `drain_outbox` hand to the caller.
pub struct HostSession {
    world: World,
    schedule: Schedule,
}

impl HostSession {
    #[must_use]
    pub fn new(host: &PlayerSummary, host_peer: PeerId, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let lobby_id = format!("lobby-{:06}", rng.random_range(0..1_000_000));

        let mut world = World::new();
        world.insert_resource(Lobby::hosted_by(lobby_id.clone(), host, host_peer));
        world.insert_resource(Time::<()>::default());
        world.insert_resource(Outbox::default());
        world.insert_resource(AiState::default());
        world.insert_resource(LocalAvatar {
            id: Some(host.id.clone()),
            ..LocalAvatar::default()
        });
        world.insert_resource(LocalInput::default());
        world.insert_resource(HostRng(rng));

        // Order matters: the AI sees this tick's host position, and rescues
        // and cleanup see the AI's results
        let mut schedule = Schedule::default();
        schedule.set_executor_kind(ExecutorKind::SingleThreaded);
        schedule.add_systems(
            (
                players_movement_system,
                enemies_ai_system,
                players_rescue_system,
                enemies_cleanup_system,
            )
                .chain(),
        );

        info!("hosting {} as {}", lobby_id, host.id);
        Self { world, schedule }
    }

    #[must_use]
    pub fn lobby(&self) -> &Lobby {
        self.world.resource::<Lobby>()
    }

    pub fn lobby_mut(&mut self) -> Mut<'_, Lobby> {
        self.world.resource_mut::<Lobby>()
    }

    #[must_use]
    pub fn status(&self) -> MatchStatus {
        self.lobby().status
    }

    // Where the host's own avatar is predicted to be
    #[must_use]
    pub fn local_position(&self) -> Position {
        self.world.resource::<LocalAvatar>().player.position
    }

    // ========================================================================
    // Match Lifecycle
    // ========================================================================

    // Start (or restart) a match with a freshly generated world
    pub fn start_match(&mut self) -> Result<(), LobbyError> {
        self.transition(MatchStatus::Playing)?;

        let snapshot = self.world.resource_scope(|world, mut rng: Mut<HostRng>| {
            let mut lobby = world.resource_mut::<Lobby>();
            let layout = initialize_world(&lobby.spawn, &lobby.players, &mut rng.0);
            lobby.doors = layout.doors;
            lobby.enemies = layout.enemies;
            lobby.players = layout.players;
            lobby.status = MatchStatus::Playing;
            lobby.snapshot()
        });

        *self.world.resource_mut::<AiState>() = AiState::default();
        // Forget the last match's prediction so the new spawn is adopted
        self.world.resource_mut::<LocalAvatar>().player.reset();
        info!(
            "match started with {} players and {} enemies",
            snapshot.players.len(),
            snapshot.enemies.len()
        );
        self.outbox().broadcast_to_all(HostMessage::GameStart(HGameStart {
            lobby: Some(snapshot),
        }));
        Ok(())
    }

    pub fn exit_to_lobby(&mut self) -> Result<(), LobbyError> {
        self.transition(MatchStatus::Lobby)?;

        {
            let mut lobby = self.lobby_mut();
            lobby.status = MatchStatus::Lobby;
            lobby.enemies.clear();
            for player in &mut lobby.players {
                player.frozen = false;
            }
        }

        info!("back to the lobby");
        let roster = players_update(self.lobby());
        let mut outbox = self.outbox();
        outbox.broadcast_to_all(HostMessage::GameStatus(HGameStatus {
            status: MatchStatus::Lobby,
        }));
        outbox.broadcast_to_all(roster);
        Ok(())
    }

    fn transition(&self, to: MatchStatus) -> Result<(), LobbyError> {
        let from = self.status();
        if from.can_transition_to(to) {
            Ok(())
        } else {
            Err(LobbyError::InvalidTransition { from, to })
        }
    }

    // ========================================================================
    // Lobby Administration
    // ========================================================================

    pub fn kick(&mut self, target: &PlayerId) -> Result<(), LobbyError> {
        let player = self
            .lobby()
            .player(target)
            .cloned()
            .ok_or_else(|| LobbyError::UnknownPlayer(target.clone()))?;
        if player.is_host {
            return Err(LobbyError::CannotKickHost);
        }

        self.lobby_mut().remove_player(target);
        info!("kicked {}", target);

        let roster = players_update(self.lobby());
        let mut outbox = self.outbox();
        outbox.broadcast_to_all(HostMessage::KickPlayer(HKickPlayer { target: target.clone() }));
        outbox.send_to(
            player.peer_id.clone(),
            HostMessage::Kicked(HKicked {
                reason: KickReason::Kicked,
            }),
        );
        outbox.close(player.peer_id);
        outbox.broadcast_to_all(roster);
        Ok(())
    }

    pub fn select_collection(&mut self, collection: Collection) -> Result<(), LobbyError> {
        let lobby = self.lobby();
        if lobby.status != MatchStatus::Lobby {
            return Err(LobbyError::NotInLobby);
        }
        if !lobby.collection_selectable(collection) {
            return Err(LobbyError::CollectionUnavailable(collection));
        }

        self.lobby_mut().collection = Some(collection);
        info!("collection {:?} selected", collection);
        self.outbox()
            .broadcast_to_all(HostMessage::CollectionSelected(HCollectionSelected { collection }));
        Ok(())
    }

    // Takes effect on the next match start
    pub fn set_spawn(&mut self, archetype: Archetype, enabled: bool) {
        self.lobby_mut().spawn.set(archetype, enabled);
        self.outbox()
            .broadcast_to_all(HostMessage::SetSpawn(HSetSpawn { archetype, enabled }));
    }

    // ========================================================================
    // Network Input
    // ========================================================================

    pub fn handle_message(&mut self, peer: &PeerId, msg: GuestMessage) {
        self.world.resource_scope(|world, mut outbox: Mut<Outbox>| {
            let mut lobby = world.resource_mut::<Lobby>();
            process_guest_message(&mut lobby, &mut outbox, peer, msg);
        });
    }

    pub fn disconnect(&mut self, peer: &PeerId) {
        self.world.resource_scope(|world, mut outbox: Mut<Outbox>| {
            let mut lobby = world.resource_mut::<Lobby>();
            process_disconnect(&mut lobby, &mut outbox, peer);
        });
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    // Run one frame of `delta` seconds with the host player's `input` and
    // return everything to send
    pub fn tick(&mut self, delta: f32, input: MoveInput) -> Vec<Outbound> {
        let delta = if delta.is_finite() {
            delta.clamp(0.0, MAX_FRAME_DELTA)
        } else {
            0.0
        };

        self.world
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(delta));
        self.world.resource_mut::<LocalInput>().0 = input;
        self.schedule.run(&mut self.world);

        self.drain_outbox()
    }

    pub fn drain_outbox(&mut self) -> Vec<Outbound> {
        self.outbox().drain()
    }

    fn outbox(&mut self) -> Mut<'_, Outbox> {
        self.world.resource_mut::<Outbox>()
    }
}
