use tracing::{debug, info};

use common::{
    lobby::Lobby,
    movement::{LocalPlayer, MoveInput, RemoteSmoothing},
    protocol::*,
};

// ============================================================================
// Guest Events
// ============================================================================

// Things the presentation layer wants to react to
#[derive(Debug, Clone, PartialEq)]
pub enum GuestEvent {
    Joined,
    MatchStarted,
    StatusChanged(MatchStatus),
    Alarm(Position),
    // This peer's own player was frozen or rescued
    Frozen(bool),
    Removed(KickReason),
}

// ============================================================================
// Guest Session
// ============================================================================

// A replica of the host's world plus this peer's predicted avatar
#[derive(Debug)]
pub struct GuestSession {
    me: PlayerSummary,
    lobby: Lobby,
    local: LocalPlayer,
    smoothing: RemoteSmoothing,
}

impl GuestSession {
    #[must_use]
    pub fn new(me: PlayerSummary) -> Self {
        Self {
            me,
            lobby: Lobby::default(),
            local: LocalPlayer::default(),
            smoothing: RemoteSmoothing::default(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> &PlayerId {
        &self.me.id
    }

    #[must_use]
    pub const fn lobby(&self) -> &Lobby {
        &self.lobby
    }

    #[must_use]
    pub const fn local_position(&self) -> Position {
        self.local.position
    }

    // Where another player is drawn
    #[must_use]
    pub fn display_position(&self, id: &PlayerId) -> Option<Position> {
        self.smoothing.display_position(id)
    }

    #[must_use]
    pub fn join_request(&self) -> GuestMessage {
        GuestMessage::JoinRequest(GJoinRequest { player: self.me.clone() })
    }

    // Forget the lobby and tell the host
    pub fn leave(&mut self) -> GuestMessage {
        self.reset();
        GuestMessage::Leave(GLeave {})
    }

    fn reset(&mut self) {
        self.lobby.reset();
        self.local.reset();
        self.smoothing.clear();
    }

    // ========================================================================
    // Inbound
    // ========================================================================

    pub fn handle_message(&mut self, msg: HostMessage) -> Option<GuestEvent> {
        match msg {
            HostMessage::LobbySync(sync) => {
                self.adopt_snapshot(sync.lobby);
                info!("joined {}", self.lobby.id.as_deref().unwrap_or("lobby"));
                Some(GuestEvent::Joined)
            }
            HostMessage::LobbyUpdate(update) => {
                if let Some(players) = update.players {
                    self.lobby.players = players;
                    self.keep_own_position();
                }
                if let Some(enemies) = update.enemies {
                    self.lobby.enemies = enemies;
                }
                None
            }
            HostMessage::KickPlayer(kick) => {
                if kick.target == self.me.id {
                    return Some(self.removed(KickReason::Kicked));
                }
                self.lobby.remove_player(&kick.target);
                None
            }
            HostMessage::Kicked(kicked) => Some(self.removed(kicked.reason)),
            HostMessage::CollectionSelected(selected) => {
                self.lobby.collection = Some(selected.collection);
                None
            }
            HostMessage::SetSpawn(toggle) => {
                self.lobby.spawn.set(toggle.archetype, toggle.enabled);
                None
            }
            HostMessage::GameStart(start) => {
                // Every match spawns afresh, however close to the old spot
                self.local.reset();
                match start.lobby {
                    Some(snapshot) => self.adopt_snapshot(snapshot),
                    None => self.lobby.status = MatchStatus::Playing,
                }
                self.smoothing.clear();
                Some(GuestEvent::MatchStarted)
            }
            HostMessage::GameStatus(update) => {
                self.lobby.status = update.status;
                if update.status == MatchStatus::Lobby {
                    self.lobby.enemies.clear();
                    self.smoothing.clear();
                }
                Some(GuestEvent::StatusChanged(update.status))
            }
            HostMessage::PlayerMove(mv) => {
                // The host relays our own echo back in some paths; prediction wins
                if mv.id != self.me.id {
                    self.lobby.set_player_position(&mv.id, mv.pos);
                }
                None
            }
            HostMessage::EnemyMove(mv) => {
                if !self.lobby.apply_enemy_move(&mv) {
                    debug!("ignoring move for unknown enemy {}", mv.id);
                }
                None
            }
            HostMessage::EnemyAlarm(alarm) => Some(GuestEvent::Alarm(alarm.pos)),
            HostMessage::PlayerFrozen(update) => {
                let changed = self.lobby.set_player_frozen(&update.id, update.frozen);
                (changed && update.id == self.me.id).then_some(GuestEvent::Frozen(update.frozen))
            }
        }
    }

    fn adopt_snapshot(&mut self, snapshot: Lobby) {
        self.lobby.apply_snapshot(snapshot);
        let spawn = self.lobby.player(&self.me.id).and_then(|p| p.position);
        if let Some(spawn) = spawn {
            if self.local.reconcile(spawn) {
                debug!("adopted spawn position {:?}", spawn);
            }
            self.keep_own_position();
        }
    }

    // The replica's own entry follows local prediction, never the roster
    fn keep_own_position(&mut self) {
        if self.lobby.status != MatchStatus::Playing {
            return;
        }
        let placed = self.lobby.player(&self.me.id).is_some_and(|p| p.position.is_some());
        if placed {
            let pos = self.local.position;
            self.lobby.set_player_position(&self.me.id, pos);
        }
    }

    fn removed(&mut self, reason: KickReason) -> GuestEvent {
        info!("removed from the lobby: {:?}", reason);
        self.reset();
        GuestEvent::Removed(reason)
    }

    // ========================================================================
    // Frame Update
    // ========================================================================

    // Predict one frame of movement and ease the other players. Returns the
    // movement echo for the host, if one is due.
    pub fn tick(&mut self, delta: f32, input: MoveInput) -> Option<GuestMessage> {
        self.smoothing.update(&self.lobby.players, &self.me.id, delta);

        if self.lobby.status != MatchStatus::Playing {
            return None;
        }
        let frozen = self.lobby.player(&self.me.id)?.frozen;

        let echo = self.local.update(input, delta, frozen);
        if !frozen {
            let pos = self.local.position;
            self.lobby.set_player_position(&self.me.id, pos);
        }

        echo.map(|pos| {
            GuestMessage::PlayerMove(GPlayerMove {
                id: self.me.id.clone(),
                pos,
            })
        })
    }
}
