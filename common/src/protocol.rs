#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "bincode")]
use bincode::{Decode, Encode};

use bevy_math::Vec2;

use crate::lobby::Lobby;

// Macro to reduce boilerplate for structs
macro_rules! message {
    ($(#[$meta:meta])* struct $name:ident $body:tt) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        #[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "bincode", derive(Encode, Decode))]
        pub struct $name $body
    };
}

// Same as `message!` for unit-like enums that also need Copy/Eq/Hash
macro_rules! tag {
    ($(#[$meta:meta])* enum $name:ident $body:tt) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "bincode", derive(Encode, Decode))]
        pub enum $name $body
    };
}

// ============================================================================
// Common Data Types
// ============================================================================

// World position in world units (one grid cell is GRID_SIZE units)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance(&self, other: &Self) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    #[must_use]
    pub const fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl From<Vec2> for Position {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

macro_rules! id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "bincode", derive(Encode, Decode))]
        pub struct $name(pub String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id!(
    // Stable player identity, chosen by the player's own peer
    PlayerId
);
id!(EnemyId);
id!(DoorId);
id!(
    // Network address of a peer as known to the transport
    PeerId
);

// ============================================================================
// Players
// ============================================================================

message! {
struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    pub peer_id: PeerId,
    pub color: String,
    pub position: Option<Position>,
    pub frozen: bool,
}
}

message! {
// What a guest tells the host about itself when asking to join.
struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub color: Option<String>,
}
}

// ============================================================================
// Enemies
// ============================================================================

tag! {
enum Archetype {
    Guard,
    Dog,
    Drone,
    Camera,
}
}

tag! {
enum EnemyState {
    Patrolling,
    Chasing,
    Investigating,
    Returning,
    Gone,
}
}

tag! {
// Side a camera looks at: Left faces negative x, Right faces positive x.
enum Facing {
    Left,
    Right,
}
}

message! {
struct Enemy {
    pub id: EnemyId,
    pub archetype: Archetype,
    pub position: Position,
    pub state: EnemyState,
    pub target_player: Option<PlayerId>,
    pub target_position: Option<Position>,
    pub patrol_points: Vec<Position>,
    pub patrol_index: usize,
    pub investigation_timer: f32, // seconds spent at the point of interest
    pub origin_door: Option<DoorId>,
    pub last_alarm_at: Option<f32>, // host clock, seconds
    pub last_synced_at: Option<f32>, // host clock, seconds
    pub facing: Option<Facing>,
}
}

impl Enemy {
    // Enemy patrolling `patrol_points`, starting at the first one
    #[must_use]
    pub fn patrolling(id: impl Into<String>, archetype: Archetype, patrol_points: Vec<Position>) -> Self {
        assert!(!patrol_points.is_empty(), "an enemy needs at least one patrol point");
        Self {
            id: EnemyId::new(id),
            archetype,
            position: patrol_points[0],
            state: EnemyState::Patrolling,
            target_player: None,
            target_position: None,
            patrol_points,
            patrol_index: 0,
            investigation_timer: 0.0,
            origin_door: None,
            last_alarm_at: None,
            last_synced_at: None,
            facing: None,
        }
    }

    #[must_use]
    pub fn current_waypoint(&self) -> Position {
        self.patrol_points[self.patrol_index]
    }

    // Guards spawned by (or redirected to) an alarm despawn once back at their door
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        self.origin_door.is_some()
    }

    #[must_use]
    pub fn alarm_ready(&self, now: f32, cooldown: f32) -> bool {
        self.last_alarm_at.is_none_or(|last| now - last > cooldown)
    }
}

// ============================================================================
// Doors
// ============================================================================

message! {
struct Door {
    pub id: DoorId,
    pub position: Position,
}
}

// ============================================================================
// Match Setup
// ============================================================================

tag! {
enum MatchStatus {
    Idle,
    Lobby,
    Playing,
    Gameover,
}
}

impl Default for MatchStatus {
    fn default() -> Self {
        Self::Idle
    }
}

impl MatchStatus {
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Lobby)
                | (Self::Lobby | Self::Gameover, Self::Playing)
                | (Self::Playing, Self::Gameover)
                | (Self::Playing | Self::Gameover, Self::Lobby)
                | (_, Self::Idle)
        )
    }
}

tag! {
// Difficulty collection picked by the host. Numbered collections are tuned
// for at most that many players.
enum Collection {
    TwoPlayers,
    ThreePlayers,
    FourPlayers,
    FivePlayers,
    SixPlayers,
    SevenPlayers,
    EightPlayers,
    NinePlayers,
    TenPlayers,
    Chillout,
}
}

impl Collection {
    pub const NUMBERED: [Self; 9] = [
        Self::TwoPlayers,
        Self::ThreePlayers,
        Self::FourPlayers,
        Self::FivePlayers,
        Self::SixPlayers,
        Self::SevenPlayers,
        Self::EightPlayers,
        Self::NinePlayers,
        Self::TenPlayers,
    ];

    #[must_use]
    pub const fn capacity(self) -> Option<usize> {
        match self {
            Self::TwoPlayers => Some(2),
            Self::ThreePlayers => Some(3),
            Self::FourPlayers => Some(4),
            Self::FivePlayers => Some(5),
            Self::SixPlayers => Some(6),
            Self::SevenPlayers => Some(7),
            Self::EightPlayers => Some(8),
            Self::NinePlayers => Some(9),
            Self::TenPlayers => Some(10),
            Self::Chillout => None,
        }
    }

    #[must_use]
    pub fn is_selectable(self, roster_size: usize) -> bool {
        self.capacity().is_none_or(|n| roster_size <= n)
    }
}

message! {
// Which archetypes the next match includes
struct SpawnToggles {
    pub guard: bool,
    pub dog: bool,
    pub drone: bool,
    pub camera: bool,
}
}

impl Default for SpawnToggles {
    fn default() -> Self {
        Self {
            guard: true,
            dog: true,
            drone: true,
            camera: true,
        }
    }
}

impl SpawnToggles {
    #[must_use]
    pub const fn includes(&self, archetype: Archetype) -> bool {
        match archetype {
            Archetype::Guard => self.guard,
            Archetype::Dog => self.dog,
            Archetype::Drone => self.drone,
            Archetype::Camera => self.camera,
        }
    }

    pub const fn set(&mut self, archetype: Archetype, enabled: bool) {
        match archetype {
            Archetype::Guard => self.guard = enabled,
            Archetype::Dog => self.dog = enabled,
            Archetype::Drone => self.drone = enabled,
            Archetype::Camera => self.camera = enabled,
        }
    }
}

tag! {
enum KickReason {
    Kicked,
    LobbyFull,
}
}

// ============================================================================
// Guest Messages
// ============================================================================

message! {
// Guest to Host: Request to enter the lobby.
struct GJoinRequest {
    pub player: PlayerSummary,
}
}

message! {
// Guest to Host: Local movement echo.
struct GPlayerMove {
    pub id: PlayerId,
    pub pos: Position,
}
}

message! {
// Guest to Host: Graceful leave notification.
struct GLeave {}
}

// ============================================================================
// Host Messages
// ============================================================================

message! {
// Host to Guest: Full lobby snapshot for a joining guest.
struct HLobbySync {
    pub lobby: Lobby,
}
}

message! {
// Host to Guests: Roster change.
struct HLobbyUpdate {
    pub players: Option<Vec<Player>>,
    pub enemies: Option<Vec<Enemy>>,
}
}

message! {
// Host to all: A player was removed by the host.
struct HKickPlayer {
    pub target: PlayerId,
}
}

message! {
// Host to target: You were removed (or never admitted).
struct HKicked {
    pub reason: KickReason,
}
}

message! {
// Host to Guests: Collection picked.
struct HCollectionSelected {
    pub collection: Collection,
}
}

message! {
// Host to Guests: Spawn toggle for one archetype.
struct HSetSpawn {
    pub archetype: Archetype,
    pub enabled: bool,
}
}

message! {
// Host to Guests: Match started (or restarted), with the fresh world.
struct HGameStart {
    pub lobby: Option<Lobby>,
}
}

message! {
// Host to Guests: Match status change, e.g. playing -> gameover.
struct HGameStatus {
    pub status: MatchStatus,
}
}

message! {
// Host to Guests: A player moved.
struct HPlayerMove {
    pub id: PlayerId,
    pub pos: Position,
}
}

message! {
// Host to Guests: Enemy AI delta.
struct HEnemyMove {
    pub id: EnemyId,
    pub pos: Position,
    pub state: EnemyState,
    pub target_id: Option<PlayerId>,
    pub target_pos: Option<Position>,
    pub investigation_timer: f32,
}
}

impl From<&Enemy> for HEnemyMove {
    fn from(enemy: &Enemy) -> Self {
        Self {
            id: enemy.id.clone(),
            pos: enemy.position,
            state: enemy.state,
            target_id: enemy.target_player.clone(),
            target_pos: enemy.target_position,
            investigation_timer: enemy.investigation_timer,
        }
    }
}

message! {
// Host to Guests: Alarm cue, presentation only.
struct HEnemyAlarm {
    pub pos: Position,
}
}

message! {
// Host to Guests: Freeze or rescue.
struct HPlayerFrozen {
    pub id: PlayerId,
    pub frozen: bool,
}
}

// ============================================================================
// Message Envelopes
// ============================================================================

// All guest to host messages
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
pub enum GuestMessage {
    JoinRequest(GJoinRequest),
    PlayerMove(GPlayerMove),
    Leave(GLeave),
}

// All host to guest messages
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
pub enum HostMessage {
    LobbySync(HLobbySync),
    LobbyUpdate(HLobbyUpdate),
    KickPlayer(HKickPlayer),
    Kicked(HKicked),
    CollectionSelected(HCollectionSelected),
    SetSpawn(HSetSpawn),
    GameStart(HGameStart),
    GameStatus(HGameStatus),
    PlayerMove(HPlayerMove),
    EnemyMove(HEnemyMove),
    EnemyAlarm(HEnemyAlarm),
    PlayerFrozen(HPlayerFrozen),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions_follow_match_lifecycle() {
        assert!(MatchStatus::Idle.can_transition_to(MatchStatus::Lobby));
        assert!(MatchStatus::Lobby.can_transition_to(MatchStatus::Playing));
        assert!(MatchStatus::Playing.can_transition_to(MatchStatus::Gameover));
        assert!(MatchStatus::Gameover.can_transition_to(MatchStatus::Playing));
        assert!(MatchStatus::Gameover.can_transition_to(MatchStatus::Lobby));
        assert!(!MatchStatus::Idle.can_transition_to(MatchStatus::Playing));
        assert!(!MatchStatus::Lobby.can_transition_to(MatchStatus::Gameover));
    }

    #[test]
    fn numbered_collection_needs_roster_within_capacity() {
        assert!(Collection::TwoPlayers.is_selectable(2));
        assert!(!Collection::TwoPlayers.is_selectable(3));
        assert!(Collection::FivePlayers.is_selectable(3));
        assert!(Collection::Chillout.is_selectable(10));
    }

    #[test]
    fn alarm_cooldown_is_strict() {
        let mut drone = Enemy::patrolling("drone-1", Archetype::Drone, vec![Position::new(0.0, 0.0)]);
        assert!(drone.alarm_ready(0.0, 1.0));
        drone.last_alarm_at = Some(2.0);
        assert!(!drone.alarm_ready(3.0, 1.0));
        assert!(drone.alarm_ready(3.01, 1.0));
    }
}
