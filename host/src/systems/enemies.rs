use bevy_ecs::prelude::*;
use bevy_time::Time;
use tracing::{debug, info, warn};

use crate::{
    constants::{ALARM_COOLDOWN, ENEMY_SYNC_INTERVAL},
    resources::{AiState, Outbox},
    systems::{collision::apply_enemy_contacts, network::enemies_update},
};
use common::{
    alarm::{AlarmOutcome, trigger_alarm},
    archetypes::{LostTarget, SightingReaction},
    behaviors::*,
    collision::{EnemyContact, check_enemy_collisions},
    detection::detect,
    lobby::Lobby,
    protocol::*,
};

// ============================================================================
// AI Context
// ============================================================================

// Everything one AI pass needs besides the world itself
pub struct AiContext<'a> {
    pub now: f32,   // host clock, seconds
    pub delta: f32, // seconds
    pub outbox: &'a mut Outbox,
    pub state: &'a mut AiState,
}

// What happened during one AI pass
#[derive(Debug, Default)]
pub struct AiReport {
    pub contacts: Vec<EnemyContact>,
    pub spawned: Vec<EnemyId>,
}

// ============================================================================
// Enemy AI Coordinator
// ============================================================================

// Advance every enemy by one tick: detection, behavior, collision, sync.
// Only enemies present at the start of the pass are updated; guards spawned by
// an alarm join on the next tick. Detection and collision look at the players
// as they were when the pass started.
pub fn update_enemies(lobby: &mut Lobby, ctx: &mut AiContext) -> AiReport {
    let players = lobby.players.clone();
    let count = lobby.enemies.len();
    let mut report = AiReport::default();

    for index in 0..count {
        let before = lobby.enemies[index].clone();
        if before.state == EnemyState::Gone {
            continue;
        }

        let mut enemy = before.clone();
        let mut force_sync = false;

        if matches!(
            enemy.state,
            EnemyState::Patrolling | EnemyState::Returning | EnemyState::Investigating
        ) {
            force_sync |= react_to_sightings(lobby, ctx, &players, &mut enemy, &mut report);
        }

        force_sync |= run_behavior(&lobby.doors, &players, ctx.delta, &mut enemy);

        if enemy.state != EnemyState::Gone {
            let contacts = check_enemy_collisions(&enemy, &players);
            if contacts.iter().any(|c| c.should_freeze) {
                release_after_capture(lobby, &mut enemy);
                force_sync = true;
            }
            report.contacts.extend(contacts);
        }

        let changed = enemy.state != before.state || enemy.target_player != before.target_player;
        let due = enemy
            .last_synced_at
            .is_none_or(|t| ctx.now - t > ENEMY_SYNC_INTERVAL);
        if enemy.state != EnemyState::Gone && (force_sync || changed || due) {
            enemy.last_synced_at = Some(ctx.now);
            ctx.outbox.broadcast_to_all(HostMessage::EnemyMove((&enemy).into()));
        }

        lobby.enemies[index] = enemy;
    }

    report
}

// Detection phase. Returns true when the enemy's state or target changed in a
// way guests must hear about right away.
fn react_to_sightings(
    lobby: &mut Lobby,
    ctx: &mut AiContext,
    players: &[Player],
    enemy: &mut Enemy,
    report: &mut AiReport,
) -> bool {
    let profile = enemy.archetype.profile();
    let Some(sighting) = detect(enemy, players, profile.detection_range) else {
        return false;
    };
    let spotted = sighting.player;

    // A sighting keeps the enemy interested
    enemy.investigation_timer = 0.0;

    match profile.reaction {
        SightingReaction::Pursue => start_chase(enemy, &spotted.id),
        SightingReaction::RaiseAlarm => {
            if enemy.alarm_ready(ctx.now, ALARM_COOLDOWN) {
                enemy.last_alarm_at = Some(ctx.now);
                raise_alarm(lobby, ctx, &enemy.id, spotted, report);
            }

            if enemy.archetype.is_stationary() {
                // Cameras turn toward what they saw
                enemy.target_position = spotted.position;
                if enemy.state == EnemyState::Investigating {
                    false
                } else {
                    enemy.state = EnemyState::Investigating;
                    true
                }
            } else {
                start_chase(enemy, &spotted.id)
            }
        }
    }
}

fn start_chase(enemy: &mut Enemy, target: &PlayerId) -> bool {
    if enemy.state == EnemyState::Chasing {
        return false;
    }
    enemy.state = EnemyState::Chasing;
    enemy.target_player = Some(target.clone());
    enemy.target_position = None;
    true
}

fn raise_alarm(lobby: &mut Lobby, ctx: &mut AiContext, sensor: &EnemyId, spotted: &Player, report: &mut AiReport) {
    let outcome = match trigger_alarm(spotted, &lobby.doors, &mut lobby.enemies, ctx.state.next_spawn_seq) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("{} cannot raise an alarm: {e}", sensor);
            return;
        }
    };

    ctx.outbox.broadcast_to_all(HostMessage::EnemyAlarm(HEnemyAlarm { pos: outcome.alarm() }));

    match outcome {
        AlarmOutcome::Redirected { alarm, guard } => {
            info!("{} raised an alarm at {:?}, {} responds", sensor, alarm, guard);
            if let Some(responder) = lobby.enemy_mut(&guard) {
                responder.last_synced_at = Some(ctx.now);
                ctx.outbox.broadcast_to_all(HostMessage::EnemyMove((&*responder).into()));
            }
        }
        AlarmOutcome::Spawned { alarm, guard } => {
            info!("{} raised an alarm at {:?}, {} dispatched", sensor, alarm, guard.id);
            ctx.state.next_spawn_seq += 1;
            report.spawned.push(guard.id.clone());
            lobby.enemies.push(guard);
        }
    }
}

// Behavior phase. Returns true on a transition guests must hear about.
fn run_behavior(doors: &[Door], players: &[Player], delta: f32, enemy: &mut Enemy) -> bool {
    match enemy.state {
        EnemyState::Chasing => {
            let target = enemy
                .target_player
                .as_ref()
                .and_then(|id| players.iter().find(|p| &p.id == id));
            match chase_step(enemy, target, delta) {
                ChaseStep::Moved(pos) => {
                    enemy.position = pos;
                    false
                }
                ChaseStep::Lost => {
                    lose_target(enemy);
                    true
                }
            }
        }
        EnemyState::Investigating => {
            let step = investigate_step(enemy, doors, delta);
            enemy.position = step.position;
            enemy.investigation_timer = step.timer;
            match step.outcome {
                InvestigateOutcome::Continue => false,
                InvestigateOutcome::Return(destination) => {
                    if destination.is_none() {
                        debug!("{} has nowhere specific to return to", enemy.id);
                    }
                    enemy.state = EnemyState::Returning;
                    enemy.target_position = destination;
                    enemy.investigation_timer = 0.0;
                    true
                }
                InvestigateOutcome::Resume => {
                    enemy.state = EnemyState::Patrolling;
                    enemy.target_position = None;
                    enemy.investigation_timer = 0.0;
                    true
                }
            }
        }
        EnemyState::Returning => match return_step(enemy, delta) {
            ReturnStep::Moving(pos) => {
                enemy.position = pos;
                false
            }
            ReturnStep::Arrived { despawn: true } => {
                info!("{} left through its door", enemy.id);
                enemy.state = EnemyState::Gone;
                true
            }
            ReturnStep::Arrived { despawn: false } => {
                enemy.state = EnemyState::Patrolling;
                enemy.target_position = None;
                true
            }
        },
        EnemyState::Patrolling => {
            let step = patrol_step(enemy, delta);
            enemy.position = step.position;
            if let Some(next) = step.next_index {
                enemy.patrol_index = next;
            }
            false
        }
        EnemyState::Gone => false,
    }
}

fn lose_target(enemy: &mut Enemy) {
    enemy.target_player = None;
    enemy.investigation_timer = 0.0;
    match enemy.archetype.profile().lost_target {
        LostTarget::Pause => {
            enemy.state = EnemyState::Investigating;
            enemy.target_position = Some(enemy.position);
        }
        LostTarget::Return => {
            enemy.state = EnemyState::Returning;
            enemy.target_position = Some(enemy.current_waypoint());
        }
    }
}

// A guard lets go of the player it just froze. Guards that came through a
// door go back out; the rest resume their route.
fn release_after_capture(lobby: &Lobby, enemy: &mut Enemy) {
    enemy.target_player = None;
    enemy.investigation_timer = 0.0;

    if let Some(door_id) = &enemy.origin_door {
        enemy.state = EnemyState::Returning;
        enemy.target_position = lobby.door(door_id).map(|d| d.position);
    } else {
        enemy.state = EnemyState::Patrolling;
        enemy.target_position = None;
    }
}

// ============================================================================
// Enemy Systems
// ============================================================================

pub fn enemies_ai_system(
    time: Res<Time>,
    mut lobby: ResMut<Lobby>,
    mut outbox: ResMut<Outbox>,
    mut ai: ResMut<AiState>,
) {
    if lobby.status != MatchStatus::Playing {
        return;
    }

    let mut ctx = AiContext {
        now: time.elapsed_secs(),
        delta: time.delta_secs(),
        outbox: &mut outbox,
        state: &mut ai,
    };
    let report = update_enemies(&mut lobby, &mut ctx);
    if !report.spawned.is_empty() {
        ai.roster_changed = true;
    }

    apply_enemy_contacts(&mut lobby, &mut outbox, &report.contacts);
}

// Drop enemies that left the map and tell guests about any roster change
pub fn enemies_cleanup_system(mut lobby: ResMut<Lobby>, mut outbox: ResMut<Outbox>, mut ai: ResMut<AiState>) {
    let removed = lobby.remove_gone_enemies();
    if removed > 0 || ai.roster_changed {
        debug!("enemy roster changed ({} removed)", removed);
        ai.roster_changed = false;
        outbox.broadcast_to_all(enemies_update(&lobby));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::Outbound;
    use bevy_ecs::system::RunSystemOnce;
    use common::spawning::initialize_doors;

    fn lobby_with(enemies: Vec<Enemy>, players: Vec<Player>) -> Lobby {
        Lobby {
            players,
            enemies,
            doors: initialize_doors(),
            status: MatchStatus::Playing,
            ..Lobby::default()
        }
    }

    fn player(id: &str, x: f32, y: f32) -> Player {
        Player {
            id: PlayerId::new(id),
            name: id.to_string(),
            is_host: false,
            peer_id: PeerId::new(id),
            color: String::new(),
            position: Some(Position::new(x, y)),
            frozen: false,
        }
    }

    fn run(lobby: &mut Lobby, state: &mut AiState, now: f32, delta: f32) -> (AiReport, Vec<Outbound>) {
        let mut outbox = Outbox::default();
        let report = update_enemies(
            lobby,
            &mut AiContext {
                now,
                delta,
                outbox: &mut outbox,
                state,
            },
        );
        (report, outbox.drain())
    }

    fn enemy_moves(sent: &[Outbound]) -> Vec<&HEnemyMove> {
        sent.iter()
            .filter_map(|o| match o.message() {
                Some(HostMessage::EnemyMove(mv)) => Some(mv),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn guard_spots_and_chases() {
        let guard = Enemy::patrolling(
            "guard-1",
            Archetype::Guard,
            vec![Position::new(160.0, 480.0), Position::new(800.0, 480.0)],
        );
        let mut lobby = lobby_with(vec![guard], vec![player("p1", 250.0, 480.0)]);
        let mut state = AiState::default();

        let (_, sent) = run(&mut lobby, &mut state, 1.0, 0.1);

        let guard = &lobby.enemies[0];
        assert_eq!(guard.state, EnemyState::Chasing);
        assert_eq!(guard.target_player, Some(PlayerId::new("p1")));
        assert!((guard.position.x - 176.0).abs() < 1e-3);
        assert_eq!(enemy_moves(&sent).len(), 1);
    }

    #[test]
    fn gone_enemies_are_skipped() {
        let mut gone = Enemy::patrolling("spawned-guard-1", Archetype::Guard, vec![Position::new(96.0, 96.0)]);
        gone.state = EnemyState::Gone;
        let mut lobby = lobby_with(vec![gone.clone()], vec![player("p1", 100.0, 100.0)]);
        let mut state = AiState::default();

        let (report, sent) = run(&mut lobby, &mut state, 1.0, 0.1);
        assert!(sent.is_empty());
        assert!(report.contacts.is_empty());
        assert_eq!(lobby.enemies[0], gone);
    }

    #[test]
    fn drone_alarm_spawns_one_guard_and_respects_cooldown() {
        let drone = Enemy::patrolling("drone-1", Archetype::Drone, vec![Position::new(300.0, 300.0)]);
        let mut lobby = lobby_with(vec![drone], vec![player("p1", 330.0, 300.0)]);
        let mut state = AiState::default();

        let (report, sent) = run(&mut lobby, &mut state, 5.0, 0.016);
        assert_eq!(report.spawned, vec![EnemyId::new("spawned-guard-1")]);
        assert_eq!(lobby.enemies.len(), 2);
        assert_eq!(lobby.enemies[0].state, EnemyState::Chasing);
        assert_eq!(lobby.enemies[0].last_alarm_at, Some(5.0));
        assert!(
            sent.iter()
                .any(|o| matches!(o.message(), Some(HostMessage::EnemyAlarm(a)) if a.pos == Position::new(352.0, 288.0)))
        );

        // The spawned guard only moves from the next tick on
        let spawned = lobby.enemies[1].clone();
        assert_eq!(spawned.position, Position::new(96.0, 96.0));

        // Paused drone sees the player again within the cooldown: no second alarm
        lobby.enemies[0].state = EnemyState::Investigating;
        let (report, sent) = run(&mut lobby, &mut state, 5.5, 0.016);
        assert!(report.spawned.is_empty());
        assert!(!sent.iter().any(|o| matches!(o.message(), Some(HostMessage::EnemyAlarm(_)))));
        assert_eq!(lobby.enemies.len(), 2);
        assert_ne!(lobby.enemies[1].position, spawned.position);
    }

    #[test]
    fn alarm_redirects_a_patrolling_guard_immediately() {
        let camera = {
            let mut c = Enemy::patrolling("camera-1", Archetype::Camera, vec![Position::new(288.0, 288.0)]);
            c.facing = Some(Facing::Right);
            c
        };
        let guard = Enemy::patrolling(
            "guard-1",
            Archetype::Guard,
            vec![Position::new(800.0, 800.0), Position::new(900.0, 800.0)],
        );
        let mut lobby = lobby_with(vec![camera, guard], vec![player("p1", 350.0, 290.0)]);
        let mut state = AiState::default();

        let (report, sent) = run(&mut lobby, &mut state, 2.0, 0.016);
        assert!(report.spawned.is_empty());
        assert_eq!(lobby.enemies.len(), 2);
        assert_eq!(lobby.enemies[0].state, EnemyState::Investigating);
        assert_eq!(lobby.enemies[0].target_position, Some(Position::new(350.0, 290.0)));
        assert_eq!(lobby.enemies[1].state, EnemyState::Investigating);
        assert_eq!(lobby.enemies[1].origin_door, Some(DoorId::new("door-1")));
        assert!(enemy_moves(&sent).iter().any(|mv| mv.id == EnemyId::new("guard-1")));
    }

    #[test]
    fn alarm_without_doors_is_skipped() {
        let drone = Enemy::patrolling("drone-1", Archetype::Drone, vec![Position::new(300.0, 300.0)]);
        let mut lobby = lobby_with(vec![drone], vec![player("p1", 330.0, 300.0)]);
        lobby.doors.clear();
        let mut state = AiState::default();

        let (report, sent) = run(&mut lobby, &mut state, 5.0, 0.016);
        assert!(report.spawned.is_empty());
        assert_eq!(lobby.enemies.len(), 1);
        assert_eq!(lobby.enemies[0].state, EnemyState::Chasing);
        assert!(!sent.iter().any(|o| matches!(o.message(), Some(HostMessage::EnemyAlarm(_)))));
    }

    #[test]
    fn spawned_guard_marks_the_roster_changed() {
        let drone = Enemy::patrolling("drone-1", Archetype::Drone, vec![Position::new(300.0, 300.0)]);
        let mut world = World::new();
        world.insert_resource(lobby_with(vec![drone], vec![player("p1", 330.0, 300.0)]));
        world.insert_resource(Time::<()>::default());
        world.insert_resource(Outbox::default());
        world.insert_resource(AiState::default());

        world.run_system_once(enemies_ai_system).expect("system runs");
        assert!(world.resource::<AiState>().roster_changed);

        world.run_system_once(enemies_cleanup_system).expect("system runs");
        assert!(!world.resource::<AiState>().roster_changed);
        let sent = world.resource_mut::<Outbox>().drain();
        assert!(sent.iter().any(|o| matches!(
            o.message(),
            Some(HostMessage::LobbyUpdate(HLobbyUpdate { enemies: Some(enemies), .. })) if enemies.len() == 2
        )));
    }

    #[test]
    fn sync_is_throttled_between_transitions() {
        let guard = Enemy::patrolling(
            "guard-1",
            Archetype::Guard,
            vec![Position::new(100.0, 900.0), Position::new(900.0, 900.0)],
        );
        let mut lobby = lobby_with(vec![guard], vec![]);
        lobby.enemies[0].patrol_index = 1;
        let mut state = AiState::default();

        let (_, sent) = run(&mut lobby, &mut state, 1.0, 0.016);
        assert_eq!(enemy_moves(&sent).len(), 1);
        let (_, sent) = run(&mut lobby, &mut state, 1.016, 0.016);
        assert!(enemy_moves(&sent).is_empty());
        let (_, sent) = run(&mut lobby, &mut state, 1.05, 0.016);
        assert_eq!(enemy_moves(&sent).len(), 1);
    }

    #[test]
    fn capturing_guard_lets_go() {
        let mut guard = Enemy::patrolling(
            "guard-1",
            Archetype::Guard,
            vec![Position::new(400.0, 400.0), Position::new(800.0, 400.0)],
        );
        guard.state = EnemyState::Chasing;
        guard.target_player = Some(PlayerId::new("p1"));
        let mut lobby = lobby_with(vec![guard], vec![player("p1", 420.0, 400.0)]);
        let mut state = AiState::default();

        let (report, _) = run(&mut lobby, &mut state, 1.0, 0.016);
        assert_eq!(report.contacts.len(), 1);
        assert!(report.contacts[0].should_freeze);
        assert_eq!(lobby.enemies[0].state, EnemyState::Patrolling);
        assert_eq!(lobby.enemies[0].target_player, None);
    }

    #[test]
    fn transient_guard_heads_home_after_capture() {
        let mut guard = Enemy::patrolling("spawned-guard-1", Archetype::Guard, vec![Position::new(928.0, 96.0)]);
        guard.position = Position::new(300.0, 300.0);
        guard.state = EnemyState::Chasing;
        guard.target_player = Some(PlayerId::new("p1"));
        guard.origin_door = Some(DoorId::new("door-2"));
        let mut lobby = lobby_with(vec![guard], vec![player("p1", 320.0, 300.0)]);
        let mut state = AiState::default();

        let (report, _) = run(&mut lobby, &mut state, 1.0, 0.016);
        assert!(report.contacts[0].should_freeze);
        assert_eq!(lobby.enemies[0].state, EnemyState::Returning);
        assert_eq!(lobby.enemies[0].target_position, Some(Position::new(928.0, 96.0)));
    }

    #[test]
    fn lost_chase_falls_back_per_archetype() {
        let mut drone = Enemy::patrolling("drone-1", Archetype::Drone, vec![Position::new(100.0, 600.0)]);
        drone.state = EnemyState::Chasing;
        drone.target_player = Some(PlayerId::new("gone-player"));
        drone.position = Position::new(150.0, 600.0);
        let mut dog = Enemy::patrolling(
            "dog-1",
            Archetype::Dog,
            vec![Position::new(100.0, 800.0), Position::new(700.0, 800.0)],
        );
        dog.state = EnemyState::Chasing;
        dog.target_player = Some(PlayerId::new("gone-player"));
        dog.patrol_index = 1;

        let mut lobby = lobby_with(vec![drone, dog], vec![]);
        let mut state = AiState::default();
        run(&mut lobby, &mut state, 1.0, 0.016);

        assert_eq!(lobby.enemies[0].state, EnemyState::Investigating);
        assert_eq!(lobby.enemies[0].target_position, Some(Position::new(150.0, 600.0)));
        assert_eq!(lobby.enemies[1].state, EnemyState::Returning);
        assert_eq!(lobby.enemies[1].target_position, Some(Position::new(700.0, 800.0)));
    }
}
