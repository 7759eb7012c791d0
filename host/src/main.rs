use anyhow::Result;
use clap::Parser;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{info, warn};

use common::{movement::MoveInput, protocol::*};
use guest::{GuestEvent, GuestSession};
use host::{HostCommand, HostLoop, HostSession, LoopbackListener, init_tracing, loopback};

const BOT_FRAME_RATE: u64 = 30;
const BOT_TURN_FRAMES: u64 = 30;
const JOIN_GRACE: Duration = Duration::from_millis(250);
const HOST_TURN_INTERVAL: Duration = Duration::from_millis(500);

// ============================================================================
// CLI Argument Parsing
// ============================================================================

#[derive(Parser)]
#[command(author, version, about = "Stealth match host with wandering bot guests", long_about = None)]
struct Args {
    /// Number of bot guests to connect
    #[arg(short, long, default_value_t = 3)]
    bots: usize,

    /// Difficulty collection: a player count (2-10) or "chillout"
    #[arg(short, long, value_parser = parse_collection)]
    collection: Option<Collection>,

    /// Seconds to run the match for
    #[arg(short, long, default_value_t = 10)]
    duration: u64,

    /// Seed for world generation and bot input
    #[arg(long)]
    seed: Option<u64>,

    /// Disable guards
    #[arg(long, default_value_t = false)]
    no_guard: bool,

    /// Disable dogs
    #[arg(long, default_value_t = false)]
    no_dog: bool,

    /// Disable drones
    #[arg(long, default_value_t = false)]
    no_drone: bool,

    /// Disable cameras
    #[arg(long, default_value_t = false)]
    no_camera: bool,
}

fn parse_collection(arg: &str) -> Result<Collection, String> {
    if arg.eq_ignore_ascii_case("chillout") {
        return Ok(Collection::Chillout);
    }
    let players: usize = arg.parse().map_err(|_| format!("not a collection: {arg}"))?;
    Collection::NUMBERED
        .into_iter()
        .find(|c| c.capacity() == Some(players))
        .ok_or_else(|| format!("no collection for {players} players"))
}

fn random_input(rng: &mut StdRng) -> MoveInput {
    MoveInput {
        up: rng.random_bool(0.3),
        down: rng.random_bool(0.3),
        left: rng.random_bool(0.3),
        right: rng.random_bool(0.3),
    }
}

// ============================================================================
// Bot Guests
// ============================================================================

async fn run_bot(listener: LoopbackListener, index: usize, seed: u64) -> Result<()> {
    let id = PlayerId::new(format!("bot-{index}"));
    let mut link = listener.connect(PeerId::new(format!("peer-{id}")))?;
    let mut guest = GuestSession::new(PlayerSummary {
        id: id.clone(),
        name: format!("Bot {index}"),
        color: None,
    });
    link.send(&guest.join_request())?;

    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64 + 1));
    let frame_duration = Duration::from_nanos(1_000_000_000 / BOT_FRAME_RATE);
    let mut interval = time::interval(frame_duration);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut input = MoveInput::default();
    let mut frame: u64 = 0;
    loop {
        interval.tick().await;

        loop {
            let msg = match link.try_recv() {
                Ok(Some(msg)) => msg,
                Ok(None) => break,
                Err(e) => {
                    info!("{} stopped: {e}", id);
                    return Ok(());
                }
            };
            match guest.handle_message(msg) {
                Some(GuestEvent::Removed(reason)) => {
                    info!("{} was removed: {:?}", id, reason);
                    return Ok(());
                }
                Some(GuestEvent::Alarm(pos)) => info!("{} hears an alarm at ({}, {})", id, pos.x, pos.y),
                Some(event) => info!("{}: {:?}", id, event),
                None => {}
            }
        }

        if frame % BOT_TURN_FRAMES == 0 {
            input = random_input(&mut rng);
        }
        if let Some(msg) = guest.tick(frame_duration.as_secs_f32(), input) {
            link.send(&msg)?;
        }
        frame += 1;
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    info!("seed {}", seed);

    let host = PlayerSummary {
        id: PlayerId::new("host"),
        name: "Host".to_string(),
        color: None,
    };
    let mut session = HostSession::new(&host, PeerId::new("peer-host"), seed);
    for (archetype, disabled) in [
        (Archetype::Guard, args.no_guard),
        (Archetype::Dog, args.no_dog),
        (Archetype::Drone, args.no_drone),
        (Archetype::Camera, args.no_camera),
    ] {
        if disabled {
            session.set_spawn(archetype, false);
        }
    }

    let (listener, channels) = loopback();
    let host_loop = HostLoop::spawn(session, channels);

    let bots: Vec<_> = (0..args.bots)
        .map(|index| tokio::spawn(run_bot(listener.clone(), index, seed)))
        .collect();

    // Let the join requests land before picking a collection
    time::sleep(JOIN_GRACE).await;
    if let Some(collection) = args.collection {
        host_loop.command(HostCommand::SelectCollection(collection));
    }
    host_loop.command(HostCommand::StartMatch);

    let mut rng = StdRng::seed_from_u64(seed);
    let deadline = Instant::now() + Duration::from_secs(args.duration);
    while Instant::now() < deadline {
        host_loop.set_input(random_input(&mut rng));
        time::sleep(HOST_TURN_INTERVAL).await;
    }

    let session = host_loop.stop().await?;
    for bot in bots {
        bot.abort();
    }

    let lobby = session.lobby();
    let frozen = lobby.players.iter().filter(|p| p.frozen).count();
    info!(
        "match ended {:?}: {} players ({} frozen), {} enemies",
        lobby.status,
        lobby.players.len(),
        frozen,
        lobby.enemies.len()
    );
    if lobby.status == MatchStatus::Gameover {
        warn!("the dogs won");
    }
    Ok(())
}
