use std::collections::HashMap;

use anyhow::Result;
use tokio::{
    sync::{
        mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
        oneshot, watch,
    },
    task::JoinHandle,
    time::{self, Duration, Instant, MissedTickBehavior},
};
use tracing::{info, warn};

use crate::{
    constants::HOST_LOOP_FREQUENCY,
    net::{GuestToHost, HostChannels, HostToGuest, deliver},
    session::HostSession,
};
use common::{movement::MoveInput, protocol::*};

// ============================================================================
// Host Commands
// ============================================================================

// Actions of the host player, applied between ticks
#[derive(Debug, Clone)]
pub enum HostCommand {
    StartMatch,
    ExitToLobby,
    Kick(PlayerId),
    SelectCollection(Collection),
    SetSpawn(Archetype, bool),
}

fn apply_command(session: &mut HostSession, cmd: HostCommand) {
    let result = match cmd {
        HostCommand::StartMatch => session.start_match(),
        HostCommand::ExitToLobby => session.exit_to_lobby(),
        HostCommand::Kick(target) => session.kick(&target),
        HostCommand::SelectCollection(collection) => session.select_collection(collection),
        HostCommand::SetSpawn(archetype, enabled) => {
            session.set_spawn(archetype, enabled);
            Ok(())
        }
    };

    if let Err(e) = result {
        warn!("host command rejected: {e}");
    }
}

// ============================================================================
// Host Loop
// ============================================================================

// A session driven at HOST_LOOP_FREQUENCY on the tokio runtime
pub struct HostLoop {
    input: watch::Sender<MoveInput>,
    commands: UnboundedSender<HostCommand>,
    stop: oneshot::Sender<()>,
    task: JoinHandle<HostSession>,
}

impl HostLoop {
    #[must_use]
    pub fn spawn(session: HostSession, channels: HostChannels) -> Self {
        let (input, input_rx) = watch::channel(MoveInput::default());
        let (commands, commands_rx) = unbounded_channel();
        let (stop, stop_rx) = oneshot::channel();
        let task = tokio::spawn(run_host_loop(session, channels, input_rx, commands_rx, stop_rx));

        Self {
            input,
            commands,
            stop,
            task,
        }
    }

    // Keys held by the host player from now on
    pub fn set_input(&self, input: MoveInput) {
        self.input.send_replace(input);
    }

    pub fn command(&self, cmd: HostCommand) {
        if self.commands.send(cmd).is_err() {
            warn!("host loop is not running");
        }
    }

    // Stop ticking and hand the session back
    pub async fn stop(self) -> Result<HostSession> {
        let _ = self.stop.send(());
        Ok(self.task.await?)
    }
}

async fn run_host_loop(
    mut session: HostSession,
    mut channels: HostChannels,
    input: watch::Receiver<MoveInput>,
    mut commands: UnboundedReceiver<HostCommand>,
    mut stop: oneshot::Receiver<()>,
) -> HostSession {
    let tick_duration = Duration::from_nanos(1_000_000_000 / HOST_LOOP_FREQUENCY);
    let mut interval = time::interval(tick_duration);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut peers: HashMap<PeerId, UnboundedSender<HostToGuest>> = HashMap::new();
    let mut last_tick = Instant::now();
    let mut frame: u64 = 0;

    info!("starting host loop...");
    loop {
        tokio::select! {
            _ = &mut stop => break,
            _ = interval.tick() => {}
        }

        // New links first so their messages find a route back
        while let Ok((peer, to_guest)) = channels.from_accept.try_recv() {
            peers.insert(peer, to_guest);
        }
        while let Ok((peer, event)) = channels.from_guests.try_recv() {
            match event {
                GuestToHost::Message(msg) => session.handle_message(&peer, msg),
                GuestToHost::Disconnected => {
                    peers.remove(&peer);
                    session.disconnect(&peer);
                }
            }
        }
        while let Ok(cmd) = commands.try_recv() {
            apply_command(&mut session, cmd);
        }

        let update_start = Instant::now();
        let delta = update_start.duration_since(last_tick).as_secs_f32();
        last_tick = update_start;

        let keys = *input.borrow();
        let outbound = session.tick(delta, keys);
        deliver(&mut peers, outbound);
        let update_elapsed = update_start.elapsed();

        if update_elapsed > tick_duration {
            warn!(
                "tick {} took {:.2}ms (exceeded {:.2}ms budget)",
                frame,
                update_elapsed.as_secs_f64() * 1000.0,
                tick_duration.as_secs_f64() * 1000.0
            );
        }

        frame += 1;
    }

    info!("host loop stopped after {} ticks", frame);
    session
}
