use std::collections::HashMap;

use anyhow::{Result, anyhow};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, error::TryRecvError, unbounded_channel};
use tracing::{debug, error, trace, warn};

use crate::resources::Outbound;
use common::{codec, protocol::*};

// ============================================================================
// Loopback Transport
// ============================================================================

// Message from a per guest link task to the host for connected guests
#[derive(Debug)]
pub enum GuestToHost {
    Message(GuestMessage),
    Disconnected,
}

// Message from the host to a per guest link task
#[derive(Debug)]
pub enum HostToGuest {
    Send(HostMessage),
    Close,
}

// Host end of the transport, polled between ticks
pub struct HostChannels {
    pub from_accept: UnboundedReceiver<(PeerId, UnboundedSender<HostToGuest>)>,
    pub from_guests: UnboundedReceiver<(PeerId, GuestToHost)>,
}

// Hands out guest links. Frames cross the link as encoded bytes, so
// everything a guest sees went through the wire codec.
#[derive(Clone)]
pub struct LoopbackListener {
    to_host_from_accept: UnboundedSender<(PeerId, UnboundedSender<HostToGuest>)>,
    to_host: UnboundedSender<(PeerId, GuestToHost)>,
}

#[must_use]
pub fn loopback() -> (LoopbackListener, HostChannels) {
    // Channel for sending from the listener to the host
    let (to_host_from_accept, from_accept) = unbounded_channel();
    // Channel for sending from all per guest link tasks to the host
    let (to_host, from_guests) = unbounded_channel();

    (
        LoopbackListener {
            to_host_from_accept,
            to_host,
        },
        HostChannels {
            from_accept,
            from_guests,
        },
    )
}

impl LoopbackListener {
    // Open a link for `peer`. Must be called from within a tokio runtime.
    pub fn connect(&self, peer: PeerId) -> Result<GuestLink> {
        let (to_host_wire, from_guest_wire) = unbounded_channel();
        let (to_guest_wire, from_host_wire) = unbounded_channel();
        // New channel for sending from the host to the new link task
        let (to_guest, from_host) = unbounded_channel();

        self.to_host_from_accept
            .send((peer.clone(), to_guest))
            .map_err(|_| anyhow!("host is not accepting connections"))?;
        debug!("{} connected", peer);

        tokio::spawn(per_guest_link_task(
            peer.clone(),
            from_guest_wire,
            to_guest_wire,
            self.to_host.clone(),
            from_host,
        ));

        Ok(GuestLink {
            peer,
            to_host: to_host_wire,
            from_host: from_host_wire,
        })
    }
}

// ============================================================================
// Per Guest Link Task
// ============================================================================

async fn per_guest_link_task(
    peer: PeerId,
    mut from_guest_wire: UnboundedReceiver<Vec<u8>>,
    to_guest_wire: UnboundedSender<Vec<u8>>,
    to_host: UnboundedSender<(PeerId, GuestToHost)>,
    mut from_host: UnboundedReceiver<HostToGuest>,
) {
    loop {
        tokio::select! {
            frame = from_guest_wire.recv() => {
                if !handle_guest_frame(&peer, frame, &to_host) {
                    break;
                }
            }

            cmd = from_host.recv() => {
                if !handle_host_command(&peer, cmd, &to_guest_wire) {
                    break;
                }
            }
        }
    }

    // Ensure disconnect notification is sent before task exits
    debug!("{} link task exiting", peer);
    let _ = to_host.send((peer, GuestToHost::Disconnected));
}

fn handle_guest_frame(
    peer: &PeerId,
    frame: Option<Vec<u8>>,
    to_host: &UnboundedSender<(PeerId, GuestToHost)>,
) -> bool {
    let Some(frame) = frame else {
        debug!("{} closed the link", peer);
        return false;
    };

    match codec::decode::<GuestMessage>(&frame) {
        Ok(msg) => {
            trace!("received from {}: {:?}", peer, msg);
            to_host
                .send((peer.clone(), GuestToHost::Message(msg)))
                .map_err(|e| error!("error sending to host task: {e}"))
                .is_ok()
        }
        Err(e) => {
            // A bad frame does not end the session
            warn!("dropping malformed frame from {}: {e}", peer);
            true
        }
    }
}

fn handle_host_command(peer: &PeerId, cmd: Option<HostToGuest>, to_guest_wire: &UnboundedSender<Vec<u8>>) -> bool {
    match cmd {
        Some(HostToGuest::Send(msg)) => {
            trace!("sending to {}: {:?}", peer, msg);
            match codec::encode(&msg) {
                Ok(frame) => to_guest_wire
                    .send(frame)
                    .map_err(|_| debug!("{} is gone", peer))
                    .is_ok(),
                Err(e) => {
                    warn!("failed to encode message for {}: {e}", peer);
                    true
                }
            }
        }
        Some(HostToGuest::Close) => {
            debug!("closing link to {}", peer);
            false
        }
        None => {
            debug!("host channel closed for {}", peer);
            false
        }
    }
}

// ============================================================================
// Guest Link
// ============================================================================

// Guest end of a loopback link
pub struct GuestLink {
    pub peer: PeerId,
    to_host: UnboundedSender<Vec<u8>>,
    from_host: UnboundedReceiver<Vec<u8>>,
}

impl GuestLink {
    pub fn send(&self, msg: &GuestMessage) -> Result<()> {
        let frame = codec::encode(msg)?;
        self.to_host
            .send(frame)
            .map_err(|_| anyhow!("link to host is closed"))
    }

    // Wait for the next message; None once the host closed the link
    pub async fn recv(&mut self) -> Result<Option<HostMessage>> {
        match self.from_host.recv().await {
            Some(frame) => Ok(Some(codec::decode(&frame)?)),
            None => Ok(None),
        }
    }

    // Next pending message, if any. Errors once the link is closed and drained.
    pub fn try_recv(&mut self) -> Result<Option<HostMessage>> {
        match self.from_host.try_recv() {
            Ok(frame) => Ok(Some(codec::decode(&frame)?)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(anyhow!("link to host is closed")),
        }
    }

    // Inject raw bytes, bypassing the codec
    pub fn send_raw(&self, frame: Vec<u8>) -> Result<()> {
        self.to_host
            .send(frame)
            .map_err(|_| anyhow!("link to host is closed"))
    }
}

// ============================================================================
// Delivery
// ============================================================================

// Route a tick's output to the connected guests. Close drops the peer, so
// nothing after it in the same batch reaches that peer.
pub fn deliver(peers: &mut HashMap<PeerId, UnboundedSender<HostToGuest>>, outbound: Vec<Outbound>) {
    for out in outbound {
        if let Outbound::Close(peer) = &out {
            if let Some(to_guest) = peers.remove(peer) {
                let _ = to_guest.send(HostToGuest::Close);
            }
            continue;
        }

        let Some(msg) = out.message() else {
            continue;
        };
        for (peer, to_guest) in peers.iter() {
            if out.reaches(peer) && to_guest.send(HostToGuest::Send(msg.clone())).is_err() {
                debug!("{} link already gone", peer);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deliver_routes_by_target_and_closes() {
        let mut peers = HashMap::new();
        let (to_a, mut from_a) = unbounded_channel();
        let (to_b, mut from_b) = unbounded_channel();
        peers.insert(PeerId::new("a"), to_a);
        peers.insert(PeerId::new("b"), to_b);

        let msg = HostMessage::EnemyAlarm(HEnemyAlarm {
            pos: Position::new(96.0, 96.0),
        });
        deliver(
            &mut peers,
            vec![
                Outbound::AllExcept(PeerId::new("a"), msg.clone()),
                Outbound::To(PeerId::new("a"), msg.clone()),
                Outbound::Close(PeerId::new("a")),
                Outbound::Broadcast(msg),
            ],
        );

        assert!(matches!(from_a.try_recv(), Ok(HostToGuest::Send(_))));
        assert!(matches!(from_a.try_recv(), Ok(HostToGuest::Close)));
        assert!(from_a.try_recv().is_err());
        assert!(matches!(from_b.try_recv(), Ok(HostToGuest::Send(_))));
        assert!(matches!(from_b.try_recv(), Ok(HostToGuest::Send(_))));
        assert!(from_b.try_recv().is_err());
        assert!(!peers.contains_key(&PeerId::new("a")));
    }

    #[tokio::test]
    async fn malformed_frame_is_dropped_without_disconnect() {
        let (listener, mut channels) = loopback();
        let link = listener.connect(PeerId::new("p1")).expect("connect");
        let _registered = channels.from_accept.recv().await.expect("registered");

        link.send_raw(vec![0xff, 0xff, 0xff]).expect("raw send");
        link.send(&GuestMessage::Leave(GLeave {})).expect("send");

        let (peer, event) = channels.from_guests.recv().await.expect("event");
        assert_eq!(peer, PeerId::new("p1"));
        assert!(matches!(event, GuestToHost::Message(GuestMessage::Leave(_))));

        drop(link);
        let (_, event) = channels.from_guests.recv().await.expect("event");
        assert!(matches!(event, GuestToHost::Disconnected));
    }
}
