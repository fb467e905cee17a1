//! The Receiver task: the only thing with read access to the socket.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use async_std::channel::{Sender, TrySendError};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    packet::{Packet, PacketError},
    peer::{PeerSlot, UnexpectedPeer},
    socket::{RecvError, Socket},
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const IDLE_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) async fn run(
    socket: Arc<Socket>,
    peer: PeerSlot,
    in_queue: Sender<Packet>,
    discards: Arc<AtomicU64>,
    modulus: u16,
) -> Result<(), ReceiverError> {
    info!("Starting RDT receiver on {}...", socket.local_addr());

    let mut last_event: Option<Instant> = None;

    loop {
        let datagram = socket.recv(POLL_INTERVAL).await?;

        let Some((data, source)) = datagram else {
            if last_event.is_some_and(|t| t.elapsed() > IDLE_TIMEOUT) {
                break;
            }
            continue;
        };

        peer.set(source).await?;
        let packet = Packet::decode(&data)?;
        packet.validate_seq(modulus)?;
        last_event = Some(Instant::now());

        match in_queue.try_send(packet) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                discards.fetch_add(1, Ordering::Relaxed);
                warn!("Inbound queue full, discarding a datagram from {source}");
            }
            Err(TrySendError::Closed(_)) => break,
        }
    }

    info!("RDT receiver finished.");
    Ok(())
}

#[derive(Error, Debug)]
pub enum ReceiverError {
    #[error(transparent)]
    Socket(#[from] RecvError),
    #[error(transparent)]
    UnexpectedPeer(#[from] UnexpectedPeer),
    #[error("received a malformed packet: {0}")]
    Malformed(#[from] PacketError),
}
