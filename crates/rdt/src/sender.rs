//! The Sender task: the only thing with write access to the socket.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_std::{channel::Receiver, task};
use tracing::{info, trace};

use crate::{
    packet::Packet,
    peer::PeerSlot,
    socket::{SendError, Socket},
};

const PEER_POLL_INTERVAL: Duration = Duration::from_millis(100);
const DEQUEUE_TIMEOUT: Duration = Duration::from_millis(100);
const IDLE_TIMEOUT: Duration = Duration::from_secs(3);

/// Runs the Sender loop.
///
/// `disc_prob` is the independent per-packet probability of silently
/// dropping an outgoing packet, used to exercise retransmission paths in
/// tests; it is never applied on the Receiver side.
pub(crate) async fn run(
    socket: Arc<Socket>,
    peer: PeerSlot,
    out_queue: Receiver<Packet>,
    disc_prob: f64,
) -> Result<(), SendError> {
    info!("Starting RDT sender...");

    let mut last_event: Option<Instant> = None;

    loop {
        let Some(target) = peer.get().await else {
            task::sleep(PEER_POLL_INTERVAL).await;
            continue;
        };

        let received = async_std::future::timeout(DEQUEUE_TIMEOUT, out_queue.recv()).await;
        let packet = match received {
            Err(_) => {
                if last_event.is_some_and(|t| t.elapsed() > IDLE_TIMEOUT) {
                    break;
                }
                continue;
            }
            Ok(Err(_)) => break,
            Ok(Ok(packet)) => packet,
        };
        last_event = Some(Instant::now());

        if fastrand::f64() < disc_prob {
            trace!("Simulated loss of packet with seqNum {}", packet.seq());
            continue;
        }

        let data = packet
            .encode()
            .expect("engine must never admit an oversized payload");
        socket.send(target, &data).await?;
    }

    info!("RDT sender finished.");
    Ok(())
}
