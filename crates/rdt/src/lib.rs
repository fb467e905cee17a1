//! A reliable, ordered, selective-repeat data transport over UDP.
//!
//! [`Rdt::bind`] opens a socket and spawns the three tasks that make up one
//! endpoint: a [`receiver`] task with exclusive read access to the socket, a
//! [`sender`] task with exclusive write access, and an [`engine`] task that
//! owns the sliding-window state machine and is the only thing that ever
//! touches it. The three communicate exclusively through bounded queues.

mod cancel;
mod config;
mod engine;
mod packet;
mod peer;
mod receiver;
mod seq;
mod sender;
mod socket;

use std::{
    io,
    net::SocketAddr,
    sync::{atomic::AtomicU64, Arc},
};

use async_std::{
    channel::{bounded, Receiver, Sender},
    task::{self, JoinHandle},
};
use tracing::{error, info};

pub use config::RdtConfig;
pub use packet::{MAX_PACKET_SIZE, MAX_PAYLOAD};

use cancel::StopFlag;
use peer::PeerSlot;
use socket::Socket;

/// Capacity shared by all four queues connecting the application to the
/// substrate and the substrate to the engine.
const QUEUE_CAPACITY: usize = 1000;

/// A single RDT endpoint.
///
/// Cloning is not supported: an [`Rdt`] owns the application-facing ends of
/// the `fromSrc`/`toSnk` queues and the handles of the tasks it spawned.
pub struct Rdt {
    from_src: Sender<String>,
    to_snk: Receiver<String>,
    stop: StopFlag,
    discards: Arc<AtomicU64>,
    local_addr: SocketAddr,

    receiver_task: JoinHandle<()>,
    sender_task: JoinHandle<()>,
    engine_task: JoinHandle<()>,
}

impl Rdt {
    /// Binds a UDP socket at `local` and starts the Receiver, Sender and
    /// engine tasks. The endpoint is immediately usable; there is no
    /// separate deferred-start phase (see [`Rdt::start`]).
    pub async fn bind(local: SocketAddr, config: RdtConfig) -> io::Result<Self> {
        let socket = Arc::new(Socket::bind(local).await?);
        let local_addr = socket.local_addr();
        info!("RDT endpoint bound to {local_addr}");

        let peer = PeerSlot::new();
        if let Some(addr) = config.peer() {
            peer.set(addr)
                .await
                .expect("peer slot is fresh, cannot conflict");
        }

        let (from_src_tx, from_src_rx) = bounded(QUEUE_CAPACITY);
        let (to_snk_tx, to_snk_rx) = bounded(QUEUE_CAPACITY);
        let (in_queue_tx, in_queue_rx) = bounded(QUEUE_CAPACITY);
        let (out_queue_tx, out_queue_rx) = bounded(QUEUE_CAPACITY);

        let stop = StopFlag::new();
        let discards = Arc::new(AtomicU64::new(0));

        let receiver_task = task::spawn({
            let socket = Arc::clone(&socket);
            let peer = peer.clone();
            let discards = Arc::clone(&discards);
            let modulus = config.modulus();
            async move {
                if let Err(error) =
                    receiver::run(socket, peer, in_queue_tx, discards, modulus).await
                {
                    error!("RDT receiver aborted: {error}");
                }
            }
        });

        let sender_task = task::spawn({
            let socket = Arc::clone(&socket);
            let peer = peer.clone();
            let disc_prob = config.disc_prob();
            async move {
                if let Err(error) = sender::run(socket, peer, out_queue_rx, disc_prob).await {
                    error!("RDT sender aborted: {error}");
                }
            }
        });

        let engine_task = task::spawn({
            let stop = stop.clone();
            let engine = engine::Engine::new(
                &config,
                from_src_rx,
                to_snk_tx,
                in_queue_rx,
                out_queue_tx,
                stop,
            );
            engine.run()
        });

        Ok(Self {
            from_src: from_src_tx,
            to_snk: to_snk_rx,
            stop,
            discards,
            local_addr,
            receiver_task,
            sender_task,
            engine_task,
        })
    }

    /// The local address this endpoint is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// A no-op: [`Rdt::bind`] already starts every task. Kept for interface
    /// symmetry with [`Rdt::stop`].
    pub fn start(&self) {}

    /// Enqueues a payload for delivery. Blocks while `fromSrc` is full.
    pub async fn send(&self, payload: String) {
        // The channel is never closed while `self` is alive, so the send
        // side can't fail.
        let _ = self.from_src.send(payload).await;
    }

    /// True iff `fromSrc` has remaining capacity.
    pub fn ready(&self) -> bool {
        !self.from_src.is_full()
    }

    /// Blocks until a payload is available and returns it, in order.
    ///
    /// Returns `None` once the engine has stopped and every delivered
    /// payload has been drained.
    pub async fn receive(&self) -> Option<String> {
        self.to_snk.recv().await.ok()
    }

    /// True iff at least one payload is ready to be received without
    /// blocking.
    pub fn incoming(&self) -> bool {
        !self.to_snk.is_empty()
    }

    /// Number of inbound datagrams dropped because `inQueue` was full.
    pub fn discarded(&self) -> u64 {
        self.discards.load(std::sync::atomic::Ordering::Relaxed)
    }

    /// Requests the engine to stop, then waits for all three tasks to
    /// finish.
    ///
    /// The engine drains its send buffer (retransmitting as needed) before
    /// actually exiting, so this can take a while under loss.
    pub async fn stop(self) {
        self.stop.request();
        self.engine_task.await;
        self.sender_task.await;
        self.receiver_task.await;
    }
}
