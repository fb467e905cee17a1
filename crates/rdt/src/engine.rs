//! The RDT engine: the sliding-window, selective-repeat state machine.
//!
//! This is the only task that touches the send/receive buffers; it owns
//! them exclusively and never shares them with another task.

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use async_std::channel::{Receiver, Sender, TryRecvError, TrySendError};
use tracing::{debug, trace};

use crate::{cancel::StopFlag, config::RdtConfig, packet::Packet, seq::SeqNum};

const IDLE_SLEEP: Duration = Duration::from_millis(1);

/// A single outstanding (unacknowledged) DATA packet.
struct SendSlot {
    packet: Packet,
    last_sent: Instant,
}

pub(crate) struct Engine {
    window: u16,
    modulus: u16,
    timeout: Duration,

    send_buffer: Vec<Option<SendSlot>>,
    resend_list: VecDeque<SeqNum>,
    next_seq: SeqNum,

    receive_buffer: Vec<Option<String>>,
    next_expected: SeqNum,

    from_src: Receiver<String>,
    to_snk: Sender<String>,
    in_queue: Receiver<Packet>,
    out_queue: Sender<Packet>,

    stop: StopFlag,
}

impl Engine {
    pub(crate) fn new(
        config: &RdtConfig,
        from_src: Receiver<String>,
        to_snk: Sender<String>,
        in_queue: Receiver<Packet>,
        out_queue: Sender<Packet>,
        stop: StopFlag,
    ) -> Self {
        let window = config.window();
        let modulus = config.modulus();

        Self {
            window,
            modulus,
            timeout: config.timeout(),
            send_buffer: (0..modulus).map(|_| None).collect(),
            resend_list: VecDeque::new(),
            next_seq: SeqNum::zero(),
            receive_buffer: (0..window).map(|_| None).collect(),
            next_expected: SeqNum::zero(),
            from_src,
            to_snk,
            in_queue,
            out_queue,
            stop,
        }
    }

    /// Runs the engine loop until a stop has been requested and the send
    /// buffer has fully drained.
    pub(crate) async fn run(mut self) {
        debug!("Starting RDT engine...");

        loop {
            let did_work = self.upload_ordered_packets().await
                || self.process_inbound().await
                || self.retransmit_timed_out().await
                || self.admit_new_send().await;

            if !did_work {
                if self.stop.requested() && self.send_buffer_empty() {
                    break;
                }
                async_std::task::sleep(IDLE_SLEEP).await;
            }
        }

        debug!("RDT engine finished.");
    }

    fn send_buffer_empty(&self) -> bool {
        self.resend_list.is_empty()
    }

    /// Action 1 — deliver any receive-buffer run starting at `next_expected`.
    async fn upload_ordered_packets(&mut self) -> bool {
        let slot = self.next_expected.window_slot(self.window);
        if self.receive_buffer[slot].is_none() {
            return false;
        }

        loop {
            let slot = self.next_expected.window_slot(self.window);
            let Some(payload) = self.receive_buffer[slot].clone() else {
                break;
            };

            match self.to_snk.try_send(payload) {
                Ok(()) => {
                    self.receive_buffer[slot] = None;
                    self.next_expected = self.next_expected.incr(self.modulus);
                }
                Err(TrySendError::Full(_)) => break,
                Err(TrySendError::Closed(_)) => break,
            }
        }

        true
    }

    /// Action 2 — process exactly one inbound packet.
    async fn process_inbound(&mut self) -> bool {
        let packet = match self.in_queue.try_recv() {
            Ok(packet) => packet,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return false,
        };

        match packet {
            Packet::Data { seq, payload } => {
                let ack = Packet::Ack { seq };
                let _ = self.out_queue.try_send(ack);

                let d = seq.diff(self.next_expected, self.modulus);
                if d < self.window {
                    let slot = seq.window_slot(self.window);
                    self.receive_buffer[slot] = Some(payload);
                } else {
                    trace!("Dropping out-of-window DATA with seqNum {seq}");
                }
            }
            Packet::Ack { seq } => {
                let idx = seq.get() as usize;
                self.send_buffer[idx] = None;
                if let Some(pos) = self.resend_list.iter().position(|&s| s == seq) {
                    self.resend_list.remove(pos);
                }
            }
        }

        true
    }

    /// Action 3 — retransmit the oldest unacknowledged packet if its timer
    /// has expired.
    async fn retransmit_timed_out(&mut self) -> bool {
        let Some(&seq) = self.resend_list.front() else {
            return false;
        };

        let idx = seq.get() as usize;
        let Some(slot) = self.send_buffer[idx].as_mut() else {
            // Acked between the guard check and here; drop the stale entry.
            self.resend_list.pop_front();
            return true;
        };

        if slot.last_sent.elapsed() <= self.timeout {
            return false;
        }

        let packet = slot.packet.clone();
        slot.last_sent = Instant::now();
        let _ = self.out_queue.try_send(packet);
        self.resend_list.rotate_left(1);

        true
    }

    /// Action 4 — admit one application payload as a new DATA packet.
    async fn admit_new_send(&mut self) -> bool {
        if self.out_queue.is_full() {
            return false;
        }

        if let Some(&head) = self.resend_list.front() {
            if self.next_seq.diff(head, self.modulus) >= self.window.saturating_sub(1) {
                return false;
            }
        }

        let payload = match self.from_src.try_recv() {
            Ok(payload) => payload,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return false,
        };

        let seq = self.next_seq;
        let packet = Packet::Data {
            seq,
            payload,
        };

        let idx = seq.get() as usize;
        self.send_buffer[idx] = Some(SendSlot {
            packet: packet.clone(),
            last_sent: Instant::now(),
        });
        self.resend_list.push_back(seq);

        let _ = self.out_queue.try_send(packet);
        self.next_seq = self.next_seq.incr(self.modulus);

        true
    }
}
