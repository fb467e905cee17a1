use std::{io, net::SocketAddr, time::Duration};

use async_std::net::UdpSocket;
use thiserror::Error;

use crate::packet::MAX_PACKET_SIZE;

/// A thin wrapper around a UDP socket. Unreliable and unordered by itself;
/// the [`crate::engine::Engine`] is what makes delivery reliable and
/// ordered.
pub(crate) struct Socket {
    socket: UdpSocket,
    local_addr: SocketAddr,
}

impl Socket {
    pub(crate) async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        let local_addr = socket.local_addr()?;
        Ok(Self { socket, local_addr })
    }

    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Receives a single datagram, waiting at most `timeout`.
    ///
    /// Returns `Ok(None)` on timeout so the caller can re-check its own
    /// bookkeeping (idle timers, cancellation) between attempts.
    pub(crate) async fn recv(
        &self,
        timeout: Duration,
    ) -> Result<Option<(Vec<u8>, SocketAddr)>, RecvError> {
        let mut buf = [0u8; MAX_PACKET_SIZE];
        match async_std::future::timeout(timeout, self.socket.recv_from(&mut buf)).await {
            Err(_) => Ok(None),
            Ok(Err(err)) => Err(RecvError::Io(err)),
            Ok(Ok((len, source))) => Ok(Some((buf[..len].to_vec(), source))),
        }
    }

    /// Sends `data` to `target`.
    ///
    /// # Panics
    ///
    /// Panics if `data` is larger than [`MAX_PACKET_SIZE`]; the engine must
    /// never hand the Sender a packet that large.
    pub(crate) async fn send(&self, target: SocketAddr, data: &[u8]) -> Result<(), SendError> {
        assert!(
            data.len() <= MAX_PACKET_SIZE,
            "packet of {} bytes exceeds the {} byte limit",
            data.len(),
            MAX_PACKET_SIZE
        );

        let n = self
            .socket
            .send_to(data, target)
            .await
            .map_err(SendError::Io)?;

        if n < data.len() {
            Err(SendError::Partial(n, data.len()))
        } else {
            Ok(())
        }
    }
}

#[derive(Error, Debug)]
pub(crate) enum RecvError {
    #[error("an IO error occurred while receiving")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub(crate) enum SendError {
    #[error("an IO error occurred while sending")]
    Io(io::Error),
    #[error("only {0} of {1} bytes were sent")]
    Partial(usize, usize),
}
