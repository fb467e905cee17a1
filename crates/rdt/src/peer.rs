//! The Receiver task learns the peer's address from the first packet it
//! sees and shares it with the Sender task through this one-shot, then
//! read-only, slot — rather than via a mutable field the two tasks would
//! otherwise need to coordinate around.

use std::net::SocketAddr;

use async_std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Clone)]
pub(crate) struct PeerSlot(Arc<Mutex<Option<SocketAddr>>>);

impl PeerSlot {
    pub(crate) fn new() -> Self {
        Self(Arc::new(Mutex::new(None)))
    }

    pub(crate) async fn get(&self) -> Option<SocketAddr> {
        *self.0.lock().await
    }

    /// Records `addr` as the peer, or confirms it matches the already
    /// recorded peer.
    ///
    /// A different address once the peer is known is a fatal protocol
    /// error: this transport has no concept of a second peer.
    pub(crate) async fn set(&self, addr: SocketAddr) -> Result<(), UnexpectedPeer> {
        let mut guard = self.0.lock().await;
        match *guard {
            None => {
                *guard = Some(addr);
                Ok(())
            }
            Some(known) if known == addr => Ok(()),
            Some(known) => Err(UnexpectedPeer {
                expected: known,
                got: addr,
            }),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("datagram from unexpected peer {got} (expected {expected})")]
pub(crate) struct UnexpectedPeer {
    pub(crate) expected: SocketAddr,
    pub(crate) got: SocketAddr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_set_is_adopted() {
        async_std::task::block_on(async {
            let slot = PeerSlot::new();
            assert!(slot.get().await.is_none());
            let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
            slot.set(addr).await.unwrap();
            assert_eq!(slot.get().await, Some(addr));
        });
    }

    #[test]
    fn test_matching_repeat_set_is_ok() {
        async_std::task::block_on(async {
            let slot = PeerSlot::new();
            let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
            slot.set(addr).await.unwrap();
            slot.set(addr).await.unwrap();
        });
    }

    #[test]
    fn test_mismatched_set_is_rejected() {
        async_std::task::block_on(async {
            let slot = PeerSlot::new();
            let a: SocketAddr = "127.0.0.1:9000".parse().unwrap();
            let b: SocketAddr = "127.0.0.1:9001".parse().unwrap();
            slot.set(a).await.unwrap();
            assert_eq!(
                slot.set(b).await,
                Err(UnexpectedPeer {
                    expected: a,
                    got: b
                })
            );
        });
    }
}
