use std::{net::SocketAddr, time::Duration};

use crate::seq::MAX_WINDOW;

/// Constructor parameters of an [`crate::Rdt`] endpoint.
///
/// Validating at construction (clamping `window` and `disc_prob` here) keeps
/// the hot path free of bounds assertions, the same division of labor the
/// teacher repo's package builders use.
#[derive(Clone, Debug)]
pub struct RdtConfig {
    window: u16,
    timeout: Duration,
    disc_prob: f64,
    peer: Option<SocketAddr>,
}

impl RdtConfig {
    /// Creates a configuration with the given window size and retransmission
    /// timeout. `window` is clamped to `[1, MAX_WINDOW]`.
    pub fn new(window: u16, timeout: Duration) -> Self {
        Self {
            window: window.clamp(1, MAX_WINDOW),
            timeout,
            disc_prob: 0.0,
            peer: None,
        }
    }

    /// Sets the Sender-side simulated packet loss probability. Clamped to
    /// `[0, 1]`.
    pub fn with_disc_prob(mut self, disc_prob: f64) -> Self {
        self.disc_prob = disc_prob.clamp(0.0, 1.0);
        self
    }

    /// Pins the peer address up front instead of learning it from the first
    /// received packet.
    pub fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn window(&self) -> u16 {
        self.window
    }

    /// Sequence-number modulus, `2 * window`.
    pub fn modulus(&self) -> u16 {
        self.window * 2
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn disc_prob(&self) -> f64 {
        self.disc_prob
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_clamped() {
        let config = RdtConfig::new(u16::MAX, Duration::from_secs(1));
        assert_eq!(config.window(), MAX_WINDOW);
        assert_eq!(config.modulus(), MAX_WINDOW * 2);

        let config = RdtConfig::new(0, Duration::from_secs(1));
        assert_eq!(config.window(), 1);
    }

    #[test]
    fn test_disc_prob_is_clamped() {
        let config = RdtConfig::new(4, Duration::from_secs(1)).with_disc_prob(3.0);
        assert_eq!(config.disc_prob(), 1.0);

        let config = RdtConfig::new(4, Duration::from_secs(1)).with_disc_prob(-1.0);
        assert_eq!(config.disc_prob(), 0.0);
    }
}
