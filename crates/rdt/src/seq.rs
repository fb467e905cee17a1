//! Sequence-number arithmetic for the sliding window.
//!
//! The sequence space has modulus `M = 2 * wSize`: twice the window, so that
//! a retransmitted old packet can never be mistaken for a newly admitted one
//! (the standard selective-repeat invariant), provided the receiver acks in
//! time.

use std::fmt;

/// Largest window size the protocol supports. Keeps `2 * wSize` inside
/// `u16`.
pub const MAX_WINDOW: u16 = (1 << 14) - 1;

/// A value in the `[0, modulus)` sequence-number ring.
///
/// The modulus itself is not carried by the type; callers pass it to
/// [`SeqNum::incr`] and [`SeqNum::diff`], matching the protocol's use of a
/// single connection-wide modulus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SeqNum(u16);

impl SeqNum {
    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u16 {
        self.0
    }

    /// `(self + 1) mod modulus`.
    pub fn incr(self, modulus: u16) -> Self {
        Self((self.0 + 1) % modulus)
    }

    /// Clockwise distance from `other` to `self`, i.e. `(self - other) mod
    /// modulus`.
    pub fn diff(self, other: Self, modulus: u16) -> u16 {
        let modulus = modulus as i32;
        (((self.0 as i32) - (other.0 as i32) + modulus) % modulus) as u16
    }

    /// Index of the receive-buffer slot this sequence number maps to.
    pub fn window_slot(self, window: u16) -> usize {
        (self.0 % window) as usize
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incr_wraps() {
        assert_eq!(SeqNum::new(5).incr(8), SeqNum::new(6));
        assert_eq!(SeqNum::new(7).incr(8), SeqNum::new(0));
    }

    #[test]
    fn test_diff_within_window() {
        assert_eq!(SeqNum::new(3).diff(SeqNum::new(1), 8), 2);
        assert_eq!(SeqNum::new(1).diff(SeqNum::new(3), 8), 6);
        assert_eq!(SeqNum::new(0).diff(SeqNum::new(0), 8), 0);
    }

    #[test]
    fn test_window_slot() {
        assert_eq!(SeqNum::new(5).window_slot(4), 1);
        assert_eq!(SeqNum::new(8).window_slot(4), 0);
    }
}
