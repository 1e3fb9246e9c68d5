//! Simulation tick and player identity types
//!
//! A `Tick` is a discrete simulation step number shared by every participant.
//! Tick 0 is the initial state all clients and the server agree on before any
//! input has been applied. `PlayerId` is assigned by the server on connect and
//! stays constant for the lifetime of the session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

/// A discrete simulation step number
///
/// Ticks use ordinary signed 64-bit arithmetic: `tick + n` advances the
/// simulation by `n` steps, and subtracting two ticks yields the signed
/// distance between them.
///
/// # Example
///
/// ```
/// use veles_protocol::Tick;
///
/// let t = Tick::new(10);
/// assert_eq!(t + 5, Tick::new(15));
/// assert_eq!(t - Tick::new(4), 6);
/// assert!(t > Tick::ZERO);
/// ```
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Tick(i64);

impl Tick {
    /// The initial tick shared by all participants
    pub const ZERO: Tick = Tick(0);

    /// Creates a tick from its raw step number
    pub const fn new(value: i64) -> Self {
        Tick(value)
    }

    /// Returns the raw step number
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Returns the tick one simulation step later
    pub const fn next(self) -> Tick {
        Tick(self.0 + 1)
    }
}

impl Add<i64> for Tick {
    type Output = Tick;

    fn add(self, steps: i64) -> Tick {
        Tick(self.0 + steps)
    }
}

impl AddAssign<i64> for Tick {
    fn add_assign(&mut self, steps: i64) {
        self.0 += steps;
    }
}

impl Sub<i64> for Tick {
    type Output = Tick;

    fn sub(self, steps: i64) -> Tick {
        Tick(self.0 - steps)
    }
}

/// Signed distance in simulation steps
impl Sub for Tick {
    type Output = i64;

    fn sub(self, other: Tick) -> i64 {
        self.0 - other.0
    }
}

impl From<i64> for Tick {
    fn from(value: i64) -> Self {
        Tick(value)
    }
}

impl From<Tick> for i64 {
    fn from(tick: Tick) -> i64 {
        tick.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned participant identity
///
/// Opaque to the engine: it only needs equality, ordering (for deterministic
/// map iteration) and hashing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Creates a player id from its raw server-assigned value
    pub const fn new(value: u32) -> Self {
        PlayerId(value)
    }

    /// Returns the raw id value
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for PlayerId {
    fn from(value: u32) -> Self {
        PlayerId(value)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_arithmetic() {
        let t = Tick::new(5);
        assert_eq!(t + 3, Tick::new(8));
        assert_eq!(t - 2, Tick::new(3));
        assert_eq!(Tick::new(8) - t, 3);
        assert_eq!(t.next(), Tick::new(6));
    }

    #[test]
    fn tick_ordering() {
        assert!(Tick::new(-1) < Tick::ZERO);
        assert!(Tick::new(100) > Tick::new(99));
    }

    #[test]
    fn tick_conversions() {
        let t: Tick = 42i64.into();
        assert_eq!(i64::from(t), 42);
        assert_eq!(t.value(), 42);
    }

    #[test]
    fn player_id_ordering() {
        assert!(PlayerId::new(1) < PlayerId::new(2));
        assert_eq!(PlayerId::new(7).value(), 7);
    }
}
