//! # Veles Simulation Layer
//!
//! The deterministic simulation seam between the Veles engine and the game.
//!
//! The engine is generic over two opaque application types (the per-player
//! input and the world) plus a pure step function. The same `Simulation`
//! implementation must run on every participant: the whole lockstep scheme
//! rests on `step` producing byte-identical worlds from identical inputs.
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use serde::{Serialize, Deserialize};
//! use veles_simulation::{InputPair, Simulation};
//! use veles_protocol::{PlayerId, Tick};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! struct Thrust {
//!     dx: i64,
//! }
//!
//! /// One-dimensional positions, one per player.
//! type Positions = BTreeMap<PlayerId, i64>;
//!
//! struct LineGame;
//!
//! impl Simulation for LineGame {
//!     type Input = Thrust;
//!     type World = Positions;
//!
//!     fn initial_input(&self) -> Thrust {
//!         Thrust { dx: 0 }
//!     }
//!
//!     fn initial_world(&self) -> Positions {
//!         Positions::new()
//!     }
//!
//!     fn step(
//!         &self,
//!         inputs: &BTreeMap<PlayerId, InputPair<Thrust>>,
//!         _tick: Tick,
//!         world: &Positions,
//!     ) -> Positions {
//!         let mut next = world.clone();
//!         for (player, pair) in inputs {
//!             *next.entry(*player).or_insert(0) += pair.current.dx;
//!         }
//!         next
//!     }
//! }
//! ```

use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;

pub use veles_protocol::{InputMap, PlayerId, Tick};

/// A player's input across one simulation step
///
/// `previous` is the input the player held during the tick being left,
/// `current` the input for the tick being entered. Games that only care
/// about held state read `current`; edge-triggered actions (a jump pressed
/// this tick) compare the two.
#[derive(Debug, Clone, PartialEq)]
pub struct InputPair<I> {
    pub previous: I,
    pub current: I,
}

impl<I> InputPair<I> {
    pub fn new(previous: I, current: I) -> Self {
        Self { previous, current }
    }
}

/// The deterministic game simulation the engine drives
///
/// # Requirements
///
/// - **Deterministic**: `step` is a pure function of its arguments. No
///   wall-clock reads, no unseeded randomness, no iteration over unordered
///   collections. Floating point is the application's own risk.
/// - **Identical everywhere**: every participant must run the same
///   implementation, or their worlds will silently diverge.
///
/// `initial_input` and `initial_world` define tick 0: the world before any
/// input, and the input assumed for a player that has never sent one.
pub trait Simulation: Send + Sync + 'static {
    /// Player input for one tick; serialized onto the wire as-is
    type Input: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Complete game state at one tick; never leaves the client
    type World: Clone + Send + Sync + 'static;

    /// The input assumed for a player with no recorded input yet
    fn initial_input(&self) -> Self::Input;

    /// The world at tick 0, shared by all participants
    fn initial_world(&self) -> Self::World;

    /// Advances the world by one tick
    ///
    /// `inputs` holds an `InputPair` for every player relevant to this step,
    /// ordered by `PlayerId`. The ordering is part of the determinism
    /// contract, not a convenience.
    fn step(
        &self,
        inputs: &BTreeMap<PlayerId, InputPair<Self::Input>>,
        tick: Tick,
        world: &Self::World,
    ) -> Self::World;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter;

    impl Simulation for Counter {
        type Input = i64;
        type World = i64;

        fn initial_input(&self) -> i64 {
            0
        }

        fn initial_world(&self) -> i64 {
            0
        }

        fn step(
            &self,
            inputs: &BTreeMap<PlayerId, InputPair<i64>>,
            _tick: Tick,
            world: &i64,
        ) -> i64 {
            world + inputs.values().map(|pair| pair.current).sum::<i64>()
        }
    }

    #[test]
    fn step_is_deterministic() {
        let sim = Counter;
        let mut inputs = BTreeMap::new();
        inputs.insert(PlayerId::new(1), InputPair::new(0, 3));
        inputs.insert(PlayerId::new(2), InputPair::new(0, 4));

        let a = sim.step(&inputs, Tick::new(1), &10);
        let b = sim.step(&inputs, Tick::new(1), &10);
        assert_eq!(a, 17);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_inputs_leave_counter_unchanged() {
        let sim = Counter;
        let world = sim.step(&BTreeMap::new(), Tick::new(5), &42);
        assert_eq!(world, 42);
    }
}
