//! Shared engine state: input store, world cache and tick bookkeeping
//!
//! Everything the background loops and the sampling path both touch lives in
//! one `EngineState` record guarded by a single mutex. Contention is low
//! (one receive loop, occasional foreground sampling) and every critical
//! section is a handful of map operations, so one lock is both simpler and
//! safer than juggling per-store locks.
//!
//! Store invariants:
//! - `auth_inputs` always contains tick 0 (empty map) and `auth_worlds`
//!   always contains `(0, world0)`; both grow monotonically and existing
//!   entries are never modified or removed.
//! - `max_auth_tick` only advances, and every tick in `[0, max_auth_tick]`
//!   is present in `auth_inputs`.
//! - a world cached at tick `t` was derived by stepping through the
//!   unbroken authoritative input chain `[0, t]`.

use std::collections::BTreeMap;
use thiserror::Error;
use veles_protocol::{InputMap, PlayerId, Tick};

/// Attempted second insert of an authoritative tick
///
/// Authoritative data is idempotent, so callers log the duplicate and move on.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("authoritative inputs for tick {tick} already present")]
pub(crate) struct DuplicateAuthTick {
    pub tick: Tick,
}

/// All mutable engine state, guarded by one mutex at the `Client` level
pub(crate) struct EngineState<I, W> {
    /// Authoritative inputs by tick; inner maps are complete per tick
    pub auth_inputs: BTreeMap<Tick, InputMap<I>>,

    /// Speculative inputs by tick; inner maps may be partial
    pub hint_inputs: BTreeMap<Tick, InputMap<I>>,

    /// Worlds derived from the unbroken authoritative prefix
    pub auth_worlds: BTreeMap<Tick, W>,

    /// High-water mark of the unbroken authoritative input prefix
    pub max_auth_tick: Tick,

    /// Server-assigned identity; set exactly once on Connected
    pub my_player_id: Option<PlayerId>,

    /// Last input value supplied by the application
    pub current_input: I,

    /// Highest tick for which local input has been transmitted
    pub last_submitted_tick: Tick,

    /// Highest authoritative world tick already returned to the sampler
    pub last_sampled_auth_world_tick: Tick,
}

impl<I: Clone, W: Clone> EngineState<I, W> {
    /// Seeds the stores with the shared initial state
    ///
    /// Tick 0 gets an empty authoritative input map and `world0`. The rest of
    /// the engine leans on this seed: `floor_world` is infallible because of
    /// it.
    pub fn new(input0: I, world0: W) -> Self {
        let mut auth_inputs = BTreeMap::new();
        auth_inputs.insert(Tick::ZERO, InputMap::new());

        let mut auth_worlds = BTreeMap::new();
        auth_worlds.insert(Tick::ZERO, world0);

        Self {
            auth_inputs,
            hint_inputs: BTreeMap::new(),
            auth_worlds,
            max_auth_tick: Tick::ZERO,
            my_player_id: None,
            current_input: input0,
            last_submitted_tick: Tick::ZERO,
            last_sampled_auth_world_tick: Tick::ZERO,
        }
    }

    /// Inserts the complete authoritative input map for a tick
    pub fn insert_auth(&mut self, tick: Tick, inputs: InputMap<I>) -> Result<(), DuplicateAuthTick> {
        if self.auth_inputs.contains_key(&tick) {
            return Err(DuplicateAuthTick { tick });
        }
        self.auth_inputs.insert(tick, inputs);
        Ok(())
    }

    /// Merges incoming hints for a tick
    ///
    /// Precedence on collision: our own previously stored hint for
    /// `self_player` wins, then the incoming hints, then whatever else was
    /// already stored. We trust our own input over another client's guess
    /// about us.
    pub fn merge_hint(
        &mut self,
        tick: Tick,
        incoming: InputMap<I>,
        self_player: Option<PlayerId>,
    ) {
        let merged = self.hint_inputs.entry(tick).or_default();
        for (player, input) in incoming {
            let own = self_player == Some(player) && merged.contains_key(&player);
            if !own {
                merged.insert(player, input);
            }
        }
    }

    /// Upserts a single hint cell
    pub fn insert_hint_one(&mut self, tick: Tick, player: PlayerId, input: I) {
        self.hint_inputs.entry(tick).or_default().insert(player, input);
    }

    /// Largest tick present in the authoritative input store
    pub fn max_auth_key(&self) -> Tick {
        *self.auth_inputs.keys().next_back().expect("tick 0 seeded")
    }

    /// Extends the unbroken authoritative prefix if `[head, newest]` attaches
    /// to it
    ///
    /// Returns true when `max_auth_tick` advanced.
    pub fn extend_auth_prefix(&mut self, head_tick: Tick, newest_tick: Tick) -> bool {
        if head_tick <= self.max_auth_tick + 1 && self.max_auth_tick < newest_tick {
            self.max_auth_tick = newest_tick;
            true
        } else {
            false
        }
    }

    /// Largest cached world entry with tick ≤ `tick`
    ///
    /// Infallible: the `(0, world0)` seed means a floor always exists. A miss
    /// here is a seeding bug, not a runtime condition.
    pub fn floor_world(&self, tick: Tick) -> (Tick, W) {
        let (t, w) = self
            .auth_worlds
            .range(..=tick.max(Tick::ZERO))
            .next_back()
            .expect("world cache seeded with tick 0");
        (*t, w.clone())
    }

    /// Largest tick present in the world cache
    pub fn max_auth_world_tick(&self) -> Tick {
        *self.auth_worlds.keys().next_back().expect("tick 0 seeded")
    }

    /// Caches a world derived from the authoritative chain
    ///
    /// Idempotent: determinism guarantees a re-derived world is identical,
    /// so an existing entry is left untouched.
    pub fn insert_derived(&mut self, tick: Tick, world: W) {
        self.auth_worlds.entry(tick).or_insert(world);
    }

    /// Authoritative ticks missing between the newest cached world and the
    /// newest known authoritative input, oldest first, capped at `limit`
    pub fn missing_auth_ticks(&self, limit: usize) -> Vec<Tick> {
        let after = self.max_auth_world_tick();
        let before = self.max_auth_key();

        let mut missing = Vec::new();
        let mut t = after + 1;
        while t < before && missing.len() < limit {
            if !self.auth_inputs.contains_key(&t) {
                missing.push(t);
            }
            t = t.next();
        }
        missing
    }

    /// Worlds cached since the last sample, oldest first
    ///
    /// Advances the sampled high-water mark so each derived world is
    /// observed exactly once.
    pub fn take_new_auth_worlds(&mut self) -> Vec<W> {
        let newest = self.max_auth_world_tick();
        if newest <= self.last_sampled_auth_world_tick {
            return Vec::new();
        }

        let fresh: Vec<W> = self
            .auth_worlds
            .range(self.last_sampled_auth_world_tick.next()..=newest)
            .map(|(_, w)| w.clone())
            .collect();
        self.last_sampled_auth_world_tick = newest;
        fresh
    }
}
