//! Prediction and rollback engine
//!
//! `sample` re-simulates from the newest cached authoritative world up to a
//! clock-derived target tick. Ticks covered by authoritative inputs are
//! stepped exactly and their worlds cached; past the authoritative chain the
//! engine speculates with hint inputs and carry-forward, bounded by the
//! prediction allowance. Rollback is implicit: a world predicted last frame
//! is simply never reused. The next sample starts again from authoritative
//! state, so newly arrived inputs replace yesterday's guesses.

use crate::config::ClientConfig;
use crate::state::EngineState;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use veles_protocol::{InputMap, Tick};
use veles_simulation::{InputPair, Simulation};

/// Re-simulates up to `target` and returns the authoritative worlds cached
/// since the previous sample plus the predicted world at the target tick
///
/// The state lock is taken twice (once to snapshot the inputs and the
/// starting world, once to commit derived worlds and collect the fresh
/// ones), so stepping itself never blocks the receive loop.
pub(crate) fn sample<S: Simulation>(
    sim: &S,
    config: &ClientConfig,
    state: &Mutex<EngineState<S::Input, S::World>>,
    target: Tick,
) -> (Vec<S::World>, S::World) {
    // Consistent snapshot of everything the stepping loop reads.
    let (start_tick, start_world, start_inputs, auth, hints, max_auth_tick) = {
        let st = state.lock();
        let (floor_tick, floor_world) = st.floor_world(target);
        let start_inputs = st
            .auth_inputs
            .get(&floor_tick)
            .cloned()
            .expect("cached world without matching authoritative inputs");

        let (auth, hints): (BTreeMap<Tick, InputMap<S::Input>>, BTreeMap<Tick, InputMap<S::Input>>) =
            if floor_tick < target {
                (
                    st.auth_inputs
                        .range(floor_tick.next()..=target)
                        .map(|(t, m)| (*t, m.clone()))
                        .collect(),
                    st.hint_inputs
                        .range(floor_tick.next()..=target)
                        .map(|(t, m)| (*t, m.clone()))
                        .collect(),
                )
            } else {
                // Target at or behind the floor: nothing to step through.
                (BTreeMap::new(), BTreeMap::new())
            };

        (floor_tick, floor_world, start_inputs, auth, hints, st.max_auth_tick)
    };

    if target < start_tick {
        // Only reachable with a negative target, before the estimator has
        // any samples. Nothing to simulate, nothing new to report.
        return (Vec::new(), start_world);
    }

    let mut allowance = if target - max_auth_tick > config.resync_threshold_ticks {
        tracing::debug!(
            target = %target,
            max_auth_tick = %max_auth_tick,
            "too far behind authoritative state, prediction disabled"
        );
        0
    } else {
        config.max_prediction_ticks
    };

    let input0 = sim.initial_input();
    let mut world = start_world;
    let mut current_inputs = start_inputs;
    let mut on_auth_path = true;
    let mut derived: Vec<(Tick, S::World)> = Vec::new();

    let mut tick = start_tick;
    while tick < target {
        let tick_next = tick.next();
        let auth_next = auth.get(&tick_next);
        let is_auth = on_auth_path && auth_next.is_some();

        if !is_auth {
            if allowance == 0 {
                break;
            }
            allowance -= 1;
        }

        let inputs_next = match auth_next {
            Some(complete) => complete.clone(),
            None => {
                // Hints first, then carry-forward: a player whose next input
                // is unknown is assumed to repeat their previous one.
                let mut speculative = hints.get(&tick_next).cloned().unwrap_or_default();
                for (player, previous) in &current_inputs {
                    speculative
                        .entry(*player)
                        .or_insert_with(|| previous.clone());
                }
                speculative
            }
        };

        let paired = pair_inputs(&current_inputs, &inputs_next, &input0);
        let next_world = sim.step(&paired, tick_next, &world);

        if is_auth {
            derived.push((tick_next, next_world.clone()));
        }

        world = next_world;
        current_inputs = inputs_next;
        on_auth_path = is_auth;
        tick = tick_next;
    }

    // Commit under a fresh lock so callers observe each derived world
    // exactly once, including any the receive loop raced in meanwhile.
    let new_auth_worlds = {
        let mut st = state.lock();
        for (t, w) in derived {
            st.insert_derived(t, w);
        }
        st.take_new_auth_worlds()
    };

    (new_auth_worlds, world)
}

/// Builds the `(previous, current)` pairs over the union of both tick's
/// player sets
///
/// `input0` stands in only for players that have truly never had an input;
/// a player present before but absent from `next` repeats their previous
/// input.
fn pair_inputs<I: Clone>(
    current: &InputMap<I>,
    next: &InputMap<I>,
    input0: &I,
) -> BTreeMap<veles_protocol::PlayerId, InputPair<I>> {
    let mut paired = BTreeMap::new();

    for (player, next_input) in next {
        let previous = current.get(player).cloned().unwrap_or_else(|| input0.clone());
        paired.insert(*player, InputPair::new(previous, next_input.clone()));
    }
    for (player, previous) in current {
        paired
            .entry(*player)
            .or_insert_with(|| InputPair::new(previous.clone(), previous.clone()));
    }

    paired
}
