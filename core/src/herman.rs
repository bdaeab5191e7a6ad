//! Closed-form generator for the Herman self-stabilisation ring chain.

use crate::chain::Chain;
use crate::error::{CoreError, Result};
use crate::intset::TargetSet;
use shared::StateT;

/// Populates `mc` (which must be empty) with the full Herman-`size` chain
/// and writes its two stable states into `target`.
///
/// `size` is the ring length and must be odd; the state space is every
/// integer in `0 .. 2^size`, so `size` must also be small enough that
/// `1 << size` fits in [`StateT`].
pub fn generate_herman(mc: &mut Chain, size: u32, target: &mut TargetSet) -> Result<()> {
    if !mc.empty() {
        return Err(CoreError::InvalidArgument(
            "generate_herman requires an empty chain".to_string(),
        ));
    }
    if size % 2 == 0 {
        return Err(CoreError::InvalidArgument(format!(
            "Herman ring size must be odd, got {}",
            size
        )));
    }
    if size == 0 || size >= StateT::BITS {
        return Err(CoreError::InvalidArgument(format!(
            "Herman ring size {} does not fit the state identifier type",
            size
        )));
    }
    if mc.n_edge_decorations() < 1 {
        return Err(CoreError::InvalidArgument(
            "generate_herman requires at least one edge decoration slot".to_string(),
        ));
    }

    let n_states: StateT = 1 << size;

    for state in 0..n_states {
        generate_transitions(mc, state, size)?;
    }

    for state in 0..n_states {
        if is_stable(state, size) {
            target.insert(state);
        }
    }

    Ok(())
}

#[inline(always)]
fn bit(state: StateT, position: u32, size: u32) -> StateT {
    (state >> (position % size)) & 1
}

/// A state is stable iff its bits strictly alternate from the most
/// significant position down to the least significant one. Deliberately
/// excludes the wraparound pair (bit `size-1` vs bit `0`): an odd-length
/// ring cannot satisfy a full cyclic alternation, so exactly two states
/// (one per choice of most-significant bit) satisfy the linear condition.
fn is_stable(state: StateT, size: u32) -> bool {
    (0..size - 1).all(|p| bit(state, p, size) != bit(state, p + 1, size))
}

fn generate_transitions(mc: &mut Chain, state: StateT, size: u32) -> Result<()> {
    let mut free_positions = Vec::new();
    let mut next_bits = vec![0 as StateT; size as usize];

    for p in 0..size {
        let here = bit(state, p, size);
        let next = bit(state, p + 1, size);
        if here != next {
            // deterministic rotation
            next_bits[p as usize] = next;
        } else {
            free_positions.push(p);
        }
    }

    let k = free_positions.len() as u32;
    let fan_out = 1u32 << k;
    let probability = 1.0 / fan_out as f64;

    for combination in 0..fan_out {
        let mut successor = 0 as StateT;
        for p in 0..size {
            successor |= next_bits[p as usize] << p;
        }
        for (bit_index, &position) in free_positions.iter().enumerate() {
            let chosen = ((combination >> bit_index) & 1) as StateT;
            successor |= chosen << position;
        }
        mc.add_edge(state, successor, probability)?;
        mc.set_edge_decoration(state, successor, 0, 1.0)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn herman_3_has_expected_states_and_targets() {
        let mut mc = Chain::new(1, 0);
        let mut target = TargetSet::new();
        generate_herman(&mut mc, 3, &mut target).unwrap();
        assert_eq!(mc.size_states(), 8);
        assert_eq!(target, [0b010, 0b101].into_iter().collect());
    }

    #[test]
    fn herman_5_has_expected_states_and_targets() {
        let mut mc = Chain::new(1, 0);
        let mut target = TargetSet::new();
        generate_herman(&mut mc, 5, &mut target).unwrap();
        assert_eq!(mc.size_states(), 32);
        assert_eq!(target, [0b01010, 0b10101].into_iter().collect());
    }

    #[test]
    fn herman_rejects_even_size() {
        let mut mc = Chain::new(1, 0);
        let mut target = TargetSet::new();
        assert!(generate_herman(&mut mc, 4, &mut target).is_err());
        assert!(mc.empty());
    }

    #[test]
    fn herman_rows_are_stochastic_and_rewards_are_unit() {
        let mut mc = Chain::new(1, 0);
        let mut target = TargetSet::new();
        generate_herman(&mut mc, 3, &mut target).unwrap();
        for state in 0..8 {
            let total: f64 = mc.outgoing(state).map(|(_, p)| p).sum();
            assert!((total - 1.0).abs() < 1e-12, "state {} sums to {}", state, total);
            for (dest, _) in mc.outgoing(state) {
                assert_eq!(mc.edge_decoration(state, dest, 0).unwrap(), 1.0);
            }
        }
    }
}
