//! Builds the target-adjusted probability matrix and the composed reward
//! vectors the calc facade solves against.
//!
//! Every function here assumes state identifiers already form a dense
//! enumeration `0 .. mc.size_states()` used directly as matrix row/column
//! indices. This is never checked: a chain whose ids are sparse or do not
//! start at zero will silently produce a matrix smaller than its largest id,
//! and later accesses against that id will be rejected by the matrix's own
//! bounds rather than by anything in this module. Renumbering ids into a
//! dense range before analysis is the caller's responsibility.

use crate::chain::Chain;
use crate::error::Result;
use crate::intset::TargetSet;
use shared::{StateT, WeightT};
use sparse::SparseMatrix;

/// Builds `P` with `P[u][v] = probability(u, v)` for every edge `(u, v)` with
/// `u` not in `target`; all other entries are zero (including every entry of
/// a target state's row).
pub fn target_adjusted_probability_matrix(mc: &Chain, target: &TargetSet) -> SparseMatrix {
    let n = mc.size_states();
    let mut p = SparseMatrix::new(n, n);
    for u in mc.state_ids() {
        if target.contains(&u) {
            continue;
        }
        for (v, probability) in mc.outgoing(u) {
            p.set(u as usize, v as usize, probability);
        }
    }
    p
}

/// Builds `b[u] = -sum_v P[u][v] * reward(u, v, reward_index)`, the
/// right-hand side of `(P - I) x = b` whose solution is the expected
/// accumulated reward from `u` to the target set.
pub fn rewarded_image_vector(
    mc: &Chain,
    tapm: &SparseMatrix,
    reward_index: usize,
) -> Result<Vec<WeightT>> {
    let n = tapm.size_m();
    let mut b = vec![0.0; n];
    for u in 0..n {
        let mut acc = 0.0;
        for (v, probability) in tapm.row(u) {
            acc -= probability * mc.edge_decoration(u as StateT, v as StateT, reward_index)?;
        }
        b[u] = acc;
    }
    Ok(b)
}

/// Writes the variance reward `((s(v) + r(u,v)) - s(u))^2` into edge
/// decoration slot `reward_free` for every edge, where `s` is the state
/// decoration at `expectation_slot` and `r` is the edge decoration at
/// `reward_index`.
pub fn compose_variance_reward(
    mc: &mut Chain,
    reward_index: usize,
    expectation_slot: usize,
    reward_free: usize,
) -> Result<()> {
    let edges: Vec<(StateT, StateT)> = mc
        .state_ids()
        .flat_map(|u| mc.outgoing(u).map(move |(v, _)| (u, v)).collect::<Vec<_>>())
        .collect();

    for (u, v) in edges {
        let r_uv = mc.edge_decoration(u, v, reward_index)?;
        let s_u = mc.state_decoration(u, expectation_slot)?;
        let s_v = mc.state_decoration(v, expectation_slot)?;
        let reward = ((s_v + r_uv) - s_u).powi(2);
        mc.set_edge_decoration(u, v, reward_free, reward)?;
    }
    Ok(())
}

/// Writes the covariance reward `((s1(v)+r1)-s1(u)) * ((s2(v)+r2)-s2(u))`
/// into edge decoration slot `reward_free`.
#[allow(clippy::too_many_arguments)]
pub fn compose_covariance_reward(
    mc: &mut Chain,
    reward_index_1: usize,
    expectation_slot_1: usize,
    reward_index_2: usize,
    expectation_slot_2: usize,
    reward_free: usize,
) -> Result<()> {
    let edges: Vec<(StateT, StateT)> = mc
        .state_ids()
        .flat_map(|u| mc.outgoing(u).map(move |(v, _)| (u, v)).collect::<Vec<_>>())
        .collect();

    for (u, v) in edges {
        let r1 = mc.edge_decoration(u, v, reward_index_1)?;
        let s1_u = mc.state_decoration(u, expectation_slot_1)?;
        let s1_v = mc.state_decoration(v, expectation_slot_1)?;
        let r2 = mc.edge_decoration(u, v, reward_index_2)?;
        let s2_u = mc.state_decoration(u, expectation_slot_2)?;
        let s2_v = mc.state_decoration(v, expectation_slot_2)?;
        let factor1 = (s1_v + r1) - s1_u;
        let factor2 = (s2_v + r2) - s2_u;
        mc.set_edge_decoration(u, v, reward_free, factor1 * factor2)?;
    }
    Ok(())
}
