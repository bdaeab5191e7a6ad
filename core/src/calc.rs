//! Sequences the analyzer and solver into the three user-facing analytical
//! passes, recording a named phase-timing log for each.

use crate::analyzer::{
    compose_covariance_reward, compose_variance_reward, rewarded_image_vector,
    target_adjusted_probability_matrix,
};
use crate::chain::Chain;
use crate::error::Result;
use crate::intset::TargetSet;
use serde::Serialize;
use shared::StateT;
use sparse::{solve, SolverConfig};
use std::collections::BTreeMap;
use std::time::Instant;

/// Per-command structured timing record, serialised into the JSON log.
#[derive(Debug, Default, Serialize)]
pub struct PhaseLog {
    #[serde(flatten)]
    timings_ms: BTreeMap<String, f64>,
}

impl PhaseLog {
    fn record(&mut self, key: &str, started: Instant) {
        self.timings_ms
            .insert(key.to_string(), started.elapsed().as_secs_f64() * 1000.0);
    }
}

fn write_vector(mc: &mut Chain, x: &[f64], slot: usize) -> Result<()> {
    let by_state: BTreeMap<StateT, f64> = mc
        .state_ids()
        .map(|id| (id, x[id as usize]))
        .collect();
    mc.set_state_decoration_vector(&by_state, slot)
}

/// Computes, for every state, the expected accumulated reward (reward slot
/// `r_in`) until absorption into `target`, writing results into state
/// decoration slot `s_out`.
pub fn expectation(
    mc: &mut Chain,
    r_in: usize,
    target: &TargetSet,
    s_out: usize,
    config: &SolverConfig,
) -> Result<PhaseLog> {
    let mut log = PhaseLog::default();
    let total = Instant::now();

    let t0 = Instant::now();
    let p = target_adjusted_probability_matrix(mc, target);
    log.record("time_create_pto_matrix", t0);

    let t1 = Instant::now();
    let mut a = p.clone();
    log.record("time_copy_pto_matrix", t1);

    let t2 = Instant::now();
    a.subtract_identity()?;
    log.record("time_subtract_unity_matrix", t2);

    let t3 = Instant::now();
    let b = rewarded_image_vector(mc, &p, r_in)?;
    log.record("time_calc_image_vector_expect", t3);

    let t4 = Instant::now();
    let x = solve(&a, &b, config);
    log.record("time_solve_linear_system_expect", t4);

    let t5 = Instant::now();
    write_vector(mc, &x, s_out)?;
    log.record("time_write_decoration_node_expect", t5);

    log.record("time_total", total);
    Ok(log)
}

/// Computes the variance of accumulated reward `r_in` until absorption into
/// `target`. `expectation_slot` and `reward_free` are scratch slots
/// overwritten by this call; `s_out` receives the variance.
pub fn variance(
    mc: &mut Chain,
    r_in: usize,
    target: &TargetSet,
    s_out: usize,
    expectation_slot: usize,
    reward_free: usize,
    config: &SolverConfig,
) -> Result<PhaseLog> {
    let mut log = PhaseLog::default();
    let total = Instant::now();

    let t0 = Instant::now();
    let p = target_adjusted_probability_matrix(mc, target);
    log.record("time_create_pto_matrix", t0);

    let t1 = Instant::now();
    let mut a = p.clone();
    a.subtract_identity()?;
    log.record("time_subtract_unity_matrix", t1);

    let t2 = Instant::now();
    let b_e = rewarded_image_vector(mc, &p, r_in)?;
    log.record("time_calc_image_vector_expect", t2);

    let t3 = Instant::now();
    let expectations = solve(&a, &b_e, config);
    log.record("time_solve_linear_system_expect", t3);

    let t4 = Instant::now();
    write_vector(mc, &expectations, expectation_slot)?;
    log.record("time_write_decoration_node_expect", t4);

    let t5 = Instant::now();
    compose_variance_reward(mc, r_in, expectation_slot, reward_free)?;
    log.record("time_calc_interim_reward", t5);

    let t6 = Instant::now();
    let b_v = rewarded_image_vector(mc, &p, reward_free)?;
    log.record("time_calc_image_vector_variance", t6);

    let t7 = Instant::now();
    let variances = solve(&a, &b_v, config);
    log.record("time_solve_linear_system_variance", t7);

    let t8 = Instant::now();
    write_vector(mc, &variances, s_out)?;
    log.record("time_write_decoration_node_variance", t8);

    log.record("time_total", total);
    Ok(log)
}

/// Computes the covariance of accumulated rewards `r1` and `r2` until
/// absorption into `target`. `e1`, `e2` and `reward_free` are scratch slots;
/// `s_out` receives the covariance.
#[allow(clippy::too_many_arguments)]
pub fn covariance(
    mc: &mut Chain,
    r1: usize,
    r2: usize,
    target: &TargetSet,
    s_out: usize,
    e1: usize,
    e2: usize,
    reward_free: usize,
    config: &SolverConfig,
) -> Result<PhaseLog> {
    let mut log = PhaseLog::default();
    let total = Instant::now();

    let t0 = Instant::now();
    let p = target_adjusted_probability_matrix(mc, target);
    log.record("time_create_pto_matrix", t0);

    let t1 = Instant::now();
    let mut a = p.clone();
    a.subtract_identity()?;
    log.record("time_subtract_unity_matrix", t1);

    let t2 = Instant::now();
    let b1 = rewarded_image_vector(mc, &p, r1)?;
    let expectations_1 = solve(&a, &b1, config);
    write_vector(mc, &expectations_1, e1)?;
    log.record("time_solve_linear_system_expect", t2);

    let t3 = Instant::now();
    let b2 = rewarded_image_vector(mc, &p, r2)?;
    let expectations_2 = solve(&a, &b2, config);
    write_vector(mc, &expectations_2, e2)?;
    log.record("time_solve_linear_system_expect_2", t3);

    let t4 = Instant::now();
    compose_covariance_reward(mc, r1, e1, r2, e2, reward_free)?;
    log.record("time_calc_interim_reward", t4);

    let t5 = Instant::now();
    let b_cov = rewarded_image_vector(mc, &p, reward_free)?;
    let covariances = solve(&a, &b_cov, config);
    log.record("time_solve_linear_system_covariance", t5);

    let t6 = Instant::now();
    write_vector(mc, &covariances, s_out)?;
    log.record("time_write_decoration_node_covariance", t6);

    log.record("time_total", total);
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_state_absorbing_chain() -> Chain {
        let mut mc = Chain::new(1, 1);
        mc.add_edge(0, 1, 1.0).unwrap();
        mc.set_edge_decoration(0, 1, 0, 5.0).unwrap();
        mc
    }

    #[test]
    fn expectation_two_state_absorbing_chain() {
        let mut mc = two_state_absorbing_chain();
        let target: TargetSet = [1].into_iter().collect();
        expectation(&mut mc, 0, &target, 0, &SolverConfig::default()).unwrap();
        assert!((mc.state_decoration(0, 0).unwrap() - 5.0).abs() < 1e-6);
        assert!((mc.state_decoration(1, 0).unwrap() - 0.0).abs() < 1e-6);
    }

    #[test]
    fn expectation_geometric_like_chain() {
        let mut mc = Chain::new(1, 1);
        mc.add_edge(0, 1, 0.5).unwrap();
        mc.add_edge(0, 0, 0.5).unwrap();
        mc.add_edge(1, 2, 1.0).unwrap();
        for (u, v) in [(0, 1), (0, 0), (1, 2)] {
            mc.set_edge_decoration(u, v, 0, 1.0).unwrap();
        }
        let target: TargetSet = [2].into_iter().collect();
        expectation(&mut mc, 0, &target, 0, &SolverConfig::default()).unwrap();
        assert!((mc.state_decoration(0, 0).unwrap() - 3.0).abs() < 1e-6);
        assert!((mc.state_decoration(1, 0).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn variance_is_zero_on_deterministic_path() {
        let mut mc = Chain::new(1, 3);
        mc.add_edge(0, 1, 1.0).unwrap();
        mc.add_edge(1, 2, 1.0).unwrap();
        for (u, v) in [(0, 1), (1, 2)] {
            mc.set_edge_decoration(u, v, 0, 1.0).unwrap();
        }
        let target: TargetSet = [2].into_iter().collect();
        variance(&mut mc, 0, &target, 0, 1, 0, &SolverConfig::default()).unwrap();
        for state in 0..3 {
            assert!(mc.state_decoration(state, 0).unwrap().abs() < 1e-6);
        }
    }

    #[test]
    fn covariance_with_self_matches_variance() {
        let mut mc = Chain::new(2, 4);
        mc.add_edge(0, 1, 0.5).unwrap();
        mc.add_edge(0, 0, 0.5).unwrap();
        mc.add_edge(1, 2, 1.0).unwrap();
        for (u, v) in [(0, 1), (0, 0), (1, 2)] {
            mc.set_edge_decoration(u, v, 0, 1.0).unwrap();
            mc.set_edge_decoration(u, v, 1, 1.0).unwrap();
        }
        let target: TargetSet = [2].into_iter().collect();

        variance(&mut mc, 0, &target, 0, 1, 0, &SolverConfig::default()).unwrap();
        let variance_values: Vec<f64> = (0..3).map(|s| mc.state_decoration(s, 0).unwrap()).collect();

        covariance(&mut mc, 1, 1, &target, 2, 3, 1, 0, &SolverConfig::default()).unwrap();
        let covariance_values: Vec<f64> = (0..3).map(|s| mc.state_decoration(s, 2).unwrap()).collect();

        for (v, c) in variance_values.iter().zip(&covariance_values) {
            assert!((v - c).abs() < 1e-6);
        }
    }
}
