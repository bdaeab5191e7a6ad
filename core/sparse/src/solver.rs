//! Preconditioned conjugate-gradient solver for `A x = b`.
//!
//! `A` is, in general, not symmetric here (it is `P - I` for a target-adjusted
//! probability matrix `P`, which is only symmetric for reversible doubly
//! stochastic chains). CG is kept to match the reference solver configuration
//! this crate's architecture is grounded on; a non-symmetric Krylov method
//! (BiCGStab, GMRES) would be the more defensible choice and can be swapped
//! in behind this same `solve` signature without touching callers.

use crate::amg::AmgPreconditioner;
use crate::matrix::SparseMatrix;
use shared::WeightT;

/// Iteration cap and residual tolerance for [`solve`].
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    pub max_iterations: usize,
    pub tolerance: WeightT,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            max_iterations: 500,
            tolerance: 1e-10,
        }
    }
}

fn dot(a: &[WeightT], b: &[WeightT]) -> WeightT {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Solves `A x = b` for `x`, returning the best iterate found within
/// `config.max_iterations` or once the relative residual drops below
/// `config.tolerance`, whichever comes first. Never fails: an unconverged
/// result is still returned, matching the original solver's "best effort"
/// contract (callers do not inspect residuals).
pub fn solve(a: &SparseMatrix, b: &[WeightT], config: &SolverConfig) -> Vec<WeightT> {
    let n = b.len();
    debug_assert_eq!(a.size_m(), n);
    debug_assert_eq!(a.size_n(), n);

    let mut x = vec![0.0; n];
    if n == 0 {
        return x;
    }

    let b_norm = dot(b, b).sqrt();
    if b_norm < WeightT::EPSILON {
        return x;
    }

    let preconditioner = AmgPreconditioner::build(a);

    let mut r: Vec<WeightT> = {
        let ax = a.mul_vec(&x);
        b.iter().zip(&ax).map(|(bi, axi)| bi - axi).collect()
    };

    let mut z = preconditioner.apply(a, &r);
    let mut p = z.clone();
    let mut rz_old = dot(&r, &z);

    for iteration in 0..config.max_iterations {
        let residual_norm = dot(&r, &r).sqrt();
        if residual_norm / b_norm < config.tolerance {
            log::debug!(
                "cg converged after {} iterations, relative residual {:e}",
                iteration,
                residual_norm / b_norm
            );
            return x;
        }

        let ap = a.mul_vec(&p);
        let pap = dot(&p, &ap);
        if pap.abs() < WeightT::EPSILON {
            log::warn!("cg breakdown at iteration {} (p^T A p ~ 0)", iteration);
            break;
        }
        let alpha = rz_old / pap;

        for i in 0..n {
            x[i] += alpha * p[i];
            r[i] -= alpha * ap[i];
        }

        z = preconditioner.apply(a, &r);
        let rz_new = dot(&r, &z);
        let beta = rz_new / rz_old;
        for i in 0..n {
            p[i] = z[i] + beta * p[i];
        }
        rz_old = rz_new;
    }

    log::debug!(
        "cg stopped at iteration cap {}, final residual {:e}",
        config.max_iterations,
        dot(&r, &r).sqrt() / b_norm
    );
    x
}
