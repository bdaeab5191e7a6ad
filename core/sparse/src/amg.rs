//! Aggregation-based algebraic multigrid preconditioner.
//!
//! A single coarse level built by greedy pairwise aggregation of strongly
//! connected unknowns, a direct (dense Gaussian elimination) solve on the
//! coarse problem, and an `spai0`-style diagonal relaxation as smoother on
//! the fine level. This mirrors the shape of an aggregation/smoothed-aggregation
//! AMG preconditioner without pulling in a general-purpose multigrid crate.

use crate::matrix::SparseMatrix;
use shared::WeightT;

/// Strength-of-connection threshold: `j` is a strong neighbour of `i` when
/// `|a_ij| >= THETA * sqrt(|a_ii| * |a_jj|)`.
const THETA: WeightT = 0.25;

/// Below this size a coarse level buys nothing; fall back to pure smoothing.
const MIN_COARSENABLE: usize = 8;

struct Aggregates {
    /// `owner[i]` is the aggregate id unknown `i` belongs to.
    owner: Vec<usize>,
    count: usize,
}

fn build_aggregates(a: &SparseMatrix) -> Aggregates {
    let n = a.size_m();
    let diag = a.diagonal();
    let mut owner = vec![usize::MAX; n];
    let mut count = 0;

    for i in 0..n {
        if owner[i] != usize::MAX {
            continue;
        }
        let agg_id = count;
        owner[i] = agg_id;
        let a_ii = diag[i].abs();
        for (j, a_ij) in a.row(i) {
            if j == i || owner[j] != usize::MAX {
                continue;
            }
            let a_jj = diag[j].abs();
            if a_ij.abs() >= THETA * (a_ii * a_jj).sqrt() {
                owner[j] = agg_id;
            }
        }
        count += 1;
    }

    Aggregates { owner, count }
}

/// `spai0`-style diagonal relaxation: the scalar minimising
/// `|| I - M A ||_F` row-by-row, i.e. `M_ii = a_ii / sum_j a_ij^2`.
fn spai0_diagonal(a: &SparseMatrix) -> Vec<WeightT> {
    (0..a.size_m())
        .map(|i| {
            let a_ii = a.get(i, i);
            let sq_sum: WeightT = a.row(i).map(|(_, v)| v * v).sum();
            if sq_sum.abs() < WeightT::EPSILON {
                0.0
            } else {
                a_ii / sq_sum
            }
        })
        .collect()
}

fn galerkin_coarsen(a: &SparseMatrix, agg: &Aggregates) -> SparseMatrix {
    let mut coarse = SparseMatrix::new(agg.count, agg.count);
    for i in 0..a.size_m() {
        let ci = agg.owner[i];
        for (j, v) in a.row(i) {
            let cj = agg.owner[j];
            coarse.add(ci, cj, v);
        }
    }
    coarse
}

/// Dense Gaussian elimination with partial pivoting; only ever called on the
/// small coarse-level system, so density is not a concern.
fn dense_solve(a: &SparseMatrix, b: &[WeightT]) -> Vec<WeightT> {
    let n = a.size_m();
    let mut m: Vec<Vec<WeightT>> = (0..n)
        .map(|i| {
            let mut row = vec![0.0; n + 1];
            for (j, v) in a.row(i) {
                row[j] = v;
            }
            row[n] = b[i];
            row
        })
        .collect();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&r1, &r2| m[r1][col].abs().partial_cmp(&m[r2][col].abs()).unwrap())
            .unwrap();
        if m[pivot][col].abs() < 1e-300 {
            continue;
        }
        m.swap(col, pivot);
        let pivot_val = m[col][col];
        for k in col..=n {
            m[col][k] /= pivot_val;
        }
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = m[row][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..=n {
                m[row][k] -= factor * m[col][k];
            }
        }
    }

    (0..n).map(|i| m[i][n]).collect()
}

/// Two-level aggregation-AMG preconditioner, applied as `M^-1 r`.
pub struct AmgPreconditioner {
    smoother: Vec<WeightT>,
    coarse: Option<(Aggregates, SparseMatrix)>,
}

impl AmgPreconditioner {
    pub fn build(a: &SparseMatrix) -> Self {
        let smoother = spai0_diagonal(a);
        let coarse = if a.size_m() >= MIN_COARSENABLE {
            let agg = build_aggregates(a);
            if agg.count < a.size_m() {
                let coarse_matrix = galerkin_coarsen(a, &agg);
                Some((agg, coarse_matrix))
            } else {
                None
            }
        } else {
            None
        };
        AmgPreconditioner { smoother, coarse }
    }

    /// One V-cycle application of the preconditioner to residual `r`.
    pub fn apply(&self, a: &SparseMatrix, r: &[WeightT]) -> Vec<WeightT> {
        let n = r.len();
        let mut x: Vec<WeightT> = (0..n).map(|i| self.smoother[i] * r[i]).collect();

        if let Some((agg, coarse)) = &self.coarse {
            let ax = a.mul_vec(&x);
            let residual: Vec<WeightT> = r.iter().zip(&ax).map(|(ri, axi)| ri - axi).collect();

            let mut rc = vec![0.0; agg.count];
            for i in 0..n {
                rc[agg.owner[i]] += residual[i];
            }

            let ec = dense_solve(coarse, &rc);

            for i in 0..n {
                x[i] += ec[agg.owner[i]];
            }

            let ax2 = a.mul_vec(&x);
            for i in 0..n {
                x[i] += self.smoother[i] * (r[i] - ax2[i]);
            }
        }

        x
    }
}
