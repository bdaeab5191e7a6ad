mod amg;
mod error;
mod matrix;
mod solver;

pub use error::SparseError;
pub use matrix::{SparseMatrix, SparseRow};
pub use solver::{solve, SolverConfig};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtract_identity_on_square_matrix() {
        let mut m = SparseMatrix::new(2, 2);
        m.set(0, 0, 0.5);
        m.set(0, 1, 0.5);
        m.subtract_identity().unwrap();
        assert_eq!(m.get(0, 0), -0.5);
        assert_eq!(m.get(0, 1), 0.5);
    }

    #[test]
    fn subtract_identity_rejects_non_square() {
        let mut m = SparseMatrix::new(2, 3);
        assert!(m.subtract_identity().is_err());
    }

    #[test]
    fn mul_vec_matches_dense_expectation() {
        let mut m = SparseMatrix::new(2, 2);
        m.set(0, 0, 1.0);
        m.set(0, 1, 2.0);
        m.set(1, 0, 3.0);
        m.set(1, 1, 4.0);
        let y = m.mul_vec(&[1.0, 1.0]);
        assert_eq!(y, vec![3.0, 7.0]);
    }

    #[test]
    fn solve_trivial_diagonal_system() {
        let mut a = SparseMatrix::new(2, 2);
        a.set(0, 0, 2.0);
        a.set(1, 1, 4.0);
        let x = solve(&a, &[4.0, 8.0], &SolverConfig::default());
        assert!((x[0] - 2.0).abs() < 1e-8);
        assert!((x[1] - 2.0).abs() < 1e-8);
    }

    #[test]
    fn solve_small_dense_system() {
        // [ 4 1 ] [x0]   [1]
        // [ 1 3 ] [x1] = [2]
        let mut a = SparseMatrix::new(2, 2);
        a.set(0, 0, 4.0);
        a.set(0, 1, 1.0);
        a.set(1, 0, 1.0);
        a.set(1, 1, 3.0);
        let x = solve(&a, &[1.0, 2.0], &SolverConfig::default());
        // exact solution: x0 = 1/11, x1 = 7/11
        assert!((x[0] - 1.0 / 11.0).abs() < 1e-6);
        assert!((x[1] - 7.0 / 11.0).abs() < 1e-6);
    }

    #[test]
    fn solve_zero_rhs_returns_zero_vector() {
        let a = SparseMatrix::new(3, 3);
        let x = solve(&a, &[0.0, 0.0, 0.0], &SolverConfig::default());
        assert_eq!(x, vec![0.0, 0.0, 0.0]);
    }
}
