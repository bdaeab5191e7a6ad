//! Type aliases shared between the sparse-matrix layer and the core engine.

/// Identifier type for Markov chain states.
pub type StateT = u32;
/// Floating-point type used throughout for probabilities, rewards and results.
pub type WeightT = f64;
