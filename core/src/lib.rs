//! Core engine for computing path-reward statistics (expectation, variance,
//! covariance) on discrete-time Markov chains until absorption into a target
//! state set, plus the Herman self-stabilisation chain generator and the
//! file readers / dispatcher that drive them end to end.

pub mod analyzer;
pub mod calc;
pub mod chain;
pub mod dispatcher;
pub mod error;
pub mod herman;
pub mod intset;
pub mod io;
pub mod regexes;

pub use chain::Chain;
pub use dispatcher::Dispatcher;
pub use error::{CoreError, Result};
pub use intset::TargetSet;
