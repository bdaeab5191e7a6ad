//! Reads a set of state identifiers from a whitespace-separated integer
//! stream, used to populate target sets.

use crate::error::{CoreError, Result};
use shared::StateT;
use std::collections::BTreeSet;
use std::io::Read;

pub type TargetSet = BTreeSet<StateT>;

pub fn read_intset<R: Read>(mut reader: R) -> Result<TargetSet> {
    let mut contents = String::new();
    reader
        .read_to_string(&mut contents)
        .map_err(|e| CoreError::FileOpenFailed {
            path: "<stream>".to_string(),
            source: e,
        })?;
    parse_intset(&contents)
}

pub fn parse_intset(contents: &str) -> Result<TargetSet> {
    contents
        .split_whitespace()
        .map(|token| {
            token.parse::<StateT>().map_err(|_| {
                CoreError::ParseError {
                    what: "integer set".to_string(),
                    line: 0,
                    reason: format!("'{}' is not a non-negative integer", token),
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whitespace_separated_integers() {
        let set = parse_intset("1 2\n3\t4").unwrap();
        assert_eq!(set, [1, 2, 3, 4].into_iter().collect());
    }

    #[test]
    fn rejects_non_numeric_token() {
        assert!(parse_intset("1 two 3").is_err());
    }

    #[test]
    fn empty_input_yields_empty_set() {
        assert!(parse_intset("   \n  ").unwrap().is_empty());
    }
}
