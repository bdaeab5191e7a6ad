//! Readers for the PRISM explicit-model file formats: `.tra` (transitions),
//! `.trew` (transition rewards) and plain label files.

use crate::chain::Chain;
use crate::error::{CoreError, Result};
use crate::intset::TargetSet;
use crate::regexes::{PRISM_FILE_HEADER, PRISM_LABEL_LINE, PRISM_VALUE_LINE};
use shared::StateT;
use std::io::BufRead;

fn parse_error(what: &str, line: usize, reason: impl Into<String>) -> CoreError {
    CoreError::ParseError {
        what: what.to_string(),
        line,
        reason: reason.into(),
    }
}

/// Reads a PRISM `.tra` file into `mc`, which must already have room for at
/// least one edge decoration slot (edges start with zero reward).
///
/// The header's claimed state and transition counts are not required to
/// match the observed body; a mismatch is logged as a warning, not a
/// failure — mirroring the reference reader, which treats the header as
/// advisory sizing information.
pub fn read_tra<R: BufRead>(mc: &mut Chain, reader: R) -> Result<()> {
    let mut lines = reader.lines();
    let header_line = lines
        .next()
        .ok_or_else(|| parse_error("PRISM .tra header", 1, "file is empty"))?
        .map_err(|e| CoreError::FileOpenFailed {
            path: "<stream>".to_string(),
            source: e,
        })?;

    let header = PRISM_FILE_HEADER
        .captures(&header_line)
        .ok_or_else(|| parse_error("PRISM .tra header", 1, "does not match '<states> <transitions>'"))?;
    let declared_states: usize = header[1].parse().unwrap();
    let declared_transitions: usize = header[2].parse().unwrap();

    let mut observed_transitions = 0usize;
    for (offset, line) in lines.enumerate() {
        let line_number = offset + 2;
        let line = line.map_err(|e| CoreError::FileOpenFailed {
            path: "<stream>".to_string(),
            source: e,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let caps = PRISM_VALUE_LINE.captures(&line).ok_or_else(|| {
            parse_error("PRISM .tra body", line_number, "does not match '<from> <to> <probability>'")
        })?;
        let from: StateT = caps[1].parse().unwrap();
        let to: StateT = caps[2].parse().unwrap();
        let probability: f64 = caps[3].parse().unwrap();
        mc.add_edge(from, to, probability).map_err(|e| match e {
            CoreError::EdgeExists { from, to } => CoreError::InvalidArgument(format!(
                "line {}: duplicate transition ({} -> {})",
                line_number, from, to
            )),
            other => other,
        })?;
        observed_transitions += 1;
    }

    if observed_transitions != declared_transitions {
        log::warn!(
            "PRISM .tra header declared {} transitions, observed {}",
            declared_transitions,
            observed_transitions
        );
    }
    if mc.size_states() != declared_states {
        log::warn!(
            "PRISM .tra header declared {} states, observed {}",
            declared_states,
            mc.size_states()
        );
    }
    Ok(())
}

/// Reads a PRISM `.trew` file, writing each transition's reward into edge
/// decoration slot `reward_index`. Fails if a reward line refers to an edge
/// absent from `mc`; warns (does not fail) on overwriting an existing value.
pub fn read_trew<R: BufRead>(mc: &mut Chain, reader: R, reward_index: usize) -> Result<()> {
    let mut lines = reader.lines();
    let header_line = lines
        .next()
        .ok_or_else(|| parse_error("PRISM .trew header", 1, "file is empty"))?
        .map_err(|e| CoreError::FileOpenFailed {
            path: "<stream>".to_string(),
            source: e,
        })?;
    PRISM_FILE_HEADER
        .captures(&header_line)
        .ok_or_else(|| parse_error("PRISM .trew header", 1, "does not match '<states> <transitions>'"))?;

    for (offset, line) in lines.enumerate() {
        let line_number = offset + 2;
        let line = line.map_err(|e| CoreError::FileOpenFailed {
            path: "<stream>".to_string(),
            source: e,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let caps = PRISM_VALUE_LINE.captures(&line).ok_or_else(|| {
            parse_error("PRISM .trew body", line_number, "does not match '<from> <to> <reward>'")
        })?;
        let from: StateT = caps[1].parse().unwrap();
        let to: StateT = caps[2].parse().unwrap();
        let reward: f64 = caps[3].parse().unwrap();

        let previous = mc.edge_decoration(from, to, reward_index)?;
        if previous != 0.0 {
            log::warn!("overwriting existing reward on edge ({}, {})", from, to);
        }
        mc.set_edge_decoration(from, to, reward_index, reward)?;
    }
    Ok(())
}

/// Reads a PRISM label file; a state is included in `target` iff one of its
/// labels equals `label_id`.
pub fn read_label<R: BufRead>(reader: R, label_id: StateT, target: &mut TargetSet) -> Result<()> {
    for (offset, line) in reader.lines().enumerate() {
        let line_number = offset + 1;
        let line = line.map_err(|e| CoreError::FileOpenFailed {
            path: "<stream>".to_string(),
            source: e,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let caps = PRISM_LABEL_LINE.captures(&line).ok_or_else(|| {
            parse_error("PRISM label file", line_number, "does not match '<state>: <labels>'")
        })?;
        let state: StateT = caps[1].parse().unwrap();
        let has_label = caps[2]
            .split_whitespace()
            .any(|token| token.parse::<StateT>() == Ok(label_id));
        if has_label {
            target.insert(state);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_simple_tra_file() {
        let data = "2 1\n0 1 1.0\n";
        let mut mc = Chain::new(0, 0);
        read_tra(&mut mc, Cursor::new(data)).unwrap();
        assert_eq!(mc.size_states(), 2);
        assert_eq!(mc.size_edges(), 1);
        assert_eq!(mc.edge_probability(0, 1).unwrap(), 1.0);
    }

    #[test]
    fn rejects_malformed_header() {
        let mut mc = Chain::new(0, 0);
        assert!(read_tra(&mut mc, Cursor::new("not a header\n")).is_err());
    }

    #[test]
    fn reads_trew_rewards_onto_existing_edges() {
        let mut mc = Chain::new(1, 0);
        mc.add_edge(0, 1, 1.0).unwrap();
        let data = "2 1\n0 1 3.5\n";
        read_trew(&mut mc, Cursor::new(data), 0).unwrap();
        assert_eq!(mc.edge_decoration(0, 1, 0).unwrap(), 3.5);
    }

    #[test]
    fn trew_fails_on_missing_edge() {
        let mut mc = Chain::new(1, 0);
        let data = "2 1\n0 1 3.5\n";
        assert!(read_trew(&mut mc, Cursor::new(data), 0).is_err());
    }

    #[test]
    fn reads_label_file() {
        let data = "0: 1 2\n1: 2\n2: 1\n";
        let mut target = TargetSet::new();
        read_label(Cursor::new(data), 2, &mut target).unwrap();
        assert_eq!(target, [0, 1].into_iter().collect());
    }
}
