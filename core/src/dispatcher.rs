//! Line-oriented command dispatcher: reads `>`-separated command lines,
//! routes them to the core engine, and emits one JSON record per command to
//! a structured log.

use crate::calc;
use crate::chain::Chain;
use crate::error::{CoreError, Result};
use crate::herman::generate_herman;
use crate::intset::{parse_intset, TargetSet};
use crate::io::gmc::read_gmc;
use crate::io::prism::{read_label, read_tra, read_trew};
use crate::io::writer::write_state_decorations;
use serde_json::{json, Value};
use shared::StateT;
use sparse::SolverConfig;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};

type Id = u32;

/// Named registry of live chains and target sets, mirroring the reference
/// implementation's id-keyed global tables.
#[derive(Default)]
pub struct Global {
    chains: BTreeMap<Id, Chain>,
    targets: BTreeMap<Id, TargetSet>,
}

pub struct Dispatcher {
    global: Global,
    config: SolverConfig,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher {
            global: Global::default(),
            config: SolverConfig::default(),
        }
    }
}

fn parse_arg<T: std::str::FromStr>(tokens: &[&str], index: usize, what: &str) -> Result<T> {
    tokens
        .get(index)
        .ok_or_else(|| CoreError::InvalidArgument(format!("missing argument: {}", what)))?
        .trim()
        .parse::<T>()
        .map_err(|_| CoreError::InvalidArgument(format!("invalid {}: '{}'", what, tokens[index])))
}

fn require_chain<'a>(global: &'a mut Global, id: Id) -> Result<&'a mut Chain> {
    global
        .chains
        .get_mut(&id)
        .ok_or_else(|| CoreError::InvalidArgument(format!("no chain with id {}", id)))
}

fn require_target<'a>(global: &'a Global, id: Id) -> Result<&'a TargetSet> {
    global
        .targets
        .get(&id)
        .ok_or_else(|| CoreError::InvalidArgument(format!("no target set with id {}", id)))
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes one command line, returning the JSON record to append to the
    /// structured log. The caller decides what to do with a returned error
    /// (the REPL loop logs it and continues with the next line).
    pub fn execute(&mut self, line: &str) -> Result<Value> {
        let line = line.trim();
        let tokens: Vec<&str> = line.split('>').map(str::trim).collect();
        let command = tokens[0];
        let args = &tokens[1..];

        match command {
            "reset_mc" => self.cmd_reset_mc(args),
            "read_tra" => self.cmd_read_tra(args),
            "read_gmc" => self.cmd_read_gmc(args),
            "add_rew" => self.cmd_add_rew(args),
            "read_target" => self.cmd_read_target(args),
            "read_label" => self.cmd_read_label(args),
            "calc_expect" => self.cmd_calc_expect(args),
            "calc_variance" => self.cmd_calc_variance(args),
            "calc_covariance" => self.cmd_calc_covariance(args),
            "write_state_decorations" => self.cmd_write_state_decorations(args),
            "generate_herman" => self.cmd_generate_herman(args),
            "del_mc" => self.cmd_del_mc(args),
            "del_ts" => self.cmd_del_ts(args),
            "print_mc" => self.cmd_print_mc(args),
            other => Err(CoreError::InvalidArgument(format!(
                "unrecognised command '{}'",
                other
            ))),
        }
    }

    /// Runs every line of `input` through [`execute`]; failed commands are
    /// logged and do not abort the stream. Every successful command's JSON
    /// record is appended, newline-delimited, to `json_log` if present.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut json_log: Option<W>) -> Result<()> {
        for (line_number, line) in input.lines().enumerate() {
            let line = line.map_err(|e| CoreError::FileOpenFailed {
                path: "<stdin>".to_string(),
                source: e,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            match self.execute(&line) {
                Ok(record) => {
                    if let Some(sink) = json_log.as_mut() {
                        writeln!(sink, "{}", record).map_err(|e| CoreError::FileOpenFailed {
                            path: "<json-log>".to_string(),
                            source: e,
                        })?;
                    }
                }
                Err(e) => {
                    log::error!("command at line {} failed: {}", line_number + 1, e);
                }
            }
        }
        Ok(())
    }

    fn cmd_reset_mc(&mut self, args: &[&str]) -> Result<Value> {
        let id: Id = parse_arg(args, 0, "mc_id")?;
        let n_node_decos: usize = parse_arg(args, 1, "n_state_decorations")?;
        let n_edge_decos: usize = parse_arg(args, 2, "n_edge_decorations")?;
        self.global
            .chains
            .insert(id, Chain::new(n_edge_decos, n_node_decos));
        Ok(json!({ "reset_mc": { "mc_id": id } }))
    }

    fn cmd_read_tra(&mut self, args: &[&str]) -> Result<Value> {
        let id: Id = parse_arg(args, 0, "mc_id")?;
        let path: &str = args.get(1).ok_or_else(|| {
            CoreError::InvalidArgument("missing argument: path".to_string())
        })?;
        let file = open_file(path)?;
        let mc = require_chain(&mut self.global, id)?;
        read_tra(mc, BufReader::new(file))?;
        Ok(json!({ "read_tra": { "mc_id": id, "file_path": path } }))
    }

    fn cmd_read_gmc(&mut self, args: &[&str]) -> Result<Value> {
        let id: Id = parse_arg(args, 0, "mc_id")?;
        let path: &str = args.get(1).ok_or_else(|| {
            CoreError::InvalidArgument("missing argument: path".to_string())
        })?;
        let file = open_file(path)?;
        let mc = require_chain(&mut self.global, id)?;
        read_gmc(mc, BufReader::new(file))?;
        Ok(json!({ "read_gmc": { "mc_id": id, "file_path": path } }))
    }

    fn cmd_add_rew(&mut self, args: &[&str]) -> Result<Value> {
        let id: Id = parse_arg(args, 0, "mc_id")?;
        let path: &str = args.get(1).ok_or_else(|| {
            CoreError::InvalidArgument("missing argument: path".to_string())
        })?;
        let deco_index: usize = parse_arg(args, 2, "reward_index")?;
        let file = open_file(path)?;
        let mc = require_chain(&mut self.global, id)?;
        read_trew(mc, BufReader::new(file), deco_index)?;
        Ok(json!({ "add_rew": { "mc_id": id, "file_path": path, "deco_index": deco_index } }))
    }

    fn cmd_read_target(&mut self, args: &[&str]) -> Result<Value> {
        let id: Id = parse_arg(args, 0, "ts_id")?;
        let path: &str = args.get(1).ok_or_else(|| {
            CoreError::InvalidArgument("missing argument: path".to_string())
        })?;
        let contents = std::fs::read_to_string(path).map_err(|e| CoreError::FileOpenFailed {
            path: path.to_string(),
            source: e,
        })?;
        let target = parse_intset(&contents)?;
        self.global.targets.insert(id, target);
        Ok(json!({ "read_target": { "ts_id": id, "file_path": path } }))
    }

    fn cmd_read_label(&mut self, args: &[&str]) -> Result<Value> {
        let id: Id = parse_arg(args, 0, "ts_id")?;
        let path: &str = args.get(1).ok_or_else(|| {
            CoreError::InvalidArgument("missing argument: path".to_string())
        })?;
        let label_id: StateT = parse_arg(args, 2, "prism_label_id")?;
        let file = open_file(path)?;
        let target = self.global.targets.entry(id).or_default();
        read_label(BufReader::new(file), label_id, target)?;
        Ok(json!({ "read_label": { "ts_id": id, "file_path": path, "prism_label_id": label_id } }))
    }

    fn cmd_calc_expect(&mut self, args: &[&str]) -> Result<Value> {
        let mc_id: Id = parse_arg(args, 0, "mc_id")?;
        let r_in: usize = parse_arg(args, 1, "r_index")?;
        let ts_id: Id = parse_arg(args, 2, "ts_id")?;
        let s_out: usize = parse_arg(args, 3, "s_decoration_out")?;
        let target = require_target(&self.global, ts_id)?.clone();
        let mc = require_chain(&mut self.global, mc_id)?;
        let log = calc::expectation(mc, r_in, &target, s_out, &self.config)?;
        Ok(json!({ "calc_expect": { "mc_id": mc_id, "ts_id": ts_id }, "timings_ms": log }))
    }

    fn cmd_calc_variance(&mut self, args: &[&str]) -> Result<Value> {
        let mc_id: Id = parse_arg(args, 0, "mc_id")?;
        let r_in: usize = parse_arg(args, 1, "r_index")?;
        let ts_id: Id = parse_arg(args, 2, "ts_id")?;
        let s_out: usize = parse_arg(args, 3, "s_var_out")?;
        let e_slot: usize = parse_arg(args, 4, "s_expect")?;
        let r_free: usize = parse_arg(args, 5, "r_free")?;
        let target = require_target(&self.global, ts_id)?.clone();
        let mc = require_chain(&mut self.global, mc_id)?;
        let log = calc::variance(mc, r_in, &target, s_out, e_slot, r_free, &self.config)?;
        Ok(json!({ "calc_variance": { "mc_id": mc_id, "ts_id": ts_id }, "timings_ms": log }))
    }

    fn cmd_calc_covariance(&mut self, args: &[&str]) -> Result<Value> {
        let mc_id: Id = parse_arg(args, 0, "mc_id")?;
        let r1: usize = parse_arg(args, 1, "r1")?;
        let r2: usize = parse_arg(args, 2, "r2")?;
        let ts_id: Id = parse_arg(args, 3, "ts_id")?;
        let s_out: usize = parse_arg(args, 4, "s_cov_out")?;
        let e1: usize = parse_arg(args, 5, "s_e1")?;
        let e2: usize = parse_arg(args, 6, "s_e2")?;
        let r_free: usize = parse_arg(args, 7, "r_free")?;
        let target = require_target(&self.global, ts_id)?.clone();
        let mc = require_chain(&mut self.global, mc_id)?;
        let log = calc::covariance(mc, r1, r2, &target, s_out, e1, e2, r_free, &self.config)?;
        Ok(json!({ "calc_covariance": { "mc_id": mc_id, "ts_id": ts_id }, "timings_ms": log }))
    }

    fn cmd_write_state_decorations(&mut self, args: &[&str]) -> Result<Value> {
        let mc_id: Id = parse_arg(args, 0, "mc_id")?;
        let path: &str = args.get(1).ok_or_else(|| {
            CoreError::InvalidArgument("missing argument: path".to_string())
        })?;
        let mc = require_chain(&mut self.global, mc_id)?;
        let file = File::create(path).map_err(|e| CoreError::FileOpenFailed {
            path: path.to_string(),
            source: e,
        })?;
        write_state_decorations(mc, file)?;
        Ok(json!({ "write_state_decorations": { "mc_id": mc_id, "file_path": path } }))
    }

    fn cmd_generate_herman(&mut self, args: &[&str]) -> Result<Value> {
        let mc_id: Id = parse_arg(args, 0, "mc_id")?;
        let size: u32 = parse_arg(args, 1, "size")?;
        let ts_id: Id = parse_arg(args, 2, "ts_id")?;
        let Global { chains, targets } = &mut self.global;
        let mc = chains
            .get_mut(&mc_id)
            .ok_or_else(|| CoreError::InvalidArgument(format!("no chain with id {}", mc_id)))?;
        let target = targets.entry(ts_id).or_default();
        let started = std::time::Instant::now();
        generate_herman(mc, size, target)?;
        Ok(json!({
            "generate_herman": {
                "mc_id": mc_id, "size": size, "ts_id": ts_id,
                "size_nodes": mc.size_states(), "size_edges": mc.size_edges(),
            },
            "time_total_ms": started.elapsed().as_secs_f64() * 1000.0,
        }))
    }

    fn cmd_del_mc(&mut self, args: &[&str]) -> Result<Value> {
        let id: Id = parse_arg(args, 0, "mc_id")?;
        self.global.chains.remove(&id);
        Ok(json!({ "del_mc": { "mc_id": id } }))
    }

    fn cmd_del_ts(&mut self, args: &[&str]) -> Result<Value> {
        let id: Id = parse_arg(args, 0, "ts_id")?;
        self.global.targets.remove(&id);
        Ok(json!({ "del_ts": { "ts_id": id } }))
    }

    fn cmd_print_mc(&mut self, args: &[&str]) -> Result<Value> {
        let id: Id = parse_arg(args, 0, "mc_id")?;
        let mc = require_chain(&mut self.global, id)?;
        Ok(json!({
            "print_mc": {
                "mc_id": id,
                "size": mc.size_states(),
                "size_edges": mc.size_edges(),
            }
        }))
    }
}

fn open_file(path: &str) -> Result<File> {
    File::open(path).map_err(|e| CoreError::FileOpenFailed {
        path: path.to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reset_then_calc_expect_round_trip() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.execute("reset_mc>0>1>1").unwrap();
        {
            let mc = dispatcher.global.chains.get_mut(&0).unwrap();
            mc.add_edge(0, 1, 1.0).unwrap();
            mc.set_edge_decoration(0, 1, 0, 5.0).unwrap();
        }
        dispatcher.global.targets.insert(0, [1].into_iter().collect());
        dispatcher.execute("calc_expect>0>0>0>0").unwrap();
        let mc = dispatcher.global.chains.get(&0).unwrap();
        assert!((mc.state_decoration(0, 0).unwrap() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn unknown_command_fails_without_panicking() {
        let mut dispatcher = Dispatcher::new();
        assert!(dispatcher.execute("nonsense").is_err());
    }

    #[test]
    fn run_skips_bad_line_and_continues() {
        let mut dispatcher = Dispatcher::new();
        let script = "reset_mc>0>1>1\nnot_a_command\nprint_mc>0\n";
        dispatcher.run(Cursor::new(script), None::<std::io::Sink>).unwrap();
        assert!(dispatcher.global.chains.contains_key(&0));
    }
}
