//! Emits a chain's state decorations as plain text, one state per line.

use crate::chain::Chain;
use crate::error::{CoreError, Result};
use std::io::Write;

pub fn write_state_decorations<W: Write>(mc: &Chain, mut writer: W) -> Result<()> {
    for id in mc.state_ids() {
        let values: Vec<String> = (0..mc.n_node_decorations())
            .map(|k| mc.state_decoration(id, k).unwrap().to_string())
            .collect();
        writeln!(writer, "{} {}", id, values.join(" ")).map_err(|e| CoreError::FileOpenFailed {
            path: "<stream>".to_string(),
            source: e,
        })?;
    }
    Ok(())
}
