use std::path::PathBuf;

use clap::Parser;

use crate::cache::Geometry;
use crate::error::SimulatorResult;
use crate::run_wrapper::SimPolicy;

/// Set-associative LRU cache simulator.
/// Replays a memory trace and prints hit, miss and eviction counts.
#[derive(Parser, Debug)]
#[command(name = "csim", version)]
pub struct CsimArgs {
    /// Number of set index bits (the cache has 2^s sets).
    #[arg(short = 's', value_name = "s")]
    pub set_bits: u32,

    /// Associativity (number of lines per set).
    #[arg(short = 'E', value_name = "E")]
    pub associativity: usize,

    /// Number of block bits (blocks are 2^b bytes).
    #[arg(short = 'b', value_name = "b")]
    pub block_bits: u32,

    /// Trace file to replay.
    #[arg(short = 't', value_name = "tracefile")]
    pub trace_file: PathBuf,

    /// Print every access with its outcome.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl CsimArgs {
    pub fn policy(&self) -> SimulatorResult<SimPolicy> {
        Ok(SimPolicy {
            geometry: Geometry::from_bits(
                self.set_bits,
                self.associativity,
                self.block_bits,
            )?,
            verbose: self.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeometryError;
    use crate::error::SimulatorError;

    #[test]
    fn test_parse_flags() {
        let args = CsimArgs::try_parse_from([
            "csim",
            "-v",
            "-s",
            "4",
            "-E",
            "2",
            "-b",
            "4",
            "-t",
            "traces/yi.trace",
        ])
        .unwrap();
        assert!(args.verbose);
        assert_eq!(args.trace_file, PathBuf::from("traces/yi.trace"));
        let policy = args.policy().unwrap();
        assert_eq!(policy.geometry, Geometry::make(16, 2, 16));
    }

    #[test]
    fn test_missing_flag() {
        let args = ["csim", "-s", "4", "-E", "1", "-b", "4"];
        assert!(CsimArgs::try_parse_from(args).is_err());
    }

    #[test]
    fn test_zero_associativity() {
        let args = CsimArgs::try_parse_from([
            "csim", "-s", "0", "-E", "0", "-b", "0", "-t", "t.trace",
        ])
        .unwrap();
        assert!(matches!(
            args.policy(),
            Err(SimulatorError::GeometryError(GeometryError::ZeroAssociativity))
        ));
    }
}
