//! Command-line interface for the headless runtime

use clap::Parser;
use std::path::PathBuf;

/// Headless survivors simulation
#[derive(Parser, Debug)]
#[command(name = "survivors")]
#[command(about = "Runs the survivors simulation without a renderer")]
#[command(version)]
pub struct Args {
    /// JSON settings file (defaults are used when omitted)
    #[arg(long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Stop after this many ticks; overrides `simulation.max_ticks`
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Spawner seed; overrides `scene.spawner.seed`
    #[arg(long)]
    pub seed: Option<u32>,

    /// Replay movement from a JSON input recording instead of circling
    #[arg(long, value_name = "INPUT_FILE")]
    pub input: Option<PathBuf>,

    /// Write the effective settings to this path and exit
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub dump_config: Option<PathBuf>,
}

pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_parse() {
        let args = Args::parse_from(["survivors", "--ticks", "600", "--seed", "9"]);
        assert_eq!(args.ticks, Some(600));
        assert_eq!(args.seed, Some(9));
        assert!(args.config.is_none());
        assert!(args.input.is_none());
    }

    #[test]
    fn input_recording_path_parses() {
        let args = Args::parse_from(["survivors", "--input", "run.json"]);
        assert_eq!(args.input, Some(PathBuf::from("run.json")));
    }
}
