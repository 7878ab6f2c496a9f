//! Command-line interface for the boss director
//!
//! Supports both graphical observer (default) and headless modes.

use clap::Parser;
use std::path::PathBuf;

/// Boss encounter director simulator
#[derive(Parser, Debug)]
#[command(name = "boss-director")]
#[command(about = "Boss encounter director simulator")]
#[command(version)]
pub struct Args {
    /// Run in headless mode with the specified JSON encounter file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub headless: Option<PathBuf>,

    /// Boss profile RON file (overrides the encounter file)
    #[arg(long, value_name = "PROFILE")]
    pub profile: Option<PathBuf>,

    /// Output path for the encounter log (headless mode only)
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum encounter duration in seconds (headless mode only)
    #[arg(long)]
    pub max_duration: Option<f32>,

    /// Random seed for deterministic runs
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_args() {
        let args = Args::parse_from([
            "boss-director",
            "--headless",
            "encounter.json",
            "--max-duration",
            "60",
            "--seed",
            "7",
        ]);
        assert_eq!(args.headless, Some(PathBuf::from("encounter.json")));
        assert_eq!(args.max_duration, Some(60.0));
        assert_eq!(args.seed, Some(7));
        assert!(args.output.is_none());
    }

    #[test]
    fn test_defaults_to_graphical() {
        let args = Args::parse_from(["boss-director"]);
        assert!(args.headless.is_none());
        assert!(args.profile.is_none());
    }
}
