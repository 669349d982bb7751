// CLI arguments

use clap::Parser;
use crate::sim::SimConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "utxo-sim")]
#[command(about = "Miniature UTXO network simulation", long_about = None)]
pub struct Cli {
    /// JSON config file; flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of active nodes
    #[arg(short, long)]
    pub nodes: Option<usize>,

    /// RNG seed for a repeatable run
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Host tick period in milliseconds
    #[arg(long, default_value = "50")]
    pub tick_ms: u64,

    /// Wall-clock run time in seconds
    #[arg(short, long, default_value = "60")]
    pub duration_secs: u64,

    /// Validate every block and transaction on acceptance
    #[arg(long)]
    pub strict: bool,
}

impl Cli {
    /// Resolve the effective simulation config
    pub fn sim_config(&self) -> Result<SimConfig, String> {
        let mut config = match &self.config {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                SimConfig::load(path)?
            }
            None => SimConfig::default(),
        };

        if let Some(nodes) = self.nodes {
            config.node_count = nodes;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if self.strict {
            config.strict_validation = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from(["utxo-sim", "--nodes", "30", "--seed", "9", "--strict"]);
        let config = cli.sim_config().unwrap();

        assert_eq!(config.node_count, 30);
        assert_eq!(config.seed, Some(9));
        assert!(config.strict_validation);
        assert_eq!(cli.tick_ms, 50);
        assert_eq!(cli.duration_secs, 60);
    }

    #[test]
    fn test_missing_config_file() {
        let cli = Cli::parse_from(["utxo-sim", "--config", "/nonexistent/sim.json"]);
        assert!(cli.sim_config().is_err());
    }
}
