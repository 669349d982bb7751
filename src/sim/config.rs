// Simulation configuration

use crate::core::Amount;
use crate::network::GraphLimits;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Genesis is mined synchronously at start-up, so it stays cheap
pub const MAX_GENESIS_DIFFICULTY: usize = 4;

/// Tunables for one simulation run. Every field has a default, so a
/// config file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub node_count: usize,
    /// Leading '0' hex characters required of regular blocks
    pub difficulty: usize,
    pub genesis_difficulty: usize,

    pub initial_interval_ms: u64,
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    pub interval_step_ms: u64,
    /// Block spacing the scheduler steers towards
    pub target_block_time_ms: u64,
    /// Nonce trials per mining attempt before it is abandoned
    pub max_attempts: u64,
    /// Nonce trials per tick
    pub attempts_per_slice: u64,

    pub max_new_connections: usize,
    pub max_connections: usize,
    pub connection_radius: f64,
    pub world_width: f64,
    pub world_height: f64,

    /// Transit time of a flooded payload before it is applied
    pub delivery_delay_ms: u64,
    /// 0 disables the random-send generator
    pub random_send_interval_ms: u64,
    pub random_send_max: Amount,

    pub strict_validation: bool,
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            node_count: 12,
            difficulty: 3,
            genesis_difficulty: 1,
            initial_interval_ms: 3500,
            min_interval_ms: 500,
            max_interval_ms: 20_000,
            interval_step_ms: 500,
            target_block_time_ms: 15_000,
            max_attempts: 100,
            attempts_per_slice: 2,
            max_new_connections: 6,
            max_connections: 8,
            connection_radius: 200.0,
            world_width: 1000.0,
            world_height: 700.0,
            delivery_delay_ms: 600,
            random_send_interval_ms: 2000,
            random_send_max: Amount::from_coins(2),
            strict_validation: false,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Load a JSON config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let json = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: SimConfig =
            serde_json::from_str(json).map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the simulation cannot run with
    pub fn validate(&self) -> Result<(), String> {
        // 64 hex characters in a hash
        if self.difficulty > 64 {
            return Err("Difficulty cannot exceed 64".to_string());
        }
        if self.genesis_difficulty > MAX_GENESIS_DIFFICULTY {
            return Err(format!(
                "genesis_difficulty cannot exceed {}",
                MAX_GENESIS_DIFFICULTY
            ));
        }
        if self.attempts_per_slice == 0 {
            return Err("attempts_per_slice must be at least 1".to_string());
        }
        if self.min_interval_ms > self.max_interval_ms {
            return Err("min_interval_ms exceeds max_interval_ms".to_string());
        }
        if !(self.min_interval_ms..=self.max_interval_ms).contains(&self.initial_interval_ms) {
            return Err("initial_interval_ms outside [min_interval_ms, max_interval_ms]".to_string());
        }
        if self.world_width <= 0.0 || self.world_height <= 0.0 {
            return Err("World dimensions must be positive".to_string());
        }
        Ok(())
    }

    pub fn graph_limits(&self) -> GraphLimits {
        GraphLimits {
            max_new_connections: self.max_new_connections,
            max_connections: self.max_connections,
            radius: self.connection_radius,
        }
    }
}
