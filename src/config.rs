//! Configuration module

use std::env;

use crate::constants::*;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Identifier of the monitored appliance
    pub appliance_id: String,

    /// Display name of the monitored appliance
    pub appliance_name: String,

    /// Per-observer event buffer before lagging
    pub broadcast_capacity: usize,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),

            appliance_id: env::var("APPLIANCE_ID")
                .unwrap_or_else(|_| DEFAULT_APPLIANCE_ID.to_string()),

            appliance_name: env::var("APPLIANCE_NAME")
                .unwrap_or_else(|_| DEFAULT_APPLIANCE_NAME.to_string()),

            broadcast_capacity: env::var("BROADCAST_CAPACITY")
                .ok()
                .and_then(|c| c.parse().ok())
                .filter(|c: &usize| *c > 0)
                .unwrap_or(DEFAULT_BROADCAST_CAPACITY),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            appliance_id: DEFAULT_APPLIANCE_ID.to_string(),
            appliance_name: DEFAULT_APPLIANCE_NAME.to_string(),
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
            environment: "development".to_string(),
        }
    }
}

/// Detector tuning. Defaults are the fixed production constants.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub off_threshold_w: f64,
    pub cold_start_samples: u64,
    pub retrain_interval: u64,
    pub training_window: usize,
    pub contamination: f64,
    pub jump_window: usize,
    pub min_jump_w: f64,
    pub history_capacity: usize,
    pub forest_trees: usize,
    pub forest_max_samples: usize,
    pub forest_seed: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            off_threshold_w: OFF_THRESHOLD_W,
            cold_start_samples: COLD_START_SAMPLES,
            retrain_interval: RETRAIN_INTERVAL,
            training_window: TRAINING_WINDOW,
            contamination: CONTAMINATION,
            jump_window: JUMP_WINDOW,
            min_jump_w: MIN_JUMP_W,
            history_capacity: HISTORY_CAPACITY,
            forest_trees: FOREST_TREES,
            forest_max_samples: FOREST_MAX_SAMPLES,
            forest_seed: FOREST_SEED,
        }
    }
}
