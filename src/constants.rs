//! Central Configuration Constants
//!
//! Single source of truth for detector thresholds and server defaults.
//! Detector values are fixed; only server settings are read from the environment
//! (see `config.rs`).

// ============================================================================
// DETECTOR
// ============================================================================

/// Readings below this power (Watts) are treated as OFF / standby
pub const OFF_THRESHOLD_W: f64 = 2.0;

/// Minimum number of observed samples before the model may score
pub const COLD_START_SAMPLES: u64 = 50;

/// Retrain the model every N observed samples
pub const RETRAIN_INTERVAL: u64 = 10;

/// Number of most recent values the scaler and model are fit on
pub const TRAINING_WINDOW: usize = 100;

/// Expected fraction of outliers in the training window
pub const CONTAMINATION: f64 = 0.1;

/// Number of recent values averaged by the jump-suppression rule
pub const JUMP_WINDOW: usize = 30;

/// Deviations (Watts) from the recent average below this are never anomalies
pub const MIN_JUMP_W: f64 = 20.0;

/// Capacity of the long history buffer
pub const HISTORY_CAPACITY: usize = 500;

// ============================================================================
// ISOLATION FOREST
// ============================================================================

/// Number of trees in the ensemble
pub const FOREST_TREES: usize = 100;

/// Upper bound on the sub-sample drawn for each tree
pub const FOREST_MAX_SAMPLES: usize = 256;

/// Seed used for every refit, so a fit is a pure function of its window
pub const FOREST_SEED: u64 = 42;

// ============================================================================
// SERVER DEFAULTS
// ============================================================================

/// Default listen port
pub const DEFAULT_PORT: u16 = 5001;

/// Default monitored appliance identifier
pub const DEFAULT_APPLIANCE_ID: &str = "bulb";

/// Default monitored appliance display name
pub const DEFAULT_APPLIANCE_NAME: &str = "Bulb";

/// Default number of buffered events per observer before it starts lagging
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
