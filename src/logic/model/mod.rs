//! Model Module - history, standardization and outlier scoring
//!
//! Each piece is a plain owned value; the detector composes them and the
//! monitor provides the locking.

pub mod buffer;
pub mod scaler;
pub mod tree;
pub mod forest;

// Re-export common types
pub use buffer::{HistoryBuffer, BufferStatus};
pub use scaler::{StandardScaler, ScalerParams};
pub use forest::{IsolationForest, ForestConfig, ForestStats, OutlierScore};
