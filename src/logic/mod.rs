//! Detection engine: model primitives, rules, the per-appliance detector,
//! the monitor service that serializes ingestion, and event fan-out.

pub mod model;
pub mod rules;
pub mod detector;
pub mod broadcast;
pub mod monitor;

pub use broadcast::{Broadcaster, EventPublisher, Subscription};
pub use detector::{AnomalyDetector, AnomalyVerdict, Classification, Outcome};
pub use monitor::Monitor;
