//! HTTP handlers

pub mod health;
pub mod telemetry;
pub mod stream;
pub mod status;
