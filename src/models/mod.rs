//! Data models

pub mod reading;
pub mod events;
pub mod response;

pub use reading::*;
pub use events::*;
pub use response::*;

/// Round to a fixed number of decimal places for wire output
pub(crate) fn round_dp(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
