//! Sensor reading model
//!
//! `TelemetryPayload` is the wire schema posted by the metering device.
//! Every field is optional and decoded leniently; `SensorReading` is the
//! fully-typed value the detector works with.

use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// Inbound telemetry frame. Absent or garbled fields decode to 0.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TelemetryPayload {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub voltage: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub current: f64,
    /// Active power in Watts
    #[serde(default, deserialize_with = "lenient_f64")]
    pub power: f64,
    /// Accumulated energy in kWh
    #[serde(default, deserialize_with = "lenient_f64")]
    pub energy: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub frequency: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pf: f64,
}

impl TelemetryPayload {
    /// Parse a raw request body.
    ///
    /// The body must be a non-empty JSON object; anything else is rejected
    /// before any detector state is touched.
    pub fn parse(body: &[u8]) -> AppResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(AppError::InvalidPayload("empty body".to_string()));
        }

        let value: Value = serde_json::from_slice(body)
            .map_err(|e| AppError::InvalidPayload(format!("malformed JSON: {}", e)))?;

        match &value {
            Value::Object(map) if map.is_empty() => {
                return Err(AppError::InvalidPayload("empty JSON object".to_string()));
            }
            Value::Object(_) => {}
            _ => return Err(AppError::InvalidPayload("expected a JSON object".to_string())),
        }

        serde_json::from_value(value)
            .map_err(|e| AppError::InvalidPayload(format!("unexpected payload shape: {}", e)))
    }

    /// Stamp the payload with its arrival time
    pub fn into_reading(self, received_at: DateTime<Local>) -> SensorReading {
        SensorReading {
            voltage: self.voltage,
            current: self.current,
            power_watts: self.power,
            energy_kwh: self.energy,
            frequency_hz: self.frequency,
            power_factor: self.pf,
            received_at,
        }
    }
}

/// A single validated telemetry sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub voltage: f64,
    pub current: f64,
    pub power_watts: f64,
    pub energy_kwh: f64,
    pub frequency_hz: f64,
    pub power_factor: f64,
    pub received_at: DateTime<Local>,
}

impl SensorReading {
    /// Reading with only the power channel populated, stamped now
    pub fn from_power(power_watts: f64) -> Self {
        TelemetryPayload {
            power: power_watts,
            ..Default::default()
        }
        .into_reading(Local::now())
    }

    /// Instantaneous consumption in kW
    pub fn consumption_kw(&self) -> f64 {
        self.power_watts / 1000.0
    }

    /// Wall-clock arrival time as `HH:MM:SS`
    pub fn timestamp(&self) -> String {
        self.received_at.format("%H:%M:%S").to_string()
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(coerce_f64).unwrap_or(0.0))
}

fn coerce_f64(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        // Some firmware sends readings as strings
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => v,
        _ => {
            tracing::debug!("Garbled telemetry field {}, defaulting to 0", value);
            0.0
        }
    }
}
