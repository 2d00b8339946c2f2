//! Broadcast event payloads

use serde::{Deserialize, Serialize};

use super::round_dp;
use super::reading::SensorReading;
use crate::logic::detector::AnomalyVerdict;

/// Event names
pub mod names {
    pub const ENERGY_UPDATE: &str = "energy_update";
    pub const ANOMALY_ALERT: &str = "anomaly_alert";
    pub const CONNECTION_STATUS: &str = "connection_status";
}

/// Identity of the monitored load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appliance {
    pub id: String,
    pub name: String,
}

impl Appliance {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Per-sample telemetry update, emitted for every reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyUpdate {
    pub appliance_id: String,
    pub appliance_name: String,
    pub timestamp: String,
    pub consumption: f64,
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    pub energy: f64,
    pub frequency: f64,
    pub pf: f64,
    pub is_anomaly: bool,
    pub confidence: f64,
}

impl EnergyUpdate {
    pub fn new(appliance: &Appliance, reading: &SensorReading, verdict: AnomalyVerdict) -> Self {
        Self {
            appliance_id: appliance.id.clone(),
            appliance_name: appliance.name.clone(),
            timestamp: reading.timestamp(),
            consumption: round_dp(reading.consumption_kw(), 3),
            voltage: round_dp(reading.voltage, 2),
            current: round_dp(reading.current, 3),
            power: round_dp(reading.power_watts, 2),
            energy: round_dp(reading.energy_kwh, 3),
            frequency: round_dp(reading.frequency_hz, 1),
            pf: round_dp(reading.power_factor, 2),
            is_anomaly: verdict.is_anomaly,
            confidence: round_dp(verdict.confidence, 3),
        }
    }
}

/// Alert emitted only when the final verdict is anomalous
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyAlert {
    pub appliance_name: String,
    pub timestamp: String,
    pub consumption: f64,
    pub power: f64,
    pub voltage: f64,
    pub current: f64,
}

impl AnomalyAlert {
    pub fn new(appliance: &Appliance, reading: &SensorReading) -> Self {
        Self {
            appliance_name: appliance.name.clone(),
            timestamp: reading.timestamp(),
            consumption: round_dp(reading.consumption_kw(), 3),
            power: round_dp(reading.power_watts, 2),
            voltage: round_dp(reading.voltage, 2),
            current: round_dp(reading.current, 3),
        }
    }
}

/// Greeting sent to an observer right after it subscribes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub status: String,
    pub appliance_id: String,
    pub appliance_name: String,
}

impl ConnectionStatus {
    pub fn connected(appliance: &Appliance) -> Self {
        Self {
            status: "connected".to_string(),
            appliance_id: appliance.id.clone(),
            appliance_name: appliance.name.clone(),
        }
    }
}

/// Everything an observer can receive, framed as `{"event": .., "data": ..}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum MonitorEvent {
    EnergyUpdate(EnergyUpdate),
    AnomalyAlert(AnomalyAlert),
    ConnectionStatus(ConnectionStatus),
}

impl MonitorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MonitorEvent::EnergyUpdate(_) => names::ENERGY_UPDATE,
            MonitorEvent::AnomalyAlert(_) => names::ANOMALY_ALERT,
            MonitorEvent::ConnectionStatus(_) => names::CONNECTION_STATUS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TelemetryPayload;
    use chrono::Local;

    fn reading() -> SensorReading {
        TelemetryPayload {
            voltage: 230.456,
            current: 0.45678,
            power: 103.7449,
            energy: 0.25449,
            frequency: 50.04,
            pf: 0.984,
        }
        .into_reading(Local::now())
    }

    #[test]
    fn test_energy_update_rounding() {
        let appliance = Appliance::new("bulb", "Bulb");
        let verdict = AnomalyVerdict { is_anomaly: true, confidence: 0.123456 };
        let update = EnergyUpdate::new(&appliance, &reading(), verdict);

        assert_eq!(update.consumption, 0.104);
        assert_eq!(update.voltage, 230.46);
        assert_eq!(update.current, 0.457);
        assert_eq!(update.power, 103.74);
        assert_eq!(update.energy, 0.254);
        assert_eq!(update.frequency, 50.0);
        assert_eq!(update.pf, 0.98);
        assert_eq!(update.confidence, 0.123);
        assert!(update.is_anomaly);
    }

    #[test]
    fn test_event_envelope() {
        let appliance = Appliance::new("bulb", "Bulb");
        let event = MonitorEvent::AnomalyAlert(AnomalyAlert::new(&appliance, &reading()));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "anomaly_alert");
        assert_eq!(json["data"]["appliance_name"], "Bulb");
        assert_eq!(json["data"]["power"], 103.74);
        assert_eq!(event.name(), names::ANOMALY_ALERT);
    }
}
