//! Monitor Service - serialized ingestion for one appliance
//!
//! Wraps the detector in a single lock so that buffer append, retrain,
//! scoring, rule adjustment and publication of one reading never interleave
//! with another reading's.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::DetectorConfig;
use crate::logic::broadcast::EventPublisher;
use crate::logic::detector::{AnomalyDetector, Classification};
use crate::models::{
    AnomalyAlert, Appliance, EnergyUpdate, MonitorEvent, MonitorStatus, ScalerStatus, SensorReading,
};

pub struct Monitor {
    appliance: Appliance,
    detector: Mutex<AnomalyDetector>,
    publisher: Arc<dyn EventPublisher>,
}

impl Monitor {
    pub fn new(appliance: Appliance, config: DetectorConfig, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            appliance,
            detector: Mutex::new(AnomalyDetector::new(config)),
            publisher,
        }
    }

    pub fn appliance(&self) -> &Appliance {
        &self.appliance
    }

    /// Classify a reading and publish the result
    pub fn ingest(&self, reading: &SensorReading) -> Classification {
        let mut detector = self.detector.lock();
        let result = detector.classify(reading);
        let verdict = result.verdict;

        self.publisher.publish(MonitorEvent::EnergyUpdate(EnergyUpdate::new(
            &self.appliance,
            reading,
            verdict,
        )));

        if verdict.is_anomaly {
            tracing::warn!(
                "ANOMALY DETECTED on {}: Power={:.2}W, Voltage={:.2}V, confidence={:.3}",
                self.appliance.name, reading.power_watts, reading.voltage, verdict.confidence
            );
            self.publisher.publish(MonitorEvent::AnomalyAlert(AnomalyAlert::new(
                &self.appliance,
                reading,
            )));
        }

        if result.is_off() {
            tracing::info!("{} OFF/very low load: {:.2}W | Anomaly: NO", self.appliance.name, reading.power_watts);
        } else {
            tracing::info!(
                "{}: {:.2}W | {:.2}V | Anomaly: {}",
                self.appliance.name,
                reading.power_watts,
                reading.voltage,
                if verdict.is_anomaly { "YES" } else { "NO" }
            );
        }

        result
    }

    /// Snapshot of detector state
    pub fn status(&self, connected_observers: usize) -> MonitorStatus {
        let detector = self.detector.lock();

        MonitorStatus {
            appliance_id: self.appliance.id.clone(),
            appliance_name: self.appliance.name.clone(),
            samples_observed: detector.samples_observed(),
            model_trained: detector.model_trained(),
            samples_at_last_train: detector.samples_at_last_train(),
            retrain_count: detector.retrain_count(),
            buffer: detector.buffer_status(),
            scaler: detector.scaler_params().map(|p| ScalerStatus {
                mean: p.mean,
                scale: p.scale,
            }),
            connected_observers,
        }
    }

    /// Forget everything learned so far
    pub fn reset(&self) {
        self.detector.lock().reset();
        tracing::info!("Detector for {} has been reset", self.appliance.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<MonitorEvent>>,
    }

    impl EventPublisher for RecordingPublisher {
        fn publish(&self, event: MonitorEvent) {
            self.events.lock().push(event);
        }
    }

    impl RecordingPublisher {
        fn names(&self) -> Vec<&'static str> {
            self.events.lock().iter().map(|e| e.name()).collect()
        }
    }

    fn monitor() -> (Monitor, Arc<RecordingPublisher>) {
        let publisher = Arc::new(RecordingPublisher::default());
        let monitor = Monitor::new(
            Appliance::new("bulb", "Bulb"),
            DetectorConfig::default(),
            publisher.clone(),
        );
        (monitor, publisher)
    }

    #[test]
    fn test_off_reading_is_still_broadcast() {
        let (monitor, publisher) = monitor();
        let result = monitor.ingest(&SensorReading::from_power(1.5));

        assert!(result.is_off());
        assert_eq!(publisher.names(), vec!["energy_update"]);

        let events = publisher.events.lock();
        match &events[0] {
            MonitorEvent::EnergyUpdate(update) => {
                assert_eq!(update.power, 1.5);
                assert!(!update.is_anomaly);
                assert_eq!(update.confidence, 0.0);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_alert_only_on_anomaly() {
        let (monitor, publisher) = monitor();
        for _ in 0..60 {
            monitor.ingest(&SensorReading::from_power(100.0));
        }
        assert!(publisher.names().iter().all(|n| *n == "energy_update"));
        assert_eq!(publisher.names().len(), 60);

        let result = monitor.ingest(&SensorReading::from_power(500.0));
        assert!(result.verdict.is_anomaly);

        let names = publisher.names();
        assert_eq!(&names[60..], &["energy_update", "anomaly_alert"]);
    }

    #[test]
    fn test_concurrent_ingestion_is_serialized() {
        let (monitor, publisher) = monitor();

        std::thread::scope(|scope| {
            for t in 0..8 {
                let monitor = &monitor;
                scope.spawn(move || {
                    for i in 0..80 {
                        let power = 100.0 + ((t * 80 + i) % 9) as f64 * 0.2;
                        monitor.ingest(&SensorReading::from_power(power));
                    }
                });
            }
        });

        let status = monitor.status(0);
        assert_eq!(status.samples_observed, 640);
        assert_eq!(status.buffer.current_size, 500);
        // Exactly one retrain per interval after warm-up
        assert_eq!(status.retrain_count, 60);
        assert_eq!(status.samples_at_last_train, Some(640));
        assert!(publisher.events.lock().len() >= 640);
    }

    #[test]
    fn test_status_and_reset() {
        let (monitor, _) = monitor();
        for _ in 0..55 {
            monitor.ingest(&SensorReading::from_power(80.0));
        }

        let status = monitor.status(3);
        assert_eq!(status.samples_observed, 55);
        assert!(status.model_trained);
        assert_eq!(status.samples_at_last_train, Some(50));
        assert_eq!(status.connected_observers, 3);
        assert!(status.scaler.is_some());

        monitor.reset();
        let status = monitor.status(0);
        assert_eq!(status.samples_observed, 0);
        assert!(!status.model_trained);
        assert!(status.scaler.is_none());
    }
}
