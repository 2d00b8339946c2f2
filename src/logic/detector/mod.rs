//! Detector Module - streaming anomaly classification for one load
//!
//! Owns the history buffer, scaler and isolation forest for a single
//! monitored appliance and turns each reading into a verdict.
//!
//! # Pipeline
//! ```text
//! RECEIVED ─► OFF_BYPASSED                                     (normal, 0.0)
//!    │
//!    └─► BUFFERED ─► [COLD_START]                              (normal, 0.0)
//!           └─► [RETRAIN?] ─► SCORED ─► RULE_ADJUSTED ─► verdict
//! ```
//!
//! # Failure Strategy
//! Anything that prevents scoring (too few samples, a window the scaler or
//! forest cannot fit) yields a normal verdict. The detector never reports an
//! anomaly it cannot justify.
//!
//! The detector is not synchronized; callers serialize access (see
//! `logic::monitor`).


use serde::{Deserialize, Serialize};

use crate::config::DetectorConfig;
use crate::error::DetectorResult;
use crate::logic::model::{
    BufferStatus, ForestConfig, HistoryBuffer, IsolationForest, ScalerParams, StandardScaler,
};
use crate::logic::rules::{RuleConfig, RuleEngine, RuleOverride};
use crate::models::SensorReading;

// ============================================================================
// TYPES
// ============================================================================

/// Final classification of one reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnomalyVerdict {
    pub is_anomaly: bool,
    /// Magnitude of the model's decision score; 0.0 when a rule forced normal
    pub confidence: f64,
}

impl AnomalyVerdict {
    pub fn normal() -> Self {
        Self {
            is_anomaly: false,
            confidence: 0.0,
        }
    }
}

/// How a reading travelled through the pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// Below the OFF threshold; detector state untouched
    OffBypassed,
    /// Buffered, but too few samples observed to score
    ColdStart,
    /// Buffered, but no usable model could be fit
    Skipped,
    /// Scored by the model and passed through the post-check
    Scored {
        raw: AnomalyVerdict,
        applied: Option<RuleOverride>,
    },
}

/// Result of `AnomalyDetector::classify`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub verdict: AnomalyVerdict,
    pub outcome: Outcome,
    /// Whether this reading triggered a successful refit
    pub retrained: bool,
    /// Non-OFF samples observed so far, including this one
    pub samples_observed: u64,
}

impl Classification {
    pub fn is_off(&self) -> bool {
        matches!(self.outcome, Outcome::OffBypassed)
    }
}

/// Result of a retrain check
#[derive(Debug, Clone, Copy, PartialEq)]
enum Refit {
    NotDue,
    Done,
    Failed,
}

// ============================================================================
// DETECTOR
// ============================================================================

pub struct AnomalyDetector {
    config: DetectorConfig,
    rules: RuleEngine,
    history: HistoryBuffer,
    scaler: StandardScaler,
    forest: IsolationForest,
    samples_observed: u64,
    last_train_at: Option<u64>,
    retrain_count: u64,
}

impl AnomalyDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            rules: RuleEngine::new(RuleConfig::from(&config)),
            history: HistoryBuffer::new(config.history_capacity),
            scaler: StandardScaler::new(),
            forest: IsolationForest::new(forest_config(&config)),
            samples_observed: 0,
            last_train_at: None,
            retrain_count: 0,
            config,
        }
    }

    /// Classify one reading, updating history and refitting when due
    pub fn classify(&mut self, reading: &SensorReading) -> Classification {
        if self.rules.is_off(reading.power_watts) {
            tracing::debug!("OFF/standby load: {:.2}W, detector bypassed", reading.power_watts);
            return Classification {
                verdict: AnomalyVerdict::normal(),
                outcome: Outcome::OffBypassed,
                retrained: false,
                samples_observed: self.samples_observed,
            };
        }

        let value = reading.consumption_kw();
        self.history.append(value);
        self.samples_observed += 1;

        if self.rules.in_warm_up(self.samples_observed) {
            return Classification {
                verdict: AnomalyVerdict::normal(),
                outcome: Outcome::ColdStart,
                retrained: false,
                samples_observed: self.samples_observed,
            };
        }

        let retrained = match self.maybe_retrain() {
            Refit::Failed => {
                return Classification {
                    verdict: AnomalyVerdict::normal(),
                    outcome: Outcome::Skipped,
                    retrained: false,
                    samples_observed: self.samples_observed,
                };
            }
            Refit::Done => true,
            Refit::NotDue => false,
        };

        let (verdict, outcome) = match self.score(value) {
            Ok(raw) => {
                let (verdict, applied) = self.rules.post_check(raw, value, &self.history);
                (verdict, Outcome::Scored { raw, applied })
            }
            Err(e) => {
                tracing::warn!("Classification skipped for {:.3} kW: {}", value, e);
                (AnomalyVerdict::normal(), Outcome::Skipped)
            }
        };

        Classification {
            verdict,
            outcome,
            retrained,
            samples_observed: self.samples_observed,
        }
    }

    /// Refit when the sample counter hits the interval or no model exists yet.
    /// A failed refit leaves the previous model in place but the reading that
    /// triggered it is not scored.
    fn maybe_retrain(&mut self) -> Refit {
        let interval = self.config.retrain_interval.max(1);
        let due = self.last_train_at.is_none() || self.samples_observed % interval == 0;
        if !due {
            return Refit::NotDue;
        }

        match self.retrain() {
            Ok(()) => Refit::Done,
            Err(e) => {
                tracing::warn!(
                    "Retrain at sample {} failed, skipping classification: {}",
                    self.samples_observed, e
                );
                Refit::Failed
            }
        }
    }

    /// Fit scaler and forest on the recent window, committing only on success
    fn retrain(&mut self) -> DetectorResult<()> {
        let window = self.history.recent(self.config.training_window);

        let mut scaler = StandardScaler::new();
        let params = scaler.fit(&window)?;
        let scaled = scaler.transform_all(&window)?;
        let forest = IsolationForest::fitted(forest_config(&self.config), &scaled)?;

        let stats = forest.stats();
        tracing::debug!(
            "Retrained on {} samples at sample {} (mean={:.4} kW, scale={:.4}, offset={:.5}, nodes={}, depth={})",
            window.len(), self.samples_observed, params.mean, params.scale,
            stats.offset, stats.total_nodes, stats.max_depth
        );

        self.scaler = scaler;
        self.forest = forest;
        self.last_train_at = Some(self.samples_observed);
        self.retrain_count += 1;

        Ok(())
    }

    /// Raw model verdict for a consumption value
    fn score(&self, value: f64) -> DetectorResult<AnomalyVerdict> {
        let scaled = self.scaler.transform(value)?;
        let score = self.forest.predict(scaled)?;

        tracing::debug!(
            "Anomaly check - Value: {:.3} kW, Scaled: {:.3}, Score: {:.5}, Anomaly: {}",
            value, scaled, score.decision, score.is_outlier
        );

        Ok(AnomalyVerdict {
            is_anomaly: score.is_outlier,
            confidence: score.decision.abs(),
        })
    }

    /// Drop all learned state, as after a restart
    pub fn reset(&mut self) {
        self.history.clear();
        self.scaler.reset();
        self.forest = IsolationForest::new(forest_config(&self.config));
        self.samples_observed = 0;
        self.last_train_at = None;
        self.retrain_count = 0;
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn samples_observed(&self) -> u64 {
        self.samples_observed
    }

    pub fn model_trained(&self) -> bool {
        self.last_train_at.is_some()
    }

    pub fn samples_at_last_train(&self) -> Option<u64> {
        self.last_train_at
    }

    pub fn retrain_count(&self) -> u64 {
        self.retrain_count
    }

    pub fn scaler_params(&self) -> Option<ScalerParams> {
        self.scaler.params()
    }

    pub fn buffer_status(&self) -> BufferStatus {
        self.history.status(self.config.training_window)
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

fn forest_config(config: &DetectorConfig) -> ForestConfig {
    ForestConfig {
        num_trees: config.forest_trees,
        max_samples: config.forest_max_samples,
        contamination: config.contamination,
        seed: config.forest_seed,
    }
}
