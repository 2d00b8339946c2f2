//! Rule Engine - deterministic overrides around the model verdict
//!
//! Pre-checks run before any detector state is touched (OFF bypass),
//! the warm-up check gates scoring, and the post-check suppresses verdicts
//! whose deviation from the recent operating point is immaterial.

use serde::Serialize;

use crate::config::DetectorConfig;
use crate::logic::detector::AnomalyVerdict;
use crate::logic::model::HistoryBuffer;

/// Rule thresholds
#[derive(Debug, Clone)]
pub struct RuleConfig {
    /// Below this power (W) the appliance is OFF
    pub off_threshold_w: f64,
    /// Samples required before the model may flag anything
    pub cold_start_samples: u64,
    /// Values averaged for the jump rule
    pub jump_window: usize,
    /// Minimum deviation (W) from the recent average that can be an anomaly
    pub min_jump_w: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self::from(&DetectorConfig::default())
    }
}

impl From<&DetectorConfig> for RuleConfig {
    fn from(config: &DetectorConfig) -> Self {
        Self {
            off_threshold_w: config.off_threshold_w,
            cold_start_samples: config.cold_start_samples,
            jump_window: config.jump_window,
            min_jump_w: config.min_jump_w,
        }
    }
}

/// Which rule forced a normal verdict
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOverride {
    /// Standby power, never scored
    OffState,
    /// Not enough samples observed yet
    WarmUp,
    /// Deviation from the recent average below the materiality floor
    BelowMinJump { jump_w: f64 },
}

#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    config: RuleConfig,
}

impl RuleEngine {
    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }

    /// OFF readings bypass the detector entirely
    pub fn is_off(&self, power_watts: f64) -> bool {
        power_watts < self.config.off_threshold_w
    }

    /// True while too few samples exist for the model to be trusted
    pub fn in_warm_up(&self, samples_observed: u64) -> bool {
        samples_observed < self.config.cold_start_samples
    }

    /// Deviation (W) of `value_kw` from the mean of the recent jump window,
    /// `None` until the window is full
    pub fn jump_w(&self, value_kw: f64, history: &HistoryBuffer) -> Option<f64> {
        history
            .recent_mean(self.config.jump_window)
            .map(|recent_avg| (value_kw - recent_avg).abs() * 1000.0)
    }

    /// Apply the jump-suppression rule to a raw model verdict
    pub fn post_check(
        &self,
        raw: AnomalyVerdict,
        value_kw: f64,
        history: &HistoryBuffer,
    ) -> (AnomalyVerdict, Option<RuleOverride>) {
        match self.jump_w(value_kw, history) {
            Some(jump_w) if jump_w < self.config.min_jump_w => {
                (AnomalyVerdict::normal(), Some(RuleOverride::BelowMinJump { jump_w }))
            }
            _ => (raw, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_of(values: &[f64]) -> HistoryBuffer {
        let mut history = HistoryBuffer::new(500);
        for &v in values {
            history.append(v);
        }
        history
    }

    #[test]
    fn test_off_threshold() {
        let rules = RuleEngine::default();
        assert!(rules.is_off(0.0));
        assert!(rules.is_off(1.5));
        assert!(rules.is_off(1.999));
        assert!(!rules.is_off(2.0));
        assert!(!rules.is_off(60.0));
    }

    #[test]
    fn test_warm_up() {
        let rules = RuleEngine::default();
        assert!(rules.in_warm_up(0));
        assert!(rules.in_warm_up(49));
        assert!(!rules.in_warm_up(50));
    }

    #[test]
    fn test_jump_rule_needs_full_window() {
        let rules = RuleEngine::default();
        let history = history_of(&[0.1; 29]);
        let raw = AnomalyVerdict { is_anomaly: true, confidence: 0.3 };

        let (verdict, applied) = rules.post_check(raw, 0.1, &history);
        assert_eq!(verdict, raw);
        assert_eq!(applied, None);
    }

    #[test]
    fn test_small_jump_suppressed() {
        let rules = RuleEngine::default();
        let mut values = vec![0.1; 29];
        values.push(0.115);
        let history = history_of(&values);
        let raw = AnomalyVerdict { is_anomaly: true, confidence: 0.3 };

        let (verdict, applied) = rules.post_check(raw, 0.115, &history);
        assert_eq!(verdict, AnomalyVerdict::normal());
        assert!(matches!(applied, Some(RuleOverride::BelowMinJump { jump_w }) if jump_w < 20.0));
    }

    #[test]
    fn test_large_jump_kept() {
        let rules = RuleEngine::default();
        let mut values = vec![0.1; 29];
        values.push(0.5);
        let history = history_of(&values);
        let raw = AnomalyVerdict { is_anomaly: true, confidence: 0.41 };

        let (verdict, applied) = rules.post_check(raw, 0.5, &history);
        assert_eq!(verdict, raw);
        assert_eq!(applied, None);
        assert!(rules.jump_w(0.5, &history).unwrap() > 380.0);
    }
}
