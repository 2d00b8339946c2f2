//! Online Scaler - standardization fitted on the recent window
//!
//! Refit from scratch on every retrain; there is no incremental state.

use crate::error::{DetectorError, DetectorResult};

/// Spread below this is treated as zero variance
const MIN_SCALE: f64 = 1e-12;

/// Fitted standardization parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalerParams {
    pub mean: f64,
    pub scale: f64,
}

/// Zero-mean, unit-variance standardizer
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    params: Option<ScalerParams>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute parameters for `window` without touching the current state
    fn compute(window: &[f64]) -> DetectorResult<ScalerParams> {
        if window.is_empty() {
            return Err(DetectorError::EmptyWindow);
        }

        let n = window.len() as f64;
        let mean = window.iter().sum::<f64>() / n;
        // Population variance
        let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();

        if !mean.is_finite() || !std.is_finite() {
            return Err(DetectorError::NonFiniteWindow);
        }

        // A constant window standardizes to zero rather than dividing by zero
        let scale = if std < MIN_SCALE { 1.0 } else { std };

        Ok(ScalerParams { mean, scale })
    }

    /// Fit on `window`, replacing the current parameters
    pub fn fit(&mut self, window: &[f64]) -> DetectorResult<ScalerParams> {
        let params = Self::compute(window)?;
        self.params = Some(params);
        Ok(params)
    }

    pub fn params(&self) -> Option<ScalerParams> {
        self.params
    }

    pub fn reset(&mut self) {
        self.params = None;
    }

    pub fn transform(&self, value: f64) -> DetectorResult<f64> {
        let p = self.params.ok_or(DetectorError::NotFitted("scaler"))?;
        Ok((value - p.mean) / p.scale)
    }

    pub fn transform_all(&self, values: &[f64]) -> DetectorResult<Vec<f64>> {
        values.iter().map(|&v| self.transform(v)).collect()
    }

    pub fn inverse_transform(&self, scaled: f64) -> DetectorResult<f64> {
        let p = self.params.ok_or(DetectorError::NotFitted("scaler"))?;
        Ok(scaled * p.scale + p.mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_parameters() {
        let mut scaler = StandardScaler::new();
        let params = scaler.fit(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        assert!((params.mean - 3.0).abs() < 1e-12);
        assert!((params.scale - 2.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_round_trip() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&[0.098, 0.101, 0.1, 0.103, 0.099, 0.25]).unwrap();

        for value in [0.0, 0.1, 0.5, -3.2, 1234.5] {
            let scaled = scaler.transform(value).unwrap();
            let restored = scaler.inverse_transform(scaled).unwrap();
            assert!((restored - value).abs() < 1e-9, "{} -> {}", value, restored);
        }
    }

    #[test]
    fn test_zero_variance_window() {
        let mut scaler = StandardScaler::new();
        let params = scaler.fit(&[0.1; 60]).unwrap();

        assert_eq!(params.scale, 1.0);
        assert!(scaler.transform(0.1).unwrap().abs() < 1e-12);
        assert!((scaler.transform(0.5).unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_windows() {
        assert_eq!(StandardScaler::compute(&[]), Err(DetectorError::EmptyWindow));
        assert_eq!(
            StandardScaler::compute(&[1.0, f64::INFINITY]),
            Err(DetectorError::NonFiniteWindow)
        );
        assert_eq!(
            StandardScaler::compute(&[f64::MAX, f64::MAX]),
            Err(DetectorError::NonFiniteWindow)
        );
    }

    #[test]
    fn test_unfitted_transform_fails() {
        let scaler = StandardScaler::new();
        assert_eq!(scaler.transform(1.0), Err(DetectorError::NotFitted("scaler")));
    }
}
