//! Isolation Forest
//!
//! Ensemble of isolation trees over a standardized one-dimensional window.
//! Scores follow the usual convention: `score_samples` is the negated
//! anomaly score (lower = more abnormal) and `decision_function` shifts it by
//! the contamination percentile of the training scores, so negative values
//! are outliers.
//!
//! Every fit reseeds the generator from the configured seed, making a fitted
//! forest a pure function of the window it saw.

use rand::{rngs::StdRng, SeedableRng};

use super::tree::{average_path_length, IsolationTree};
use crate::error::{DetectorError, DetectorResult};

/// Configuration for Isolation Forest
#[derive(Debug, Clone)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub num_trees: usize,
    /// Upper bound on the sub-sample size for each tree
    pub max_samples: usize,
    /// Expected outlier fraction, in (0, 0.5]
    pub contamination: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            num_trees: crate::constants::FOREST_TREES,
            max_samples: crate::constants::FOREST_MAX_SAMPLES,
            contamination: crate::constants::CONTAMINATION,
            seed: crate::constants::FOREST_SEED,
        }
    }
}

/// Verdict of the forest for one point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierScore {
    /// Shifted score; negative means outlier
    pub decision: f64,
    pub is_outlier: bool,
}

/// Isolation Forest for anomaly detection
#[derive(Debug, Clone)]
pub struct IsolationForest {
    config: ForestConfig,
    trees: Vec<IsolationTree>,
    /// Sub-sample size used per tree at the last fit
    sample_size: usize,
    /// Threshold subtracted from raw scores
    offset: f64,
}

impl IsolationForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            sample_size: 0,
            offset: 0.0,
        }
    }

    /// Build a forest already fitted on `samples`
    pub fn fitted(config: ForestConfig, samples: &[f64]) -> DetectorResult<Self> {
        let mut forest = Self::new(config);
        forest.fit(samples)?;
        Ok(forest)
    }

    /// Train the forest on samples, replacing any previous fit
    pub fn fit(&mut self, samples: &[f64]) -> DetectorResult<()> {
        if samples.is_empty() {
            return Err(DetectorError::EmptyWindow);
        }
        if samples.iter().any(|v| !v.is_finite()) {
            return Err(DetectorError::NonFiniteWindow);
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let sample_size = self.config.max_samples.clamp(1, samples.len());
        let max_depth = (sample_size.max(2) as f64).log2().ceil() as usize;

        let mut trees = Vec::with_capacity(self.config.num_trees.max(1));
        for _ in 0..self.config.num_trees.max(1) {
            let subset: Vec<f64> = if sample_size >= samples.len() {
                samples.to_vec()
            } else {
                rand::seq::index::sample(&mut rng, samples.len(), sample_size)
                    .into_iter()
                    .map(|i| samples[i])
                    .collect()
            };
            trees.push(IsolationTree::fit(&subset, max_depth, &mut rng)?);
        }

        self.trees = trees;
        self.sample_size = sample_size;

        let mut training_scores: Vec<f64> = samples.iter().map(|&v| self.raw_score(v)).collect();
        let contamination = self.config.contamination.clamp(f64::EPSILON, 0.5);
        self.offset = percentile(&mut training_scores, contamination * 100.0);

        Ok(())
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    fn raw_score(&self, value: f64) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.path_length(value)).sum();
        let mean_path = total / self.trees.len() as f64;
        let norm = average_path_length(self.sample_size);
        let normalized = if norm > 0.0 { mean_path / norm } else { 0.0 };

        -(2f64.powf(-normalized))
    }

    /// Negated anomaly score in [-1, 0); lower is more abnormal
    pub fn score_samples(&self, value: f64) -> DetectorResult<f64> {
        if !self.is_fitted() {
            return Err(DetectorError::NotFitted("isolation forest"));
        }
        Ok(self.raw_score(value))
    }

    /// Score shifted by the contamination threshold; negative means outlier
    pub fn decision_function(&self, value: f64) -> DetectorResult<f64> {
        Ok(self.score_samples(value)? - self.offset)
    }

    pub fn predict(&self, value: f64) -> DetectorResult<OutlierScore> {
        let decision = self.decision_function(value)?;
        Ok(OutlierScore {
            decision,
            is_outlier: decision < 0.0,
        })
    }

    /// Get forest statistics
    pub fn stats(&self) -> ForestStats {
        ForestStats {
            num_trees: self.trees.len(),
            total_nodes: self.trees.iter().map(|t| t.node_count()).sum(),
            max_depth: self.trees.iter().map(|t| t.depth()).max().unwrap_or(0),
            sample_size: self.sample_size,
            offset: self.offset,
        }
    }
}

/// Forest statistics
#[derive(Debug, Clone, Copy)]
pub struct ForestStats {
    pub num_trees: usize,
    pub total_nodes: usize,
    pub max_depth: usize,
    pub sample_size: usize,
    pub offset: f64,
}

/// Linear-interpolated percentile, `q` in [0, 100]
fn percentile(values: &mut [f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let rank = (q / 100.0).clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    values[lower] + (values[upper] - values[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> ForestConfig {
        ForestConfig {
            num_trees: 25,
            max_samples: 64,
            contamination: 0.1,
            seed: 123,
        }
    }

    fn clustered_window() -> Vec<f64> {
        (0..100).map(|i| ((i % 7) as f64 - 3.0) * 0.1).collect()
    }

    #[test]
    fn test_percentile() {
        let mut values = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert_eq!(percentile(&mut values, 0.0), 1.0);
        assert_eq!(percentile(&mut values, 50.0), 3.0);
        assert_eq!(percentile(&mut values, 100.0), 5.0);
        assert!((percentile(&mut values, 10.0) - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_forest_fit() {
        let forest = IsolationForest::fitted(small_config(), &clustered_window()).unwrap();
        let stats = forest.stats();

        assert_eq!(stats.num_trees, 25);
        assert_eq!(stats.sample_size, 64);
        assert!(stats.max_depth <= 6);
        assert!(stats.total_nodes > 25);
    }

    #[test]
    fn test_far_point_is_outlier() {
        let forest = IsolationForest::fitted(small_config(), &clustered_window()).unwrap();

        let far = forest.predict(25.0).unwrap();
        assert!(far.is_outlier);
        assert!(far.decision < 0.0);

        let near = forest.decision_function(0.0).unwrap();
        assert!(near > far.decision);
    }

    #[test]
    fn test_contamination_sets_threshold() {
        let window = clustered_window();
        let forest = IsolationForest::fitted(small_config(), &window).unwrap();

        let flagged = window
            .iter()
            .filter(|&&v| forest.predict(v).unwrap().is_outlier)
            .count();
        // Roughly the contamination fraction, never the bulk of the window
        assert!(flagged <= 30, "flagged {}", flagged);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let window = clustered_window();
        let a = IsolationForest::fitted(small_config(), &window).unwrap();
        let b = IsolationForest::fitted(small_config(), &window).unwrap();

        for v in [-1.0, 0.0, 0.15, 4.0] {
            assert_eq!(a.decision_function(v).unwrap(), b.decision_function(v).unwrap());
        }
    }

    #[test]
    fn test_constant_window() {
        let forest = IsolationForest::fitted(small_config(), &[0.0; 60]).unwrap();

        let same = forest.predict(0.0).unwrap();
        assert!(!same.is_outlier);
        assert_eq!(same.decision, 0.0);

        let spike = forest.predict(0.4).unwrap();
        assert!(spike.is_outlier);
        assert!(spike.decision.abs() > 0.1);
    }

    #[test]
    fn test_unfitted_forest() {
        let forest = IsolationForest::new(small_config());
        assert_eq!(
            forest.score_samples(0.0),
            Err(DetectorError::NotFitted("isolation forest"))
        );
    }
}
