//! Fit and evaluate a forest on the accumulated feature history.

use crate::artifact::TrainedModel;
use crate::forest::{ForestConfig, RandomForest};
use crate::metrics::Evaluation;
use aqi_core::error::{AqiError, Result};
use aqi_core::observation::ObservationRecord;
use aqi_core::schema::FeatureVector;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Seed for the train/test split and the forest. Pinned so retraining on the
/// same rows reproduces the same evaluation.
pub const TRAINING_SEED: u64 = 42;

/// Share of labelled rows held out for evaluation.
pub const TEST_FRACTION: f64 = 0.2;

/// Labelled feature rows, in input order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub x: Vec<FeatureVector>,
    pub y: Vec<f64>,
}

impl Dataset {
    /// Keep only rows with a reference index; the rest carry no ground truth.
    pub fn labelled(records: &[ObservationRecord]) -> Self {
        let mut dataset = Dataset::default();
        for record in records {
            if let Some(target) = record.european_aqi.filter(|v| v.is_finite()) {
                dataset.x.push(record.feature_vector());
                dataset.y.push(target);
            }
        }
        dataset
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            x: indices.iter().map(|&i| self.x[i]).collect(),
            y: indices.iter().map(|&i| self.y[i]).collect(),
        }
    }
}

/// Shuffle `0..n` with `seed` and cut it into (train, test).
///
/// The test side holds `ceil(TEST_FRACTION * n)` indices.
pub fn train_test_split(n: usize, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));
    let n_test = ((n as f64) * TEST_FRACTION).ceil() as usize;
    let train = indices.split_off(n_test);
    (train, indices)
}

pub struct Trainer {
    config: ForestConfig,
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new(ForestConfig::default())
    }
}

impl Trainer {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }

    /// Fit on the labelled rows of `records` and score on the held-out split.
    ///
    /// Fewer than two labelled rows leave nothing to evaluate on and are a
    /// `Training` error.
    pub fn train(
        &self,
        records: &[ObservationRecord],
        trained_at: DateTime<Utc>,
    ) -> Result<TrainedModel> {
        let dataset = Dataset::labelled(records);
        log::info!(
            "[AQI] train: {} of {} rows are labelled",
            dataset.len(),
            records.len()
        );
        if dataset.len() < 2 {
            return Err(AqiError::Training(format!(
                "need at least 2 labelled rows, found {}",
                dataset.len()
            )));
        }

        let (train_idx, test_idx) = train_test_split(dataset.len(), TRAINING_SEED);
        let train = dataset.subset(&train_idx);
        let test = dataset.subset(&test_idx);
        log::info!(
            "[AQI] train: fitting {} trees on {} rows, holding out {}",
            self.config.n_trees,
            train.len(),
            test.len()
        );

        let forest = RandomForest::fit(&train.x, &train.y, &self.config, TRAINING_SEED);
        let metrics = Evaluation::score(&test.y, &forest.predict_batch(&test.x));
        log::info!("[AQI] train: held-out {}", metrics);

        Ok(TrainedModel::new(
            forest,
            metrics,
            train.len(),
            test.len(),
            trained_at,
        ))
    }
}

/// Reject a model whose held-out R² is below `min_r2`.
pub fn check_quality(model: &TrainedModel, min_r2: f64) -> Result<()> {
    let r2 = model.metrics().r2;
    if r2 < min_r2 {
        log::warn!("[AQI] train: R² {r2:.3} is below the required {min_r2:.3}");
        return Err(AqiError::Training(format!(
            "held-out R² {r2:.3} is below the required {min_r2:.3}"
        )));
    }
    Ok(())
}
