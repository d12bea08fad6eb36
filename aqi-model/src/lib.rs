//! AQI regression model: training, evaluation and the persisted artifact.
//!
//! [`Trainer`] fits a [`RandomForest`] on the labelled rows read from the
//! feature store, holds out a seeded 20% split for evaluation, and returns a
//! [`TrainedModel`] that is saved once and loaded read-only for serving.
//!
//! ```rust,no_run
//! use aqi_model::TrainedModel;
//! use std::path::Path;
//!
//! let model = TrainedModel::load(Path::new("models/aqi_random_forest.json")).unwrap();
//! println!("{}", model.metrics());
//! ```

pub mod artifact;
pub mod forest;
pub mod metrics;
pub mod training;

use aqi_core::schema::FeatureVector;

pub use artifact::TrainedModel;
pub use forest::{ForestConfig, RandomForest};
pub use metrics::Evaluation;
pub use training::{check_quality, Trainer, TRAINING_SEED};

/// Anything that maps a schema feature vector to a predicted AQI.
pub trait Regressor {
    fn predict(&self, features: &FeatureVector) -> f64;
}

impl Regressor for RandomForest {
    fn predict(&self, features: &FeatureVector) -> f64 {
        RandomForest::predict(self, features)
    }
}
