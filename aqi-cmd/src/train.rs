//! Fit the forest on the feature store and save the artifact.

use crate::{pipeline, staged};
use anyhow::Context;
use aqi_db::FeatureStore;
use aqi_model::ForestConfig;
use chrono::Utc;
use log::info;
use std::path::Path;

pub fn run_train(
    store_path: &Path,
    model_path: &Path,
    trees: usize,
    max_depth: Option<usize>,
    min_r2: Option<f64>,
) -> anyhow::Result<()> {
    let store = FeatureStore::open(store_path)
        .map_err(staged)
        .with_context(|| format!("opening feature store {}", store_path.display()))?;
    let config = ForestConfig {
        n_trees: trees,
        max_depth,
        ..ForestConfig::default()
    };
    info!("Training with {:?}", config);

    let model = pipeline::train(&store, config, min_r2, model_path, Utc::now())?;

    println!(
        "Trained on {} rows, evaluated on {}",
        model.train_rows(),
        model.test_rows()
    );
    println!("{}", model.metrics());
    println!("Model saved to {}", model_path.display());
    Ok(())
}
