//! Synchronous pipeline steps shared by the subcommands.
//!
//! Fetching is the only async part of a command; everything after the raw
//! rows are in hand lives here.

use crate::staged;
use anyhow::Context;
use aqi_core::location::Location;
use aqi_core::observation::{PollutantRow, WeatherRow};
use aqi_data::normalize;
use aqi_db::FeatureStore;
use aqi_forecast::{Forecast, ForecastEngine};
use aqi_model::{check_quality, ForestConfig, TrainedModel, Trainer};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::Path;

/// Normalize a fetched window and upsert it. Returns the rows written.
pub fn ingest(
    store: &FeatureStore,
    pollutants: &[PollutantRow],
    weather: &[WeatherRow],
    location: &Location,
) -> anyhow::Result<usize> {
    let records = normalize(pollutants, weather, location).map_err(staged)?;
    store.append(&records).map_err(staged)
}

/// Train on everything in the store and save the model to `model_path`.
///
/// With `min_r2` set, a model scoring below it is rejected and nothing is
/// written.
pub fn train(
    store: &FeatureStore,
    config: ForestConfig,
    min_r2: Option<f64>,
    model_path: &Path,
    trained_at: DateTime<Utc>,
) -> anyhow::Result<TrainedModel> {
    let records = store.read_all().map_err(staged)?;
    let model = Trainer::new(config)
        .train(&records, trained_at)
        .map_err(staged)?;
    if let Some(min_r2) = min_r2 {
        check_quality(&model, min_r2).map_err(staged)?;
    }
    model.save(model_path).map_err(staged)?;
    Ok(model)
}

/// Load the model for serving. Any artifact problem fails here, before a
/// window is fetched or predicted.
pub fn load_engine(model_path: &Path) -> anyhow::Result<ForecastEngine<TrainedModel>> {
    let model = TrainedModel::load(model_path)
        .map_err(staged)
        .with_context(|| format!("cannot serve without a model at {}", model_path.display()))?;
    Ok(ForecastEngine::new(model))
}

/// Normalize a fetched window and predict it, split at `now`.
pub fn forecast(
    engine: &ForecastEngine<TrainedModel>,
    pollutants: &[PollutantRow],
    weather: &[WeatherRow],
    location: &Location,
    now: NaiveDateTime,
) -> anyhow::Result<Forecast> {
    let records = normalize(pollutants, weather, location).map_err(staged)?;
    Ok(engine.forecast(&records, now))
}
