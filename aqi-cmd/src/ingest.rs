//! Fetch the upstream window and feed the feature store.

use crate::{pipeline, staged};
use anyhow::Context;
use aqi_core::observation::{PollutantRow, WeatherRow};
use aqi_core::open_meteo::{FetchWindow, OpenMeteoClient};
use aqi_db::FeatureStore;
use log::info;
use std::path::Path;

pub async fn run_ingest(store_path: &Path, past_days: u32, forecast_days: u32) -> anyhow::Result<()> {
    let client = OpenMeteoClient::new(Default::default()).map_err(staged)?;
    let window = FetchWindow {
        past_days,
        forecast_days,
    };
    let (pollutants, weather) = fetch(&client, &window).await?;

    let store = FeatureStore::open(store_path)
        .map_err(staged)
        .with_context(|| format!("opening feature store {}", store_path.display()))?;
    let written = pipeline::ingest(&store, &pollutants, &weather, client.location())?;
    let summary = store.summary().map_err(staged)?;

    info!(
        "Ingest complete: {} rows written, store holds {} ({} labelled)",
        written, summary.rows, summary.labelled_rows
    );
    println!(
        "Upserted {} rows into {} (now {} rows)",
        written,
        store_path.display(),
        summary.rows
    );
    Ok(())
}

/// Fetch both sources for `window`. Either failing fails the whole fetch.
pub(crate) async fn fetch(
    client: &OpenMeteoClient,
    window: &FetchWindow,
) -> anyhow::Result<(Vec<PollutantRow>, Vec<WeatherRow>)> {
    let (pollutants, weather) = tokio::try_join!(
        client.fetch_air_quality(window),
        client.fetch_weather(window)
    )
    .map_err(staged)?;
    info!(
        "Fetched {} pollutant and {} weather rows for {}",
        pollutants.len(),
        weather.len(),
        client.location().name
    );
    Ok((pollutants, weather))
}
