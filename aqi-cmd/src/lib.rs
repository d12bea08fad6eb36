//! Command implementations for the AQI CLI.
//!
//! Each subcommand drives one path through the pipeline: `ingest` feeds the
//! feature store, `train` fits and saves the model, `predict` serves a
//! forecast from a fresh window, `features` reports what the store holds.

use aqi_core::error::AqiError;
use chrono::NaiveDateTime;
use clap::Subcommand;
use std::path::PathBuf;

pub mod features;
pub mod ingest;
pub mod pipeline;
pub mod predict;
pub mod train;

const DEFAULT_STORE: &str = "data/features.sqlite";
const DEFAULT_MODEL: &str = "models/aqi_random_forest.json";

#[derive(Subcommand)]
pub enum Command {
    /// Fetch the pollutant and weather series and upsert them into the feature store
    Ingest {
        /// Feature store (SQLite) path
        #[arg(long, env = "AQI_STORE_PATH", default_value = DEFAULT_STORE)]
        store: PathBuf,

        /// Days of history to request
        #[arg(long, default_value_t = 92)]
        past_days: u32,

        /// Days of forecast to request
        #[arg(long, default_value_t = 3)]
        forecast_days: u32,
    },

    /// Train the random forest on the feature store and save the model
    Train {
        /// Feature store (SQLite) path
        #[arg(long, env = "AQI_STORE_PATH", default_value = DEFAULT_STORE)]
        store: PathBuf,

        /// Output path for the model artifact
        #[arg(long, env = "AQI_MODEL_PATH", default_value = DEFAULT_MODEL)]
        model: PathBuf,

        /// Number of trees in the forest
        #[arg(long, default_value_t = 100)]
        trees: usize,

        /// Maximum tree depth (unlimited if omitted)
        #[arg(long)]
        max_depth: Option<usize>,

        /// Refuse to save a model whose held-out R² is below this value
        #[arg(long)]
        min_r2: Option<f64>,
    },

    /// Forecast AQI for the coming days and report the health alert
    Predict {
        /// Path of the model artifact to serve
        #[arg(long, env = "AQI_MODEL_PATH", default_value = DEFAULT_MODEL)]
        model: PathBuf,

        /// Days of history to request
        #[arg(long, default_value_t = 92)]
        past_days: u32,

        /// Days of forecast to request
        #[arg(long, default_value_t = 3)]
        forecast_days: u32,

        /// Evaluation instant, `YYYY-MM-DDTHH:MM` UTC (defaults to the current time)
        #[arg(long, value_parser = parse_now)]
        now: Option<NaiveDateTime>,

        /// Also write the prediction table to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Show what the feature store holds
    Features {
        /// Feature store (SQLite) path
        #[arg(long, env = "AQI_STORE_PATH", default_value = DEFAULT_STORE)]
        store: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Ingest {
            store,
            past_days,
            forecast_days,
        } => ingest::run_ingest(&store, past_days, forecast_days).await,
        Command::Train {
            store,
            model,
            trees,
            max_depth,
            min_r2,
        } => train::run_train(&store, &model, trees, max_depth, min_r2),
        Command::Predict {
            model,
            past_days,
            forecast_days,
            now,
            csv,
        } => predict::run_predict(&model, past_days, forecast_days, now, csv.as_deref()).await,
        Command::Features { store, json } => features::run_features(&store, json),
    }
}

/// Wrap a pipeline error with the stage it failed in.
pub(crate) fn staged(err: AqiError) -> anyhow::Error {
    let stage = err.stage();
    anyhow::Error::new(err).context(format!("{stage} stage failed"))
}

fn parse_now(s: &str) -> Result<NaiveDateTime, String> {
    aqi_utils::dates::parse_hour(s).map_err(|e| e.to_string())
}
