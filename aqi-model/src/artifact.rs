//! The persisted model: a fitted forest plus the metadata needed to check it
//! against the shared feature schema before serving.

use crate::forest::RandomForest;
use crate::metrics::Evaluation;
use crate::Regressor;
use aqi_core::error::{AqiError, Result};
use aqi_core::schema::{feature_names, matches_schema, FeatureVector, TARGET_NAME};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Artifact layout version; bumped on any incompatible change.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    format_version: u32,
    feature_names: Vec<String>,
    target: String,
    forest: RandomForest,
    metrics: Evaluation,
    train_rows: usize,
    test_rows: usize,
    trained_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct Header {
    format_version: u32,
}

impl TrainedModel {
    pub(crate) fn new(
        forest: RandomForest,
        metrics: Evaluation,
        train_rows: usize,
        test_rows: usize,
        trained_at: DateTime<Utc>,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            feature_names: feature_names(),
            target: TARGET_NAME.to_string(),
            forest,
            metrics,
            train_rows,
            test_rows,
            trained_at,
        }
    }

    pub fn metrics(&self) -> &Evaluation {
        &self.metrics
    }

    pub fn train_rows(&self) -> usize {
        self.train_rows
    }

    pub fn test_rows(&self) -> usize {
        self.test_rows
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// Write the artifact to `path`, replacing any previous one.
    ///
    /// The JSON is written to a temporary file in the target directory and
    /// renamed into place, so `path` only ever holds a complete artifact.
    pub fn save(&self, path: &Path) -> Result<()> {
        let fail = |reason: String| AqiError::ModelSave {
            path: path.display().to_string(),
            reason,
        };
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| fail(e.to_string()))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| fail(e.to_string()))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, self).map_err(|e| fail(e.to_string()))?;
            writer.flush().map_err(|e| fail(e.to_string()))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| fail(e.to_string()))?;
        tmp.persist(path).map_err(|e| fail(e.error.to_string()))?;

        log::info!(
            "[AQI] train: saved model ({} trees) to {}",
            self.forest.trees().len(),
            path.display()
        );
        Ok(())
    }

    /// Read and validate the artifact at `path`.
    ///
    /// A missing file, unreadable JSON, another format version, a feature
    /// list differing from the schema, or a malformed forest is a
    /// `ModelLoad` error.
    pub fn load(path: &Path) -> Result<Self> {
        let fail = |reason: String| AqiError::ModelLoad {
            path: path.display().to_string(),
            reason,
        };
        let mut body = String::new();
        BufReader::new(File::open(path).map_err(|e| fail(e.to_string()))?)
            .read_to_string(&mut body)
            .map_err(|e| fail(e.to_string()))?;

        let header: Header = serde_json::from_str(&body).map_err(|e| fail(e.to_string()))?;
        if header.format_version != FORMAT_VERSION {
            return Err(fail(format!(
                "format version {} is not supported (expected {})",
                header.format_version, FORMAT_VERSION
            )));
        }
        let model: TrainedModel = serde_json::from_str(&body).map_err(|e| fail(e.to_string()))?;
        model.validate().map_err(fail)?;

        log::info!(
            "[AQI] serve: loaded model trained {} ({})",
            model.trained_at.format("%Y-%m-%d %H:%M"),
            model.metrics
        );
        Ok(model)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if !matches_schema(&self.feature_names) {
            return Err(format!(
                "feature list {:?} does not match the serving schema",
                self.feature_names
            ));
        }
        if self.target != TARGET_NAME {
            return Err(format!("model predicts `{}`, not `{TARGET_NAME}`", self.target));
        }
        self.forest.validate()
    }
}

impl Regressor for TrainedModel {
    fn predict(&self, features: &FeatureVector) -> f64 {
        self.forest.predict(features)
    }
}
