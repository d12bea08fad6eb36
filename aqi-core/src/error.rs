/// Error types for the AQI pipeline
use chrono::NaiveDateTime;
use std::fmt;
use thiserror::Error;

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Ingestion,
    Store,
    Training,
    Serving,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Ingestion => "ingestion",
            Stage::Store => "store",
            Stage::Training => "training",
            Stage::Serving => "serving",
        };
        f.write_str(name)
    }
}

/// Main error type for AQI operations
#[derive(Error, Debug)]
pub enum AqiError {
    /// Upstream query failed or returned a malformed/empty schema
    #[error("Upstream source `{provider}` unavailable: {reason}")]
    SourceUnavailable { provider: String, reason: String },

    /// Forward-fill found no prior value for a field
    #[error("No prior value to forward-fill `{field}` at {timestamp}")]
    DataGap {
        field: &'static str,
        timestamp: NaiveDateTime,
    },

    /// Feature store I/O failure
    #[error("Feature store unavailable: {0}")]
    StoreUnavailable(String),

    /// Not enough labelled rows, or a rejected model
    #[error("Training failed: {0}")]
    Training(String),

    /// Model artifact could not be written
    #[error("Failed to save model to {path}: {reason}")]
    ModelSave { path: String, reason: String },

    /// Model artifact missing or incompatible with the feature schema
    #[error("Failed to load model from {path}: {reason}")]
    ModelLoad { path: String, reason: String },
}

impl AqiError {
    pub fn source_unavailable(provider: &str, reason: impl fmt::Display) -> Self {
        AqiError::SourceUnavailable {
            provider: provider.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn store(reason: impl fmt::Display) -> Self {
        AqiError::StoreUnavailable(reason.to_string())
    }

    /// The stage the error should be reported against.
    pub fn stage(&self) -> Stage {
        match self {
            AqiError::SourceUnavailable { .. } | AqiError::DataGap { .. } => Stage::Ingestion,
            AqiError::StoreUnavailable(_) => Stage::Store,
            AqiError::Training(_) | AqiError::ModelSave { .. } => Stage::Training,
            AqiError::ModelLoad { .. } => Stage::Serving,
        }
    }
}

/// Type alias for Results using AqiError
pub type Result<T> = std::result::Result<T, AqiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_stage_mapping() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            AqiError::source_unavailable("air-quality", "timeout").stage(),
            Stage::Ingestion
        );
        assert_eq!(
            AqiError::DataGap {
                field: "pm10",
                timestamp: ts
            }
            .stage(),
            Stage::Ingestion
        );
        assert_eq!(AqiError::store("disk full").stage(), Stage::Store);
        assert_eq!(
            AqiError::Training("no rows".to_string()).stage(),
            Stage::Training
        );
        assert_eq!(
            AqiError::ModelLoad {
                path: "m.json".to_string(),
                reason: "missing".to_string()
            }
            .stage(),
            Stage::Serving
        );
    }

    #[test]
    fn test_data_gap_message_names_field() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(4, 0, 0)
            .unwrap();
        let err = AqiError::DataGap {
            field: "ozone",
            timestamp: ts,
        };
        let message = err.to_string();
        assert!(message.contains("ozone"));
        assert!(message.contains("2024-03-05"));
    }
}
