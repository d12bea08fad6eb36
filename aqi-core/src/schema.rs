//! The feature vector shared by training and serving.
//!
//! Both the trainer and the forecast engine build model inputs through
//! [`ObservationRecord::feature_vector`], and the persisted model records
//! [`FEATURE_NAMES`] so a column-order change is caught at load time.

use crate::observation::ObservationRecord;

/// Number of model input features.
pub const FEATURE_COUNT: usize = 12;

/// Feature names, in model input order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "pm2_5",
    "pm10",
    "ozone",
    "carbon_monoxide",
    "sulphur_dioxide",
    "nitrogen_dioxide",
    "temperature",
    "relative_humidity",
    "wind_speed",
    "hour",
    "day",
    "month",
];

/// Name of the regression target.
pub const TARGET_NAME: &str = "european_aqi";

/// A single model input row.
pub type FeatureVector = [f64; FEATURE_COUNT];

impl ObservationRecord {
    /// Build the model input for this record, in [`FEATURE_NAMES`] order.
    pub fn feature_vector(&self) -> FeatureVector {
        [
            self.pm2_5,
            self.pm10,
            self.ozone,
            self.carbon_monoxide,
            self.sulphur_dioxide,
            self.nitrogen_dioxide,
            self.temperature,
            self.relative_humidity,
            self.wind_speed,
            f64::from(self.hour),
            f64::from(self.day),
            f64::from(self.month),
        ]
    }
}

/// Returns true if `names` lists exactly the schema features in schema order.
pub fn matches_schema<S: AsRef<str>>(names: &[S]) -> bool {
    names.len() == FEATURE_COUNT
        && names
            .iter()
            .zip(FEATURE_NAMES.iter())
            .all(|(name, expected)| name.as_ref() == *expected)
}

/// The schema feature names as owned strings, for persisting alongside a model.
pub fn feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|name| name.to_string()).collect()
}
