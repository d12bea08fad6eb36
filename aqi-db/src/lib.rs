//! SQLite feature store for normalized air quality observations.
//!
//! The store accumulates [`ObservationRecord`]s keyed by timestamp:
//!
//! - [`FeatureStore::append`] is an idempotent upsert; re-inserting a
//!   timestamp replaces the stored row instead of adding a second one.
//! - [`FeatureStore::read_all`] returns every stored row, ascending by
//!   timestamp.
//!
//! Every failure is reported as `AqiError::StoreUnavailable`; the store does
//! not retry.
//!
//! # Usage
//!
//! ```rust
//! use aqi_db::FeatureStore;
//!
//! let store = FeatureStore::open_in_memory().unwrap();
//! assert!(store.read_all().unwrap().is_empty());
//! ```
//!
//! [`ObservationRecord`]: aqi_core::observation::ObservationRecord

pub mod schema;
mod loader;
mod queries;
pub mod models;

use aqi_core::error::{AqiError, Result};
use rusqlite::Connection;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Handle to the feature store.
///
/// Cheaply cloneable (via `Rc`); clones share one connection.
#[derive(Clone)]
pub struct FeatureStore {
    conn: Rc<RefCell<Connection>>,
}

impl FeatureStore {
    /// Open (or create) a file-backed store with the schema applied.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(AqiError::store)?;
            }
        }
        let conn = Connection::open(path).map_err(AqiError::store)?;
        log::info!("[AQI] store: opened {}", path.display());
        Self::with_connection(conn)
    }

    /// Create an empty in-memory store with the schema applied.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(AqiError::store)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(schema::create_schema())
            .map_err(AqiError::store)?;
        Ok(Self {
            conn: Rc::new(RefCell::new(conn)),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use aqi_core::location::KARACHI_TAG;
    use aqi_core::observation::ObservationRecord;
    use chrono::{NaiveDate, NaiveDateTime};

    pub(crate) fn hour(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    /// A complete record at 2024-11-01 `h`:00.
    pub(crate) fn record(h: u32, european_aqi: Option<f64>) -> ObservationRecord {
        ObservationRecord {
            timestamp: hour(h),
            pm2_5: 38.0 + f64::from(h),
            pm10: 61.0,
            ozone: 52.0,
            carbon_monoxide: 412.0,
            carbon_dioxide: 428.0,
            sulphur_dioxide: 9.8,
            nitrogen_dioxide: 18.4,
            european_aqi,
            temperature: 24.1,
            relative_humidity: 68.0,
            wind_speed: 9.4,
            hour: h,
            day: 1,
            month: 11,
            location: KARACHI_TAG.to_string(),
        }
    }

    #[test]
    fn store_creates_successfully() {
        let store = FeatureStore::open_in_memory();
        assert!(store.is_ok(), "Store should create without errors");
    }

    #[test]
    fn store_starts_empty() {
        let store = FeatureStore::open_in_memory().unwrap();
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("features.sqlite");
        {
            let store = FeatureStore::open(&path).unwrap();
            store
                .append(&[record(0, Some(50.0))])
                .unwrap();
        }
        let reopened = FeatureStore::open(&path).unwrap();
        assert_eq!(reopened.read_all().unwrap().len(), 1);
    }

    #[test]
    fn store_unavailable_on_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be opened as a database file
        let err = FeatureStore::open(dir.path()).err().unwrap();
        assert!(matches!(err, AqiError::StoreUnavailable(_)));
    }
}
