//! Idempotent upsert of normalized records into the store.

use crate::FeatureStore;
use aqi_core::error::{AqiError, Result};
use aqi_core::observation::ObservationRecord;
use aqi_utils::dates::format_hour;
use rusqlite::params;

impl FeatureStore {
    /// Upsert records keyed by timestamp.
    ///
    /// A timestamp already present is replaced, never duplicated, so
    /// appending the same batch twice leaves the store unchanged. The whole
    /// batch is written in one transaction: on failure nothing is stored.
    ///
    /// Returns the number of records written.
    pub fn append(&self, records: &[ObservationRecord]) -> Result<usize> {
        let mut conn = self.conn.borrow_mut();
        let tx = conn.transaction().map_err(AqiError::store)?;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT OR REPLACE INTO observations
                     (timestamp, pm2_5, pm10, ozone, carbon_monoxide, carbon_dioxide,
                      sulphur_dioxide, nitrogen_dioxide, european_aqi, temperature,
                      relative_humidity, wind_speed, hour, day, month, location)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                )
                .map_err(AqiError::store)?;
            for r in records {
                stmt.execute(params![
                    format_hour(&r.timestamp),
                    r.pm2_5,
                    r.pm10,
                    r.ozone,
                    r.carbon_monoxide,
                    r.carbon_dioxide,
                    r.sulphur_dioxide,
                    r.nitrogen_dioxide,
                    r.european_aqi,
                    r.temperature,
                    r.relative_humidity,
                    r.wind_speed,
                    r.hour,
                    r.day,
                    r.month,
                    r.location,
                ])
                .map_err(AqiError::store)?;
            }
        }
        tx.commit().map_err(AqiError::store)?;
        log::info!("[AQI] store: appended {} records", records.len());
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::record;
    use crate::FeatureStore;

    #[test]
    fn append_same_record_twice_is_idempotent() {
        let store = FeatureStore::open_in_memory().unwrap();
        let r = record(3, Some(71.0));
        store.append(&[r.clone()]).unwrap();
        let once = store.read_all().unwrap().len();
        store.append(&[r]).unwrap();
        let twice = store.read_all().unwrap().len();
        assert_eq!(once, 1);
        assert_eq!(twice, once, "Re-appending a timestamp must not add a row");
    }

    #[test]
    fn append_replaces_on_conflict() {
        let store = FeatureStore::open_in_memory().unwrap();
        store.append(&[record(3, None)]).unwrap();
        store.append(&[record(3, Some(88.0))]).unwrap();

        let all = store.read_all().unwrap();
        assert_eq!(all.len(), 1, "Should have 1 row after upsert");
        assert_eq!(all[0].european_aqi, Some(88.0));
    }

    #[test]
    fn append_order_does_not_matter() {
        let forward = FeatureStore::open_in_memory().unwrap();
        forward
            .append(&[record(1, Some(10.0)), record(2, Some(20.0)), record(3, None)])
            .unwrap();

        let backward = FeatureStore::open_in_memory().unwrap();
        backward.append(&[record(3, None)]).unwrap();
        backward.append(&[record(2, Some(20.0))]).unwrap();
        backward.append(&[record(1, Some(10.0))]).unwrap();

        assert_eq!(forward.read_all().unwrap(), backward.read_all().unwrap());
    }

    #[test]
    fn append_overlapping_batches() {
        let store = FeatureStore::open_in_memory().unwrap();
        let first: Vec<_> = (0..5).map(|h| record(h, Some(50.0))).collect();
        let second: Vec<_> = (3..8).map(|h| record(h, Some(60.0))).collect();
        store.append(&first).unwrap();
        store.append(&second).unwrap();

        let all = store.read_all().unwrap();
        assert_eq!(all.len(), 8);
        // overlapping hours take the later batch
        assert_eq!(all[3].european_aqi, Some(60.0));
        assert_eq!(all[2].european_aqi, Some(50.0));
    }

    #[test]
    fn append_empty_batch() {
        let store = FeatureStore::open_in_memory().unwrap();
        assert_eq!(store.append(&[]).unwrap(), 0);
        assert!(store.read_all().unwrap().is_empty());
    }
}
