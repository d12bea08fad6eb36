//! Read access to the feature store.

use crate::models::StoreSummary;
use crate::FeatureStore;
use aqi_core::error::{AqiError, Result};
use aqi_core::observation::ObservationRecord;
use aqi_utils::dates::parse_hour;
use rusqlite::types::Type;
use rusqlite::Error::FromSqlConversionFailure;

impl FeatureStore {
    /// Every stored record, ascending by timestamp.
    pub fn read_all(&self) -> Result<Vec<ObservationRecord>> {
        let conn = self.conn.borrow();
        let mut stmt = conn
            .prepare(
                "SELECT timestamp, pm2_5, pm10, ozone, carbon_monoxide, carbon_dioxide,
                        sulphur_dioxide, nitrogen_dioxide, european_aqi, temperature,
                        relative_humidity, wind_speed, hour, day, month, location
                 FROM observations
                 ORDER BY timestamp",
            )
            .map_err(AqiError::store)?;
        let records = stmt
            .query_map([], |row| {
                let raw: String = row.get(0)?;
                let timestamp = parse_hour(&raw)
                    .map_err(|e| FromSqlConversionFailure(0, Type::Text, e.into()))?;
                Ok(ObservationRecord {
                    timestamp,
                    pm2_5: row.get(1)?,
                    pm10: row.get(2)?,
                    ozone: row.get(3)?,
                    carbon_monoxide: row.get(4)?,
                    carbon_dioxide: row.get(5)?,
                    sulphur_dioxide: row.get(6)?,
                    nitrogen_dioxide: row.get(7)?,
                    european_aqi: row.get(8)?,
                    temperature: row.get(9)?,
                    relative_humidity: row.get(10)?,
                    wind_speed: row.get(11)?,
                    hour: row.get(12)?,
                    day: row.get(13)?,
                    month: row.get(14)?,
                    location: row.get(15)?,
                })
            })
            .map_err(AqiError::store)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(AqiError::store)?;
        log::info!("[AQI] store: read_all returned {} records", records.len());
        Ok(records)
    }

    /// Row counts and time range of the stored records.
    pub fn summary(&self) -> Result<StoreSummary> {
        let conn = self.conn.borrow();
        let (rows, labelled_rows, first, last): (i64, i64, Option<String>, Option<String>) = conn
            .query_row(
                "SELECT COUNT(*), COUNT(european_aqi), MIN(timestamp), MAX(timestamp)
                 FROM observations",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .map_err(AqiError::store)?;
        let parse = |value: Option<String>| -> Result<_> {
            value
                .map(|s| parse_hour(&s).map_err(AqiError::store))
                .transpose()
        };
        Ok(StoreSummary {
            rows: rows as usize,
            labelled_rows: labelled_rows as usize,
            first: parse(first)?,
            last: parse(last)?,
        })
    }
}
