//! SQL schema for the feature store.
//!
//! The schema is applied as a single batch when the store is opened.

/// Returns the full SQL schema as a single batch string.
///
/// `observations` holds one row per hourly timestamp. The timestamp is the
/// primary key (text, `YYYY-MM-DDTHH:MM`, which sorts chronologically), so
/// upserts can never create a duplicate key. `european_aqi` is nullable for
/// pure-forecast rows; every other feature column is required.
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS observations (
        timestamp TEXT PRIMARY KEY,
        pm2_5 REAL NOT NULL,
        pm10 REAL NOT NULL,
        ozone REAL NOT NULL,
        carbon_monoxide REAL NOT NULL,
        carbon_dioxide REAL NOT NULL,
        sulphur_dioxide REAL NOT NULL,
        nitrogen_dioxide REAL NOT NULL,
        european_aqi REAL,
        temperature REAL NOT NULL,
        relative_humidity REAL NOT NULL,
        wind_speed REAL NOT NULL,
        hour INTEGER NOT NULL,
        day INTEGER NOT NULL,
        month INTEGER NOT NULL,
        location TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_obs_labelled ON observations(european_aqi)
        WHERE european_aqi IS NOT NULL;
    "#
}
