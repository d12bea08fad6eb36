//! Report what the feature store holds.

use crate::staged;
use anyhow::Context;
use aqi_db::models::StoreSummary;
use aqi_db::FeatureStore;
use aqi_utils::dates::format_hour;
use std::path::Path;

pub fn run_features(store_path: &Path, json: bool) -> anyhow::Result<()> {
    let store = FeatureStore::open(store_path)
        .map_err(staged)
        .with_context(|| format!("opening feature store {}", store_path.display()))?;
    let summary = store.summary().map_err(staged)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", describe(&summary));
    }
    Ok(())
}

fn describe(summary: &StoreSummary) -> String {
    let mut out = format!(
        "rows: {}\nlabelled rows: {}\n",
        summary.rows, summary.labelled_rows
    );
    match (summary.first, summary.last) {
        (Some(first), Some(last)) => {
            out.push_str(&format!("range: {} .. {}\n", format_hour(&first), format_hour(&last)));
        }
        _ => out.push_str("range: (empty)\n"),
    }
    out
}
