//! Reference tables loaded alongside the extracted data
//!
//! - `lastrefreshed`: one row holding the run date
//! - `pincode`: pincode → city pairs from an external CSV, used by the
//!   query side for city joins

use crate::records::SqlValue;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct PincodeRow {
    #[serde(rename = "Pincode")]
    pincode: String,
    #[serde(rename = "City")]
    city: String,
}

/// Row for the `lastrefreshed` table
pub fn last_refreshed_row(date: NaiveDate) -> Vec<SqlValue> {
    vec![SqlValue::Text(date.format("%Y-%m-%d").to_string())]
}

/// Distinct (Pincode, City) rows, in first-seen order
///
/// Columns other than `Pincode` and `City` are ignored.
pub fn load_pincode_rows(path: &Path) -> Result<Vec<Vec<SqlValue>>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for result in reader.deserialize::<PincodeRow>() {
        let row = result?;
        if seen.insert((row.pincode.clone(), row.city.clone())) {
            rows.push(vec![SqlValue::Text(row.pincode), SqlValue::Text(row.city)]);
        }
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "Pincode reference read");
    Ok(rows)
}
