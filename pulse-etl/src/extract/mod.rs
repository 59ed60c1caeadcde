//! Record extraction
//!
//! One `RecordExtractor` per category turns a parsed snapshot into flat
//! records. The shared driver handles label parsing, per-snapshot skip
//! decisions and canonicalization, so each variant only describes its
//! key path and item shape.

mod aggregated;
mod map;
mod top;

pub use aggregated::{AggregatedTransactionExtractor, AggregatedUserExtractor};
pub use map::{MapTransactionExtractor, MapUserExtractor};
pub use top::{TopTransactionExtractor, TopUserExtractor};

use crate::canonical::{is_known_state, NameCanonicalizer};
use crate::records::{SnapshotKey, TabularRecord};
use crate::walker::{RawSnapshot, WalkResult};
use pulse_common::Category;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Why a snapshot contributed no records
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    /// Expected key missing or null
    #[error("{path} is absent or null")]
    Absent { path: String },

    /// Collection present but an item has the wrong shape
    #[error("{path} is malformed: {detail}")]
    Malformed { path: String, detail: String },

    /// Year directory or quarter file name does not parse
    #[error("invalid label '{label}': {detail}")]
    InvalidLabel { label: String, detail: String },

    /// Canonical state outside the known vocabulary (strict mode only)
    #[error("unknown state '{state}'")]
    UnknownState { state: String },
}

/// Per-snapshot extraction outcome
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotOutcome<R> {
    Extracted(Vec<R>),
    Skipped(SkipReason),
}

/// Extracts records of one category from a snapshot payload
pub trait RecordExtractor {
    type Record: TabularRecord;

    fn category(&self) -> Category;

    /// Dotted key path of the collection this extractor reads
    fn key_path(&self) -> &'static str;

    /// Records for one payload, stamped with `key`
    ///
    /// `state` in the returned records is the raw directory label;
    /// canonicalization happens in the shared driver.
    fn extract(&self, key: &SnapshotKey, payload: &Value) -> Result<Vec<Self::Record>, SkipReason>;
}

/// A skipped snapshot, for the run summary
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSnapshot {
    pub state: String,
    pub year: String,
    pub quarter: String,
    pub reason: SkipReason,
}

/// All records of one category plus the snapshots that were skipped
#[derive(Debug, Clone)]
pub struct Extraction<R> {
    pub records: Vec<R>,
    pub skipped: Vec<SkippedSnapshot>,
}

impl<R> Default for Extraction<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Quarter token of a quarter file name: the exact `.json` suffix removed
///
/// Names without the suffix are returned unchanged.
pub fn quarter_token(file_name: &str) -> &str {
    file_name.strip_suffix(".json").unwrap_or(file_name)
}

pub fn parse_quarter(file_name: &str) -> Result<u8, SkipReason> {
    let invalid = |detail: &str| SkipReason::InvalidLabel {
        label: file_name.to_string(),
        detail: detail.to_string(),
    };

    let quarter: u8 = quarter_token(file_name)
        .parse()
        .map_err(|_| invalid("quarter is not an integer"))?;
    if !(1..=4).contains(&quarter) {
        return Err(invalid("quarter outside 1..=4"));
    }
    Ok(quarter)
}

pub fn parse_year(label: &str) -> Result<i32, SkipReason> {
    let invalid = || SkipReason::InvalidLabel {
        label: label.to_string(),
        detail: "year is not a 4-digit integer".to_string(),
    };

    if label.len() != 4 || !label.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    label.parse().map_err(|_| invalid())
}

impl SnapshotKey {
    pub fn from_labels(state: &str, year: &str, quarter: &str) -> Result<Self, SkipReason> {
        Ok(Self {
            state: state.to_string(),
            year: parse_year(year)?,
            quarter: parse_quarter(quarter)?,
        })
    }
}

/// Remove a trailing ` district` token (ASCII case-insensitive)
pub fn strip_district_suffix(name: &str) -> &str {
    const TOKEN: &str = "district";

    let trimmed = name.trim_end();
    let Some(split) = trimmed.len().checked_sub(TOKEN.len()) else {
        return trimmed;
    };
    if !trimmed.is_char_boundary(split) {
        return trimmed;
    }

    let (head, tail) = trimmed.split_at(split);
    if tail.eq_ignore_ascii_case(TOKEN) && head.ends_with(char::is_whitespace) {
        head.trim_end()
    } else {
        trimmed
    }
}

/// Follow `path` into `payload`
///
/// A missing or null value at any step is `Absent`; a non-object parent is
/// `Malformed`.
pub(crate) fn probe<'a>(payload: &'a Value, path: &[&str]) -> Result<&'a Value, SkipReason> {
    let absent = || SkipReason::Absent {
        path: path.join("."),
    };

    let mut current = payload;
    for segment in path {
        let object = match current {
            Value::Object(map) => map,
            Value::Null => return Err(absent()),
            _ => {
                return Err(SkipReason::Malformed {
                    path: path.join("."),
                    detail: format!("expected an object above '{}'", segment),
                })
            }
        };
        current = match object.get(*segment) {
            Some(Value::Null) | None => return Err(absent()),
            Some(value) => value,
        };
    }
    Ok(current)
}

/// Deserialize a probed collection, mapping shape errors to `Malformed`
pub(crate) fn decode<T: DeserializeOwned>(value: &Value, path: &str) -> Result<T, SkipReason> {
    T::deserialize(value).map_err(|e| SkipReason::Malformed {
        path: path.to_string(),
        detail: e.to_string(),
    })
}

/// Extract, canonicalize and vet one snapshot
pub fn extract_snapshot<E: RecordExtractor>(
    extractor: &E,
    snapshot: RawSnapshot<'_>,
    canonicalizer: &NameCanonicalizer,
    strict_states: bool,
) -> SnapshotOutcome<E::Record> {
    let outcome = SnapshotKey::from_labels(snapshot.state, snapshot.year, snapshot.quarter)
        .and_then(|key| {
            let state = canonicalizer.state(&key.state);
            if !is_known_state(&state) {
                if strict_states {
                    return Err(SkipReason::UnknownState { state });
                }
                warn!(
                    category = %extractor.category(),
                    state = %state,
                    "State not in canonical vocabulary, keeping records"
                );
            }

            let mut records = extractor.extract(&key, snapshot.payload)?;
            for record in &mut records {
                *record.state_mut() = state.clone();
                if let Some(district) = record.district_mut() {
                    *district = canonicalizer.district(district);
                }
            }
            Ok(records)
        });

    match outcome {
        Ok(records) => SnapshotOutcome::Extracted(records),
        Err(reason) => SnapshotOutcome::Skipped(reason),
    }
}

/// Run an extractor over every snapshot of a walk
pub fn extract_snapshots<E: RecordExtractor>(
    extractor: &E,
    walk: &WalkResult,
    canonicalizer: &NameCanonicalizer,
    strict_states: bool,
) -> Extraction<E::Record> {
    let mut extraction = Extraction::default();

    for snapshot in walk.snapshots() {
        match extract_snapshot(extractor, snapshot, canonicalizer, strict_states) {
            SnapshotOutcome::Extracted(records) => extraction.records.extend(records),
            SnapshotOutcome::Skipped(reason) => {
                warn!(
                    category = %extractor.category(),
                    state = snapshot.state,
                    year = snapshot.year,
                    quarter = snapshot.quarter,
                    "Skipping snapshot: {}",
                    reason
                );
                extraction.skipped.push(SkippedSnapshot {
                    state: snapshot.state.to_string(),
                    year: snapshot.year.to_string(),
                    quarter: snapshot.quarter.to_string(),
                    reason,
                });
            }
        }
    }

    extraction
}
