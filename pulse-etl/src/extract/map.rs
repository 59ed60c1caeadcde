//! District-level (map/hover) extractors

use super::{decode, probe, strip_district_suffix, RecordExtractor, SkipReason};
use crate::records::{MapTransactionRecord, MapUserRecord, SnapshotKey};
use pulse_common::Category;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
struct HoverItem {
    name: String,
    metric: Vec<Metric>,
}

#[derive(Debug, Deserialize)]
struct Metric {
    count: i64,
    amount: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserMetrics {
    #[serde(default)]
    registered_users: Option<i64>,
    #[serde(default)]
    app_opens: Option<i64>,
}

/// `data.hoverDataList`: one record per district
#[derive(Debug, Default, Clone, Copy)]
pub struct MapTransactionExtractor;

impl RecordExtractor for MapTransactionExtractor {
    type Record = MapTransactionRecord;

    fn category(&self) -> Category {
        Category::MapTransaction
    }

    fn key_path(&self) -> &'static str {
        "data.hoverDataList"
    }

    fn extract(&self, key: &SnapshotKey, payload: &Value) -> Result<Vec<Self::Record>, SkipReason> {
        let items: Vec<HoverItem> =
            decode(probe(payload, &["data", "hoverDataList"])?, self.key_path())?;

        items
            .into_iter()
            .map(|item| {
                let first = item.metric.first().ok_or_else(|| SkipReason::Malformed {
                    path: self.key_path().to_string(),
                    detail: format!("'{}' has no metric", item.name),
                })?;
                Ok(MapTransactionRecord {
                    state: key.state.clone(),
                    year: key.year,
                    quarter: key.quarter,
                    district: strip_district_suffix(&item.name).to_string(),
                    transaction_count: first.count,
                    transaction_amount: first.amount,
                })
            })
            .collect()
    }
}

/// `data.hoverData`: district → metrics mapping, in payload key order
#[derive(Debug, Default, Clone, Copy)]
pub struct MapUserExtractor;

impl RecordExtractor for MapUserExtractor {
    type Record = MapUserRecord;

    fn category(&self) -> Category {
        Category::MapUser
    }

    fn key_path(&self) -> &'static str {
        "data.hoverData"
    }

    fn extract(&self, key: &SnapshotKey, payload: &Value) -> Result<Vec<Self::Record>, SkipReason> {
        let hover: Map<String, Value> = decode(probe(payload, &["data", "hoverData"])?, self.key_path())?;

        hover
            .iter()
            .map(|(district, metrics)| {
                let metrics: UserMetrics = decode(metrics, self.key_path())?;
                Ok(MapUserRecord {
                    state: key.state.clone(),
                    year: key.year,
                    quarter: key.quarter,
                    district: strip_district_suffix(district).to_string(),
                    registered_users: metrics.registered_users,
                    app_opens: metrics.app_opens,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key() -> SnapshotKey {
        SnapshotKey {
            state: "tamil-nadu".to_string(),
            year: 2021,
            quarter: 1,
        }
    }

    #[test]
    fn test_hover_list_strips_district_token() {
        let payload = json!({"data": {"hoverDataList": [
            {"name": "chennai district", "metric": [{"type": "TOTAL", "count": 5, "amount": 50.5}]},
            {"name": "madurai district", "metric": [{"type": "TOTAL", "count": 2, "amount": 4.0}]}
        ]}});

        let records = MapTransactionExtractor.extract(&key(), &payload).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].district, "chennai");
        assert_eq!(records[0].transaction_amount, 50.5);
        assert_eq!(records[1].district, "madurai");
    }

    #[test]
    fn test_hover_data_keeps_key_order_and_optional_metrics() {
        let payload = json!({"data": {"hoverData": {
            "vellore district": {"registeredUsers": 10, "appOpens": 3},
            "ariyalur district": {"registeredUsers": 7}
        }}});

        let records = MapUserExtractor.extract(&key(), &payload).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].district, "vellore");
        assert_eq!(records[0].app_opens, Some(3));
        assert_eq!(records[1].district, "ariyalur");
        assert_eq!(records[1].registered_users, Some(7));
        assert_eq!(records[1].app_opens, None);
    }

    #[test]
    fn test_hover_data_list_instead_of_mapping_is_malformed() {
        let payload = json!({"data": {"hoverData": [1, 2]}});
        assert!(matches!(
            MapUserExtractor.extract(&key(), &payload),
            Err(SkipReason::Malformed { .. })
        ));
    }

    #[test]
    fn test_missing_data_block() {
        let payload = json!({"success": true});
        assert!(matches!(
            MapTransactionExtractor.extract(&key(), &payload),
            Err(SkipReason::Absent { .. })
        ));
    }
}
