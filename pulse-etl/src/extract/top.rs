//! Pincode-level (top) extractors

use super::{decode, probe, RecordExtractor, SkipReason};
use crate::records::{SnapshotKey, TopTransactionRecord, TopUserRecord};
use pulse_common::Category;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PincodeTransaction {
    #[serde(default)]
    entity_name: Option<String>,
    metric: Metric,
}

#[derive(Debug, Deserialize)]
struct Metric {
    count: i64,
    amount: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PincodeUsers {
    #[serde(default)]
    name: Option<String>,
    registered_users: i64,
}

/// `data.pincodes`: one record per pincode, keyed by `entityName`
#[derive(Debug, Default, Clone, Copy)]
pub struct TopTransactionExtractor;

impl RecordExtractor for TopTransactionExtractor {
    type Record = TopTransactionRecord;

    fn category(&self) -> Category {
        Category::TopTransaction
    }

    fn key_path(&self) -> &'static str {
        "data.pincodes"
    }

    fn extract(&self, key: &SnapshotKey, payload: &Value) -> Result<Vec<Self::Record>, SkipReason> {
        let items: Vec<PincodeTransaction> =
            decode(probe(payload, &["data", "pincodes"])?, self.key_path())?;

        Ok(items
            .into_iter()
            .map(|item| TopTransactionRecord {
                state: key.state.clone(),
                year: key.year,
                quarter: key.quarter,
                pincode: item.entity_name,
                transaction_count: item.metric.count,
                transaction_amount: item.metric.amount,
            })
            .collect())
    }
}

/// `data.pincodes`: one record per pincode, keyed by `name`
#[derive(Debug, Default, Clone, Copy)]
pub struct TopUserExtractor;

impl RecordExtractor for TopUserExtractor {
    type Record = TopUserRecord;

    fn category(&self) -> Category {
        Category::TopUser
    }

    fn key_path(&self) -> &'static str {
        "data.pincodes"
    }

    fn extract(&self, key: &SnapshotKey, payload: &Value) -> Result<Vec<Self::Record>, SkipReason> {
        let items: Vec<PincodeUsers> = decode(probe(payload, &["data", "pincodes"])?, self.key_path())?;

        Ok(items
            .into_iter()
            .map(|item| TopUserRecord {
                state: key.state.clone(),
                year: key.year,
                quarter: key.quarter,
                pincode: item.name,
                registered_user: item.registered_users,
            })
            .collect())
    }
}
