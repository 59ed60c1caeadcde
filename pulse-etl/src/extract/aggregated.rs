//! Aggregated transaction and user extractors

use super::{decode, probe, RecordExtractor, SkipReason};
use crate::records::{AggregatedTransactionRecord, AggregatedUserRecord, SnapshotKey};
use pulse_common::Category;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionItem {
    name: String,
    payment_instruments: Vec<Instrument>,
}

#[derive(Debug, Deserialize)]
struct Instrument {
    count: i64,
    amount: f64,
}

#[derive(Debug, Deserialize)]
struct DeviceItem {
    brand: String,
    count: i64,
    percentage: f64,
}

/// `data.transactionData`: one record per transaction type
#[derive(Debug, Default, Clone, Copy)]
pub struct AggregatedTransactionExtractor;

impl RecordExtractor for AggregatedTransactionExtractor {
    type Record = AggregatedTransactionRecord;

    fn category(&self) -> Category {
        Category::AggregatedTransaction
    }

    fn key_path(&self) -> &'static str {
        "data.transactionData"
    }

    fn extract(&self, key: &SnapshotKey, payload: &Value) -> Result<Vec<Self::Record>, SkipReason> {
        let items: Vec<TransactionItem> =
            decode(probe(payload, &["data", "transactionData"])?, self.key_path())?;

        items
            .into_iter()
            .map(|item| {
                let first = item.payment_instruments.first().ok_or_else(|| SkipReason::Malformed {
                    path: self.key_path().to_string(),
                    detail: format!("'{}' has no paymentInstruments", item.name),
                })?;
                Ok(AggregatedTransactionRecord {
                    state: key.state.clone(),
                    year: key.year,
                    quarter: key.quarter,
                    transaction_count: first.count,
                    transaction_amount: first.amount,
                    transaction_type: item.name,
                })
            })
            .collect()
    }
}

/// `data.usersByDevice`: one record per device brand
#[derive(Debug, Default, Clone, Copy)]
pub struct AggregatedUserExtractor;

impl RecordExtractor for AggregatedUserExtractor {
    type Record = AggregatedUserRecord;

    fn category(&self) -> Category {
        Category::AggregatedUser
    }

    fn key_path(&self) -> &'static str {
        "data.usersByDevice"
    }

    fn extract(&self, key: &SnapshotKey, payload: &Value) -> Result<Vec<Self::Record>, SkipReason> {
        let items: Vec<DeviceItem> =
            decode(probe(payload, &["data", "usersByDevice"])?, self.key_path())?;

        Ok(items
            .into_iter()
            .map(|item| AggregatedUserRecord {
                state: key.state.clone(),
                year: key.year,
                quarter: key.quarter,
                brand_name: item.brand,
                user_count: item.count,
                user_percentage: item.percentage,
            })
            .collect())
    }
}
