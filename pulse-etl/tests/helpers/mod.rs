//! Fixture builders for pulse-etl integration tests

#![allow(dead_code)]

use pulse_common::Category;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary Pulse `data/` checkout
pub struct PulseFixture {
    pub dir: TempDir,
}

impl PulseFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn data_root(&self) -> &Path {
        self.dir.path()
    }

    pub fn category_root(&self, category: Category) -> PathBuf {
        self.data_root().join(category.relative_root())
    }

    /// Write `<category root>/<state>/<year>/<quarter>.json`
    pub fn snapshot(&self, category: Category, state: &str, year: &str, quarter: &str, payload: &Value) -> &Self {
        let dir = self.category_root(category).join(state).join(year);
        fs::create_dir_all(&dir).expect("create snapshot dir");
        fs::write(dir.join(quarter), payload.to_string()).expect("write snapshot");
        self
    }

    /// Create an empty root for every category
    pub fn empty_roots(&self) -> &Self {
        for category in Category::ALL {
            fs::create_dir_all(self.category_root(category)).expect("create category root");
        }
        self
    }
}

pub fn agg_transaction_payload(items: &[(&str, i64, f64)]) -> Value {
    let list: Vec<Value> = items
        .iter()
        .map(|(name, count, amount)| {
            serde_json::json!({
                "name": name,
                "paymentInstruments": [{"type": "TOTAL", "count": count, "amount": amount}]
            })
        })
        .collect();
    serde_json::json!({"success": true, "data": {"from": 0, "to": 0, "transactionData": list}})
}
