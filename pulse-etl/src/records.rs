//! Flat record types produced by the extractors
//!
//! Each record type maps onto one destination table. `TabularRecord` is the
//! bridge to the sinks: it names the destination schema and renders the
//! record as one row of `SqlValue`s in column order.

use pulse_common::db::table_schemas::{AGG_TRANS, AGG_USER, MAP_TRANS, MAP_USER, TOP_TRANS, TOP_USER};
use pulse_common::TableSchema;

/// A single cell handed to a sink
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Real(f64),
    Null,
}

impl SqlValue {
    /// Render for CSV export; `Null` becomes an empty field
    pub fn to_csv_field(&self) -> String {
        match self {
            SqlValue::Text(s) => s.clone(),
            SqlValue::Integer(i) => i.to_string(),
            SqlValue::Real(f) => f.to_string(),
            SqlValue::Null => String::new(),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// A record that can be loaded into a destination table
pub trait TabularRecord {
    /// Destination schema (table, csv file, column order)
    fn schema() -> &'static TableSchema;

    /// Cell values in the schema's column order
    fn values(&self) -> Vec<SqlValue>;

    fn state_mut(&mut self) -> &mut String;

    /// District dimension, for records that carry one
    fn district_mut(&mut self) -> Option<&mut String> {
        None
    }
}

/// Identity stamped onto every record of one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotKey {
    pub state: String,
    pub year: i32,
    pub quarter: u8,
}

fn stamp(key_state: &str, year: i32, quarter: u8) -> Vec<SqlValue> {
    vec![
        SqlValue::from(key_state),
        SqlValue::Integer(year as i64),
        SqlValue::Integer(quarter as i64),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedTransactionRecord {
    pub state: String,
    pub year: i32,
    pub quarter: u8,
    pub transaction_type: String,
    pub transaction_count: i64,
    pub transaction_amount: f64,
}

impl TabularRecord for AggregatedTransactionRecord {
    fn schema() -> &'static TableSchema {
        &AGG_TRANS
    }

    fn values(&self) -> Vec<SqlValue> {
        let mut row = stamp(&self.state, self.year, self.quarter);
        row.push(self.transaction_type.as_str().into());
        row.push(self.transaction_count.into());
        row.push(self.transaction_amount.into());
        row
    }

    fn state_mut(&mut self) -> &mut String {
        &mut self.state
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedUserRecord {
    pub state: String,
    pub year: i32,
    pub quarter: u8,
    pub brand_name: String,
    pub user_count: i64,
    pub user_percentage: f64,
}

impl TabularRecord for AggregatedUserRecord {
    fn schema() -> &'static TableSchema {
        &AGG_USER
    }

    fn values(&self) -> Vec<SqlValue> {
        let mut row = stamp(&self.state, self.year, self.quarter);
        row.push(self.brand_name.as_str().into());
        row.push(self.user_count.into());
        row.push(self.user_percentage.into());
        row
    }

    fn state_mut(&mut self) -> &mut String {
        &mut self.state
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapTransactionRecord {
    pub state: String,
    pub year: i32,
    pub quarter: u8,
    pub district: String,
    pub transaction_count: i64,
    pub transaction_amount: f64,
}

impl TabularRecord for MapTransactionRecord {
    fn schema() -> &'static TableSchema {
        &MAP_TRANS
    }

    fn values(&self) -> Vec<SqlValue> {
        let mut row = stamp(&self.state, self.year, self.quarter);
        row.push(self.district.as_str().into());
        row.push(self.transaction_count.into());
        row.push(self.transaction_amount.into());
        row
    }

    fn state_mut(&mut self) -> &mut String {
        &mut self.state
    }

    fn district_mut(&mut self) -> Option<&mut String> {
        Some(&mut self.district)
    }
}

/// Map-user record; either metric may be missing in the source
#[derive(Debug, Clone, PartialEq)]
pub struct MapUserRecord {
    pub state: String,
    pub year: i32,
    pub quarter: u8,
    pub district: String,
    pub registered_users: Option<i64>,
    pub app_opens: Option<i64>,
}

impl TabularRecord for MapUserRecord {
    fn schema() -> &'static TableSchema {
        &MAP_USER
    }

    fn values(&self) -> Vec<SqlValue> {
        let mut row = stamp(&self.state, self.year, self.quarter);
        row.push(self.district.as_str().into());
        row.push(self.registered_users.into());
        row.push(self.app_opens.into());
        row
    }

    fn state_mut(&mut self) -> &mut String {
        &mut self.state
    }

    fn district_mut(&mut self) -> Option<&mut String> {
        Some(&mut self.district)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopTransactionRecord {
    pub state: String,
    pub year: i32,
    pub quarter: u8,
    pub pincode: Option<String>,
    pub transaction_count: i64,
    pub transaction_amount: f64,
}

impl TabularRecord for TopTransactionRecord {
    fn schema() -> &'static TableSchema {
        &TOP_TRANS
    }

    fn values(&self) -> Vec<SqlValue> {
        let mut row = stamp(&self.state, self.year, self.quarter);
        row.push(self.pincode.clone().into());
        row.push(self.transaction_count.into());
        row.push(self.transaction_amount.into());
        row
    }

    fn state_mut(&mut self) -> &mut String {
        &mut self.state
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopUserRecord {
    pub state: String,
    pub year: i32,
    pub quarter: u8,
    pub pincode: Option<String>,
    pub registered_user: i64,
}

impl TabularRecord for TopUserRecord {
    fn schema() -> &'static TableSchema {
        &TOP_USER
    }

    fn values(&self) -> Vec<SqlValue> {
        let mut row = stamp(&self.state, self.year, self.quarter);
        row.push(self.pincode.clone().into());
        row.push(self.registered_user.into());
        row
    }

    fn state_mut(&mut self) -> &mut String {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_follow_column_order() {
        let record = MapUserRecord {
            state: "Goa".to_string(),
            year: 2022,
            quarter: 3,
            district: "North Goa".to_string(),
            registered_users: Some(120),
            app_opens: None,
        };

        let values = record.values();
        assert_eq!(values.len(), MapUserRecord::schema().columns.len());
        assert_eq!(
            values,
            vec![
                SqlValue::Text("Goa".to_string()),
                SqlValue::Integer(2022),
                SqlValue::Integer(3),
                SqlValue::Text("North Goa".to_string()),
                SqlValue::Integer(120),
                SqlValue::Null,
            ]
        );
    }

    #[test]
    fn test_csv_field_rendering() {
        assert_eq!(SqlValue::Real(100.0).to_csv_field(), "100");
        assert_eq!(SqlValue::Real(12.5).to_csv_field(), "12.5");
        assert_eq!(SqlValue::Null.to_csv_field(), "");
        assert_eq!(SqlValue::Integer(-4).to_csv_field(), "-4");
    }
}
