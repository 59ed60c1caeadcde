//! Table Schema Definitions
//!
//! Single source of truth for the destination tables written by `pulse-etl`
//! and read by `pulse-query`. Column order matters: sinks load rows
//! positionally in the order listed here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SQLite storage class for a destination column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    Date,
}

impl ColumnType {
    pub fn sql(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Date => "DATE",
        }
    }
}

/// One column of a destination table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: &'static str,
    pub column_type: ColumnType,
}

impl ColumnDefinition {
    pub const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self { name, column_type }
    }
}

/// A destination: table name, CSV file stem and ordered column contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    /// Table name in the relational store
    pub table: &'static str,
    /// File stem used for CSV export (`<stem>.csv`)
    pub file_stem: &'static str,
    /// Columns in load order
    pub columns: &'static [ColumnDefinition],
}

impl TableSchema {
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// `CREATE TABLE` statement for this destination
    pub fn create_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.column_type.sql()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({})", self.table, columns)
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.table)
    }
}

use ColumnType::{Date, Integer, Real, Text};

const STATE: ColumnDefinition = ColumnDefinition::new("State", Text);
const YEAR: ColumnDefinition = ColumnDefinition::new("Year", Integer);
const QUARTER: ColumnDefinition = ColumnDefinition::new("Quarter", Integer);

pub const AGG_TRANS: TableSchema = TableSchema {
    table: "AggTrans",
    file_stem: "Aggregate_Transaction",
    columns: &[
        STATE,
        YEAR,
        QUARTER,
        ColumnDefinition::new("Transaction_Type", Text),
        ColumnDefinition::new("Transaction_Count", Integer),
        ColumnDefinition::new("Transaction_Amount", Real),
    ],
};

pub const AGG_USER: TableSchema = TableSchema {
    table: "AggUser",
    file_stem: "Aggregate_User",
    columns: &[
        STATE,
        YEAR,
        QUARTER,
        ColumnDefinition::new("Brand_Name", Text),
        ColumnDefinition::new("User_Count", Integer),
        ColumnDefinition::new("User_Percentage", Real),
    ],
};

pub const MAP_TRANS: TableSchema = TableSchema {
    table: "MapTrans",
    file_stem: "Map_Transaction",
    columns: &[
        STATE,
        YEAR,
        QUARTER,
        ColumnDefinition::new("District", Text),
        ColumnDefinition::new("Transaction_Count", Integer),
        ColumnDefinition::new("Transaction_Amount", Real),
    ],
};

pub const MAP_USER: TableSchema = TableSchema {
    table: "MapUser",
    file_stem: "Map_User",
    columns: &[
        STATE,
        YEAR,
        QUARTER,
        ColumnDefinition::new("District", Text),
        ColumnDefinition::new("RegisteredUsers", Integer),
        ColumnDefinition::new("AppOpens", Integer),
    ],
};

pub const TOP_TRANS: TableSchema = TableSchema {
    table: "TopTrans",
    file_stem: "Top_Transaction",
    columns: &[
        STATE,
        YEAR,
        QUARTER,
        ColumnDefinition::new("Pincode", Text),
        ColumnDefinition::new("Transaction_Count", Integer),
        ColumnDefinition::new("Transaction_Amount", Real),
    ],
};

pub const TOP_USER: TableSchema = TableSchema {
    table: "TopUser",
    file_stem: "Top_User",
    columns: &[
        STATE,
        YEAR,
        QUARTER,
        ColumnDefinition::new("Pincode", Text),
        ColumnDefinition::new("Registered_User", Integer),
    ],
};

/// Single-row data freshness stamp read by the dashboard
pub const LAST_REFRESHED: TableSchema = TableSchema {
    table: "lastrefreshed",
    file_stem: "lastrefreshed",
    columns: &[ColumnDefinition::new("date", Date)],
};

/// Pincode → city reference used for city joins
pub const PINCODE: TableSchema = TableSchema {
    table: "pincode",
    file_stem: "pincode",
    columns: &[
        ColumnDefinition::new("Pincode", Text),
        ColumnDefinition::new("City", Text),
    ],
};

/// The six data categories of a Pulse data drop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    AggregatedTransaction,
    AggregatedUser,
    MapTransaction,
    MapUser,
    TopTransaction,
    TopUser,
}

impl Category {
    /// All categories in processing order
    pub const ALL: [Category; 6] = [
        Category::AggregatedTransaction,
        Category::AggregatedUser,
        Category::MapTransaction,
        Category::MapUser,
        Category::TopTransaction,
        Category::TopUser,
    ];

    pub fn schema(&self) -> &'static TableSchema {
        match self {
            Category::AggregatedTransaction => &AGG_TRANS,
            Category::AggregatedUser => &AGG_USER,
            Category::MapTransaction => &MAP_TRANS,
            Category::MapUser => &MAP_USER,
            Category::TopTransaction => &TOP_TRANS,
            Category::TopUser => &TOP_USER,
        }
    }

    /// Category root relative to a Pulse `data/` checkout
    pub fn relative_root(&self) -> &'static str {
        match self {
            Category::AggregatedTransaction => "aggregated/transaction/country/india/state",
            Category::AggregatedUser => "aggregated/user/country/india/state",
            Category::MapTransaction => "map/transaction/hover/country/india/state",
            Category::MapUser => "map/user/hover/country/india/state",
            Category::TopTransaction => "top/transaction/country/india/state",
            Category::TopUser => "top/user/country/india/state",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::AggregatedTransaction => "aggregated_transaction",
            Category::AggregatedUser => "aggregated_user",
            Category::MapTransaction => "map_transaction",
            Category::MapUser => "map_user",
            Category::TopTransaction => "top_transaction",
            Category::TopUser => "top_user",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| crate::Error::InvalidInput(format!("Unknown category: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_contracts() {
        assert_eq!(
            AGG_TRANS.column_names(),
            vec!["State", "Year", "Quarter", "Transaction_Type", "Transaction_Count", "Transaction_Amount"]
        );
        assert_eq!(
            MAP_USER.column_names(),
            vec!["State", "Year", "Quarter", "District", "RegisteredUsers", "AppOpens"]
        );
        assert_eq!(
            TOP_USER.column_names(),
            vec!["State", "Year", "Quarter", "Pincode", "Registered_User"]
        );
    }

    #[test]
    fn test_create_sql() {
        assert_eq!(
            TOP_USER.create_sql(),
            "CREATE TABLE TopUser (State TEXT, Year INTEGER, Quarter INTEGER, Pincode TEXT, Registered_User INTEGER)"
        );
        assert_eq!(LAST_REFRESHED.drop_sql(), "DROP TABLE IF EXISTS lastrefreshed");
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("map_user".parse::<Category>().unwrap(), Category::MapUser);
        assert_eq!("Top-Transaction".parse::<Category>().unwrap(), Category::TopTransaction);
        assert!("nonsense".parse::<Category>().is_err());
    }

    #[test]
    fn test_every_category_has_distinct_table() {
        let mut tables: Vec<_> = Category::ALL.iter().map(|c| c.schema().table).collect();
        tables.sort();
        tables.dedup();
        assert_eq!(tables.len(), 6);
    }
}
