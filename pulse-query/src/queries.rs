//! Dashboard queries over the loaded tables
//!
//! Every query is read-only and returns typed rows. Aggregates use the
//! column names written by pulse-etl.

use chrono::NaiveDate;
use pulse_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::format::format_indian;

/// Default row count for ranked queries
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest accepted `limit`
pub const MAX_LIMIT: u32 = 1000;

/// Which end of a ranking to return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ranking {
    #[default]
    Highest,
    Lowest,
}

impl Ranking {
    fn order(&self) -> &'static str {
        match self {
            Ranking::Highest => "DESC",
            Ranking::Lowest => "ASC",
        }
    }

    fn aggregate(&self) -> &'static str {
        match self {
            Ranking::Highest => "MAX",
            Ranking::Lowest => "MIN",
        }
    }
}

impl FromStr for Ranking {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "highest" | "top" | "desc" => Ok(Ranking::Highest),
            "lowest" | "bottom" | "asc" => Ok(Ranking::Lowest),
            other => Err(Error::InvalidInput(format!("Unknown ranking: {}", other))),
        }
    }
}

/// Brand listing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrandSelection {
    /// Every row, in table order
    All,
    /// Ordered by user count, optionally limited
    Ranked(Ranking, Option<u32>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateAmount {
    pub state: String,
    pub year: i64,
    pub transaction_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateTypeCount {
    pub state: String,
    pub transaction_type: String,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PincodeAmountUsers {
    pub state: String,
    pub year: i64,
    pub pincode: Option<String>,
    /// Sum of transaction amounts, in millions
    pub transaction_amount_millions: f64,
    pub registered_users: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictTransactions {
    pub state: String,
    pub district: String,
    pub transaction_count: i64,
    pub transaction_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictUsers {
    pub state: String,
    pub district: String,
    pub registered_users: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandUsage {
    pub state: String,
    pub year: i64,
    pub brand_name: String,
    pub user_count: i64,
    pub user_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityPincodeTransactions {
    pub state: String,
    pub year: i64,
    pub city: String,
    pub pincode: String,
    pub transaction_count: i64,
    /// Sum of transaction amounts, in millions
    pub transaction_amount_millions: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityPincodeUsers {
    pub state: String,
    pub year: i64,
    pub city: String,
    pub pincode: String,
    pub registered_users: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearDistrictTotals {
    pub year: i64,
    pub district: String,
    pub transaction_count: i64,
    pub transaction_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictAppOpens {
    pub state: String,
    pub district: String,
    pub year: i64,
    pub app_opens: Option<i64>,
}

/// Total transaction amount for one period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionTotals {
    pub year: i64,
    pub quarter: i64,
    pub transaction_count: i64,
    pub transaction_amount: f64,
    /// Rounded amount with Indian digit grouping
    pub transaction_amount_display: String,
}

/// Month closing a quarter
pub fn quarter_month(quarter: i64) -> Option<&'static str> {
    match quarter {
        1 => Some("March"),
        2 => Some("June"),
        3 => Some("September"),
        4 => Some("December"),
        _ => None,
    }
}

/// Read-only query facade over a pulse-etl database
#[derive(Clone)]
pub struct QueryFacade {
    pool: SqlitePool,
}

impl QueryFacade {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Latest loaded period as `"<Month>, <Year>"`
    pub async fn data_available_till(&self) -> Result<Option<String>> {
        let latest: Option<(i64, i64)> = sqlx::query_as(
            "SELECT Year, Quarter FROM AggTrans ORDER BY Year DESC, Quarter DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(latest.and_then(|(year, quarter)| {
            quarter_month(quarter).map(|month| format!("{}, {}", month, year))
        }))
    }

    pub async fn last_refreshed(&self) -> Result<Option<NaiveDate>> {
        let date: Option<NaiveDate> = sqlx::query_scalar("SELECT date FROM lastrefreshed LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(date)
    }

    /// States ranked by summed transaction amount, per year
    pub async fn states_by_amount(
        &self,
        year: Option<i32>,
        ranking: Ranking,
        limit: u32,
    ) -> Result<Vec<StateAmount>> {
        let filter = if year.is_some() { "WHERE Year = ?" } else { "" };
        let sql = format!(
            "SELECT State, Year, SUM(Transaction_Amount) AS Transaction_Amount \
             FROM AggTrans {} \
             GROUP BY State, Year \
             ORDER BY Transaction_Amount {} \
             LIMIT ?",
            filter,
            ranking.order()
        );

        let mut query = sqlx::query_as::<_, (String, i64, f64)>(&sql);
        if let Some(year) = year {
            query = query.bind(year);
        }
        let rows = query.bind(limit).fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(state, year, transaction_amount)| StateAmount {
                state,
                year,
                transaction_amount,
            })
            .collect())
    }

    pub async fn state_type_counts(&self) -> Result<Vec<StateTypeCount>> {
        let rows: Vec<(String, String, i64)> = sqlx::query_as(
            "SELECT State, Transaction_Type, SUM(Transaction_Count) AS Transaction_Count \
             FROM AggTrans \
             GROUP BY State, Transaction_Type \
             ORDER BY Transaction_Count DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(state, transaction_type, transaction_count)| StateTypeCount {
                state,
                transaction_type,
                transaction_count,
            })
            .collect())
    }

    /// Pincodes by transaction amount, with their registered users
    pub async fn top_pincodes_with_users(&self, limit: u32) -> Result<Vec<PincodeAmountUsers>> {
        let rows: Vec<(String, i64, Option<String>, f64, i64)> = sqlx::query_as(
            "SELECT tt.State, tt.Year, tt.Pincode, \
                    SUM(tt.Transaction_Amount) / 1000000.0 AS Transaction_Amount, \
                    SUM(tu.Registered_User) AS Registered_User \
             FROM TopTrans tt \
             JOIN TopUser tu \
               ON tt.State = tu.State AND tt.Year = tu.Year \
              AND tt.Quarter = tu.Quarter AND tt.Pincode = tu.Pincode \
             GROUP BY tt.State, tt.Year, tt.Pincode \
             ORDER BY Transaction_Amount DESC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(state, year, pincode, transaction_amount_millions, registered_users)| {
                    PincodeAmountUsers {
                        state,
                        year,
                        pincode,
                        transaction_amount_millions,
                        registered_users,
                    }
                },
            )
            .collect())
    }

    /// Per-district maximum (or minimum) quarterly transactions
    pub async fn district_transaction_extremes(
        &self,
        ranking: Ranking,
        limit: u32,
    ) -> Result<Vec<DistrictTransactions>> {
        let sql = format!(
            "SELECT State, District, {agg}(Transaction_Count) AS Transaction_Count, \
                    {agg}(Transaction_Amount) AS Transaction_Amount \
             FROM MapTrans \
             GROUP BY State, District \
             ORDER BY Transaction_Count {order}, Transaction_Amount {order} \
             LIMIT ?",
            agg = ranking.aggregate(),
            order = ranking.order()
        );

        let rows: Vec<(String, String, i64, f64)> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(
                |(state, district, transaction_count, transaction_amount)| DistrictTransactions {
                    state,
                    district,
                    transaction_count,
                    transaction_amount,
                },
            )
            .collect())
    }

    /// Per-district maximum (or minimum) registered users
    pub async fn district_user_extremes(&self, ranking: Ranking, limit: u32) -> Result<Vec<DistrictUsers>> {
        let sql = format!(
            "SELECT State, District, {agg}(RegisteredUsers) AS Registered_Users \
             FROM MapUser \
             GROUP BY State, District \
             ORDER BY Registered_Users {order} \
             LIMIT ?",
            agg = ranking.aggregate(),
            order = ranking.order()
        );

        let rows: Vec<(String, String, Option<i64>)> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(state, district, registered_users)| DistrictUsers {
                state,
                district,
                registered_users,
            })
            .collect())
    }

    pub async fn brand_usage(&self, selection: BrandSelection) -> Result<Vec<BrandUsage>> {
        let tail = match selection {
            BrandSelection::All => String::new(),
            BrandSelection::Ranked(ranking, None) => format!("ORDER BY User_Count {}", ranking.order()),
            BrandSelection::Ranked(ranking, Some(limit)) => {
                format!("ORDER BY User_Count {} LIMIT {}", ranking.order(), limit)
            }
        };
        let sql = format!(
            "SELECT State, Year, Brand_Name, User_Count, User_Percentage FROM AggUser {}",
            tail
        );

        let rows: Vec<(String, i64, String, i64, f64)> =
            sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(
                |(state, year, brand_name, user_count, user_percentage)| BrandUsage {
                    state,
                    year,
                    brand_name,
                    user_count,
                    user_percentage,
                },
            )
            .collect())
    }

    /// Pincodes by transaction count, with their city
    pub async fn top_pincodes_by_transactions(&self, limit: u32) -> Result<Vec<CityPincodeTransactions>> {
        let rows: Vec<(String, i64, String, String, i64, f64)> = sqlx::query_as(
            "SELECT tt.State, tt.Year, p.City, tt.Pincode, \
                    SUM(tt.Transaction_Count) AS Transaction_Count, \
                    SUM(tt.Transaction_Amount) / 1000000.0 AS Transaction_Amount \
             FROM TopTrans tt \
             JOIN (SELECT DISTINCT Pincode, City FROM pincode) p ON tt.Pincode = p.Pincode \
             GROUP BY tt.State, tt.Year, p.City, tt.Pincode \
             ORDER BY Transaction_Count DESC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(state, year, city, pincode, transaction_count, transaction_amount_millions)| {
                    CityPincodeTransactions {
                        state,
                        year,
                        city,
                        pincode,
                        transaction_count,
                        transaction_amount_millions,
                    }
                },
            )
            .collect())
    }

    /// Pincodes by registered users, with their city
    pub async fn top_pincodes_by_users(&self, limit: u32) -> Result<Vec<CityPincodeUsers>> {
        let rows: Vec<(String, i64, String, String, i64)> = sqlx::query_as(
            "SELECT tu.State, tu.Year, p.City, tu.Pincode, \
                    SUM(tu.Registered_User) AS Total_Registered_Users \
             FROM TopUser tu \
             JOIN (SELECT DISTINCT Pincode, City FROM pincode) p ON tu.Pincode = p.Pincode \
             GROUP BY tu.State, tu.Year, p.City, tu.Pincode \
             ORDER BY Total_Registered_Users DESC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(state, year, city, pincode, registered_users)| CityPincodeUsers {
                state,
                year,
                city,
                pincode,
                registered_users,
            })
            .collect())
    }

    /// District totals per year, earliest year first
    pub async fn top_districts_by_year(&self, limit: u32) -> Result<Vec<YearDistrictTotals>> {
        let rows: Vec<(i64, String, i64, f64)> = sqlx::query_as(
            "SELECT Year, District, \
                    SUM(Transaction_Count) AS Total_Transaction_Count, \
                    SUM(Transaction_Amount) AS Total_Transaction_Amount \
             FROM MapTrans \
             GROUP BY Year, District \
             ORDER BY Year, Total_Transaction_Count DESC, Total_Transaction_Amount DESC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(year, district, transaction_count, transaction_amount)| YearDistrictTotals {
                    year,
                    district,
                    transaction_count,
                    transaction_amount,
                },
            )
            .collect())
    }

    pub async fn top_districts_by_app_opens(&self, limit: u32) -> Result<Vec<DistrictAppOpens>> {
        let rows: Vec<(String, String, i64, Option<i64>)> = sqlx::query_as(
            "SELECT State, District, Year, SUM(AppOpens) AS AppOpens \
             FROM MapUser \
             GROUP BY State, District, Year \
             ORDER BY AppOpens DESC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(state, district, year, app_opens)| DistrictAppOpens {
                state,
                district,
                year,
                app_opens,
            })
            .collect())
    }

    /// Country-wide totals for one period; `None` when nothing is loaded
    /// for it
    pub async fn transaction_totals(&self, year: i32, quarter: u8) -> Result<Option<TransactionTotals>> {
        let row: (Option<i64>, Option<f64>) = sqlx::query_as(
            "SELECT SUM(Transaction_Count), SUM(Transaction_Amount) \
             FROM AggTrans WHERE Year = ? AND Quarter = ?",
        )
        .bind(year)
        .bind(quarter)
        .fetch_one(&self.pool)
        .await?;

        Ok(match row {
            (Some(transaction_count), Some(transaction_amount)) => Some(TransactionTotals {
                year: year as i64,
                quarter: quarter as i64,
                transaction_count,
                transaction_amount,
                transaction_amount_display: format_indian(transaction_amount.round() as i64),
            }),
            _ => None,
        })
    }
}
