//! Dashboard query endpoints
//!
//! - `GET /api/freshness`: latest loaded period and refresh date
//! - `GET /api/totals?year&quarter`: country-wide totals for a period
//! - `GET /api/query/:name?year&ranking&limit`: one of the named queries

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::error::{QueryError, QueryResult};
use crate::queries::{BrandSelection, Ranking, TransactionTotals, DEFAULT_LIMIT, MAX_LIMIT};
use crate::AppState;

/// Named queries served under `/api/query/:name`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryName {
    StatesByAmount,
    StateTypeCounts,
    TopPincodesWithUsers,
    DistrictTransactionExtremes,
    DistrictUserExtremes,
    BrandUsage,
    TopPincodesByTransactions,
    TopPincodesByUsers,
    TopDistrictsByYear,
    TopDistrictsByAppOpens,
}

impl QueryName {
    pub const ALL: [QueryName; 10] = [
        QueryName::StatesByAmount,
        QueryName::StateTypeCounts,
        QueryName::TopPincodesWithUsers,
        QueryName::DistrictTransactionExtremes,
        QueryName::DistrictUserExtremes,
        QueryName::BrandUsage,
        QueryName::TopPincodesByTransactions,
        QueryName::TopPincodesByUsers,
        QueryName::TopDistrictsByYear,
        QueryName::TopDistrictsByAppOpens,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryName::StatesByAmount => "states_by_amount",
            QueryName::StateTypeCounts => "state_type_counts",
            QueryName::TopPincodesWithUsers => "top_pincodes_with_users",
            QueryName::DistrictTransactionExtremes => "district_transaction_extremes",
            QueryName::DistrictUserExtremes => "district_user_extremes",
            QueryName::BrandUsage => "brand_usage",
            QueryName::TopPincodesByTransactions => "top_pincodes_by_transactions",
            QueryName::TopPincodesByUsers => "top_pincodes_by_users",
            QueryName::TopDistrictsByYear => "top_districts_by_year",
            QueryName::TopDistrictsByAppOpens => "top_districts_by_app_opens",
        }
    }
}

impl FromStr for QueryName {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace('-', "_");
        QueryName::ALL
            .into_iter()
            .find(|q| q.as_str() == normalized)
            .ok_or_else(|| QueryError::NotFound(format!("Unknown query: {}", s)))
    }
}

/// Raw query string; parsed by hand so bad values get a JSON 400
#[derive(Debug, Default, Deserialize)]
pub struct QueryParams {
    pub year: Option<String>,
    pub quarter: Option<String>,
    pub ranking: Option<String>,
    pub limit: Option<String>,
}

impl QueryParams {
    fn year(&self) -> QueryResult<Option<i32>> {
        self.year
            .as_deref()
            .filter(|y| !y.is_empty() && !y.eq_ignore_ascii_case("all"))
            .map(|y| {
                y.parse::<i32>()
                    .map_err(|_| QueryError::BadRequest(format!("Invalid year: {}", y)))
            })
            .transpose()
    }

    fn quarter(&self) -> QueryResult<Option<u8>> {
        self.quarter
            .as_deref()
            .map(|q| match q.parse::<u8>() {
                Ok(q) if (1..=4).contains(&q) => Ok(q),
                _ => Err(QueryError::BadRequest(format!("Invalid quarter: {}", q))),
            })
            .transpose()
    }

    fn ranking(&self) -> QueryResult<Option<Ranking>> {
        Ok(self.ranking.as_deref().map(Ranking::from_str).transpose()?)
    }

    fn limit(&self) -> QueryResult<Option<u32>> {
        self.limit
            .as_deref()
            .map(|l| match l.parse::<u32>() {
                Ok(n) if (1..=MAX_LIMIT).contains(&n) => Ok(n),
                _ => Err(QueryError::BadRequest(format!(
                    "Invalid limit: {} (expected 1..={})",
                    l, MAX_LIMIT
                ))),
            })
            .transpose()
    }
}

#[derive(Debug, Serialize)]
pub struct FreshnessResponse {
    pub data_available_till: Option<String>,
    pub last_refreshed: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub query: &'static str,
    pub row_count: usize,
    pub rows: Value,
}

fn respond<T: Serialize>(name: QueryName, rows: Vec<T>) -> QueryResult<Json<QueryResponse>> {
    let row_count = rows.len();
    let rows = serde_json::to_value(rows)
        .map_err(|e| pulse_common::Error::Internal(format!("Serializing rows: {}", e)))?;
    Ok(Json(QueryResponse {
        query: name.as_str(),
        row_count,
        rows,
    }))
}

/// GET /api/freshness
pub async fn freshness(State(state): State<AppState>) -> QueryResult<Json<FreshnessResponse>> {
    Ok(Json(FreshnessResponse {
        data_available_till: state.queries.data_available_till().await?,
        last_refreshed: state.queries.last_refreshed().await?,
    }))
}

/// GET /api/totals?year=2022&quarter=3
pub async fn totals(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> QueryResult<Json<TransactionTotals>> {
    let (Some(year), Some(quarter)) = (params.year()?, params.quarter()?) else {
        return Err(QueryError::BadRequest(
            "year and quarter are required".to_string(),
        ));
    };

    state
        .queries
        .transaction_totals(year, quarter)
        .await?
        .map(Json)
        .ok_or_else(|| QueryError::NotFound(format!("No data for {} Q{}", year, quarter)))
}

/// GET /api/query/:name
pub async fn run_query(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<QueryParams>,
) -> QueryResult<Json<QueryResponse>> {
    let name: QueryName = name.parse()?;
    let q = &state.queries;
    let limit = params.limit()?.unwrap_or(DEFAULT_LIMIT);
    let ranking = params.ranking()?;

    tracing::debug!(query = name.as_str(), limit, "Running query");

    match name {
        QueryName::StatesByAmount => respond(
            name,
            q.states_by_amount(params.year()?, ranking.unwrap_or_default(), limit)
                .await?,
        ),
        QueryName::StateTypeCounts => respond(name, q.state_type_counts().await?),
        QueryName::TopPincodesWithUsers => respond(name, q.top_pincodes_with_users(limit).await?),
        QueryName::DistrictTransactionExtremes => respond(
            name,
            q.district_transaction_extremes(ranking.unwrap_or_default(), limit)
                .await?,
        ),
        QueryName::DistrictUserExtremes => respond(
            name,
            q.district_user_extremes(ranking.unwrap_or_default(), limit)
                .await?,
        ),
        QueryName::BrandUsage => {
            let selection = match ranking {
                None => BrandSelection::All,
                Some(ranking) => BrandSelection::Ranked(ranking, params.limit()?),
            };
            respond(name, q.brand_usage(selection).await?)
        }
        QueryName::TopPincodesByTransactions => {
            respond(name, q.top_pincodes_by_transactions(limit).await?)
        }
        QueryName::TopPincodesByUsers => respond(name, q.top_pincodes_by_users(limit).await?),
        QueryName::TopDistrictsByYear => respond(name, q.top_districts_by_year(limit).await?),
        QueryName::TopDistrictsByAppOpens => {
            respond(name, q.top_districts_by_app_opens(limit).await?)
        }
    }
}

/// Build query routes
pub fn query_routes() -> Router<AppState> {
    Router::new()
        .route("/api/freshness", get(freshness))
        .route("/api/totals", get(totals))
        .route("/api/query/:name", get(run_query))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_name_parse() {
        assert_eq!(
            "states_by_amount".parse::<QueryName>().unwrap(),
            QueryName::StatesByAmount
        );
        assert_eq!(
            "top-districts-by-app-opens".parse::<QueryName>().unwrap(),
            QueryName::TopDistrictsByAppOpens
        );
        assert!(matches!(
            "drop_tables".parse::<QueryName>(),
            Err(QueryError::NotFound(_))
        ));
    }

    #[test]
    fn test_param_parsing() {
        let params = QueryParams {
            year: Some("All".to_string()),
            limit: Some("25".to_string()),
            ..Default::default()
        };
        assert_eq!(params.year().unwrap(), None);
        assert_eq!(params.limit().unwrap(), Some(25));

        let bad = QueryParams {
            year: Some("20x1".to_string()),
            limit: Some("0".to_string()),
            quarter: Some("5".to_string()),
            ranking: Some("sideways".to_string()),
        };
        assert!(matches!(bad.year(), Err(QueryError::BadRequest(_))));
        assert!(matches!(bad.limit(), Err(QueryError::BadRequest(_))));
        assert!(matches!(bad.quarter(), Err(QueryError::BadRequest(_))));
        assert!(matches!(
            bad.ranking(),
            Err(QueryError::Common(pulse_common::Error::InvalidInput(_)))
        ));
    }
}
