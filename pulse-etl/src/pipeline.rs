//! Run orchestration
//!
//! Processes one category at a time, start to finish:
//! walk → extract → canonicalize → replace in every sink.
//! All awaits are sequential; the run holds no shared state besides the
//! sinks passed in.

use crate::canonical::NameCanonicalizer;
use crate::config::EtlSettings;
use crate::error::{EtlError, EtlResult};
use crate::extract::{
    extract_snapshots, AggregatedTransactionExtractor, AggregatedUserExtractor,
    MapTransactionExtractor, MapUserExtractor, RecordExtractor, TopTransactionExtractor,
    TopUserExtractor,
};
use crate::records::{SqlValue, TabularRecord};
use crate::reference::{last_refreshed_row, load_pincode_rows};
use crate::sink::TabularSink;
use crate::walker::PathWalker;
use chrono::NaiveDate;
use pulse_common::config::TomlConfig;
use pulse_common::db::table_schemas::{LAST_REFRESHED, PINCODE};
use pulse_common::{Category, TableSchema};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// One category to load and where its tree lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryJob {
    pub category: Category,
    pub root: PathBuf,
}

/// Everything a run needs besides its sinks
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub jobs: Vec<CategoryJob>,
    pub strict_states: bool,
    pub canonicalizer: NameCanonicalizer,
}

impl PipelineConfig {
    /// Jobs for `categories`, rooted under `data_root` unless overridden in
    /// the TOML `[roots]` table
    pub fn new(data_root: &Path, categories: &[Category], toml_config: &TomlConfig) -> Self {
        let jobs = categories
            .iter()
            .map(|&category| CategoryJob {
                category,
                root: toml_config.category_root(data_root, category),
            })
            .collect();

        Self {
            jobs,
            strict_states: toml_config.strict_states,
            canonicalizer: NameCanonicalizer::with_overrides(&toml_config.canonical.state_overrides),
        }
    }

    pub fn from_settings(settings: &EtlSettings, toml_config: &TomlConfig) -> Self {
        let mut config = Self::new(&settings.data_root, &settings.categories, toml_config);
        config.strict_states = settings.strict_states;
        config
    }
}

/// Per-category result
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    pub table: &'static str,
    pub snapshots: usize,
    pub rows: usize,
    pub skipped: usize,
}

/// Result of a whole run, stored as JSON in `ingest_runs.summary`
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub categories: Vec<CategorySummary>,
}

impl RunSummary {
    pub fn total_rows(&self) -> usize {
        self.categories.iter().map(|c| c.rows).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.categories.iter().map(|c| c.skipped).sum()
    }

    pub fn get(&self, category: Category) -> Option<&CategorySummary> {
        self.categories.iter().find(|c| c.category == category)
    }
}

/// Load every configured category into every sink
///
/// A walk or sink failure aborts the run; destinations already replaced
/// keep their new content.
pub async fn run_pipeline(
    config: &PipelineConfig,
    sinks: &mut [&mut dyn TabularSink],
) -> EtlResult<RunSummary> {
    let mut summary = RunSummary::default();

    for job in &config.jobs {
        let category_summary = match job.category {
            Category::AggregatedTransaction => {
                run_category(&AggregatedTransactionExtractor, job, config, sinks).await?
            }
            Category::AggregatedUser => {
                run_category(&AggregatedUserExtractor, job, config, sinks).await?
            }
            Category::MapTransaction => {
                run_category(&MapTransactionExtractor, job, config, sinks).await?
            }
            Category::MapUser => run_category(&MapUserExtractor, job, config, sinks).await?,
            Category::TopTransaction => {
                run_category(&TopTransactionExtractor, job, config, sinks).await?
            }
            Category::TopUser => run_category(&TopUserExtractor, job, config, sinks).await?,
        };
        summary.categories.push(category_summary);
    }

    info!(
        categories = summary.categories.len(),
        rows = summary.total_rows(),
        skipped = summary.total_skipped(),
        "Run complete"
    );

    Ok(summary)
}

async fn run_category<E: RecordExtractor>(
    extractor: &E,
    job: &CategoryJob,
    config: &PipelineConfig,
    sinks: &mut [&mut dyn TabularSink],
) -> EtlResult<CategorySummary> {
    info!(category = %job.category, root = %job.root.display(), "Loading category");

    let walk = PathWalker::new()
        .walk(&job.root)
        .map_err(|source| EtlError::Walk {
            category: job.category,
            source,
        })?;

    let extraction = extract_snapshots(extractor, &walk, &config.canonicalizer, config.strict_states);
    let rows: Vec<Vec<SqlValue>> = extraction.records.iter().map(TabularRecord::values).collect();

    let schema = <E::Record as TabularRecord>::schema();
    replace_everywhere(sinks, schema, &rows).await?;

    let category_summary = CategorySummary {
        category: job.category,
        table: schema.table,
        snapshots: walk.len(),
        rows: rows.len(),
        skipped: extraction.skipped.len(),
    };

    info!(
        category = %job.category,
        snapshots = category_summary.snapshots,
        rows = category_summary.rows,
        skipped = category_summary.skipped,
        "Category loaded"
    );

    Ok(category_summary)
}

/// Replace one destination in every sink
pub async fn replace_everywhere(
    sinks: &mut [&mut dyn TabularSink],
    schema: &TableSchema,
    rows: &[Vec<SqlValue>],
) -> EtlResult<()> {
    for sink in sinks.iter_mut() {
        let name = sink.name();
        sink.replace(schema, rows)
            .await
            .map_err(|source| EtlError::Sink {
                destination: format!("{}:{}", name, schema.table),
                source,
            })?;
    }
    Ok(())
}

/// Stamp `lastrefreshed` with the run date
pub async fn write_last_refreshed(sink: &mut dyn TabularSink, date: NaiveDate) -> EtlResult<()> {
    replace_everywhere(&mut [sink], &LAST_REFRESHED, &[last_refreshed_row(date)]).await?;
    info!(date = %date, "Refresh date stamped");
    Ok(())
}

/// Load the pincode → city reference table, returning the row count
pub async fn write_pincode_reference(sink: &mut dyn TabularSink, csv_path: &Path) -> EtlResult<usize> {
    let rows = load_pincode_rows(csv_path)?;
    replace_everywhere(&mut [sink], &PINCODE, &rows).await?;
    info!(rows = rows.len(), path = %csv_path.display(), "Pincode reference loaded");
    Ok(rows.len())
}
