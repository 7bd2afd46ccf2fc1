// Raw table -> normalized rows -> derived rows -> daily aggregates.
use crate::aggregate::aggregate_daily;
use crate::config::{Field, PipelineConfig};
use crate::metrics::derive_all;
use crate::normalize::normalize;
use crate::types::{CellIssue, DailyAggregate, DerivedRow, RawTable};
use chrono::NaiveDate;

/// Everything that was recovered from during a run. The pipeline never
/// logs; callers decide how to render this.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub total_rows: usize,
    pub missing_columns: Vec<Field>,
    pub passthrough_columns: Vec<String>,
    pub uncoercible_values: Vec<CellIssue>,
    pub undefined_rate_rows: usize,
    pub rows_without_timestamp: usize,
    pub dropped_days: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// One row per input record, input order.
    pub rows: Vec<DerivedRow>,
    /// Informative days, ascending.
    pub daily: Vec<DailyAggregate>,
    pub diagnostics: Diagnostics,
}

pub fn run(table: &RawTable, config: &PipelineConfig) -> PipelineOutput {
    let (normalized, norm_report) = normalize(table, config);
    let (rows, undefined_rate_rows) = derive_all(normalized, config);
    let (daily, agg_report) = aggregate_daily(&rows);

    let diagnostics = Diagnostics {
        total_rows: table.len(),
        missing_columns: norm_report.missing_columns,
        passthrough_columns: norm_report.passthrough_columns,
        uncoercible_values: norm_report.uncoercible_values,
        undefined_rate_rows,
        rows_without_timestamp: agg_report.rows_without_timestamp,
        dropped_days: agg_report.dropped_days,
    };
    PipelineOutput {
        rows,
        daily,
        diagnostics,
    }
}
