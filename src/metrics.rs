use crate::config::PipelineConfig;
use crate::types::{DerivedRow, NormalizedRow};

/// Engagement rate in percent: interactions over impressions, times 100.
///
/// Returns `None` when impressions are zero, negative or not finite, and
/// when the arithmetic itself does not produce a finite number. A row with
/// no usable denominator has no rate; it does not have a rate of 0.
pub fn engagement_rate(row: &NormalizedRow, include_bookmarks: bool) -> Option<f64> {
    let impressions = row.impressions;
    if !impressions.is_finite() || impressions <= 0.0 {
        return None;
    }
    let rate = (row.interaction_total(include_bookmarks) / impressions) * 100.0;
    rate.is_finite().then_some(rate)
}

pub fn derive(row: NormalizedRow, config: &PipelineConfig) -> DerivedRow {
    let engagement_rate = engagement_rate(&row, config.include_bookmarks_in_interactions);
    DerivedRow {
        row,
        engagement_rate,
    }
}

/// Derive every row, returning the rows and how many ended up without a
/// rate.
pub fn derive_all(rows: Vec<NormalizedRow>, config: &PipelineConfig) -> (Vec<DerivedRow>, usize) {
    let derived: Vec<DerivedRow> = rows.into_iter().map(|r| derive(r, config)).collect();
    let undefined = derived.iter().filter(|d| d.engagement_rate.is_none()).count();
    (derived, undefined)
}
