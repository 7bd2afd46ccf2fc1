use crate::types::{DailyAggregate, DerivedRow, SummaryStats};
use crate::util::mean;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Running sums for one calendar day.
///
/// Keeps the rate sum and count rather than a mean, so accumulators built
/// over separate slices of the input merge into the exact same result.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DayAccumulator {
    pub posts: usize,
    pub rated_posts: usize,
    pub engagements_sum: f64,
    pub impressions_sum: f64,
    pub rate_sum: f64,
}

impl DayAccumulator {
    pub fn push(&mut self, row: &DerivedRow) {
        self.posts += 1;
        self.engagements_sum += row.row.engagements;
        self.impressions_sum += row.row.impressions;
        if let Some(rate) = row.engagement_rate {
            self.rated_posts += 1;
            self.rate_sum += rate;
        }
    }

    pub fn merge(&mut self, other: &DayAccumulator) {
        self.posts += other.posts;
        self.rated_posts += other.rated_posts;
        self.engagements_sum += other.engagements_sum;
        self.impressions_sum += other.impressions_sum;
        self.rate_sum += other.rate_sum;
    }

    pub fn mean_rate(&self) -> Option<f64> {
        (self.rated_posts > 0).then(|| self.rate_sum / self.rated_posts as f64)
    }

    pub fn finish(&self, date: NaiveDate) -> DailyAggregate {
        DailyAggregate {
            date,
            posts: self.posts,
            rated_posts: self.rated_posts,
            engagements_sum: self.engagements_sum,
            impressions_sum: self.impressions_sum,
            engagement_rate_mean: self.mean_rate(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateReport {
    /// Rows that fell into no day bucket.
    pub rows_without_timestamp: usize,
    /// Days dropped because they carried no signal.
    pub dropped_days: Vec<NaiveDate>,
}

/// Bucket rows by calendar date. Rows without a timestamp are counted and
/// left out.
pub fn accumulate(rows: &[DerivedRow]) -> (BTreeMap<NaiveDate, DayAccumulator>, usize) {
    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
    let mut without_timestamp = 0usize;
    for r in rows {
        match r.row.date() {
            Some(date) => days.entry(date).or_default().push(r),
            None => without_timestamp += 1,
        }
    }
    (days, without_timestamp)
}

/// Per-day aggregates in ascending date order, non-informative days
/// removed.
pub fn aggregate_daily(rows: &[DerivedRow]) -> (Vec<DailyAggregate>, AggregateReport) {
    let (days, rows_without_timestamp) = accumulate(rows);
    let mut report = AggregateReport {
        rows_without_timestamp,
        dropped_days: Vec::new(),
    };
    let mut out = Vec::with_capacity(days.len());
    for (date, acc) in &days {
        let agg = acc.finish(*date);
        if agg.is_informative() {
            out.push(agg);
        } else {
            report.dropped_days.push(*date);
        }
    }
    (out, report)
}

pub fn generate_summary(
    rows: &[DerivedRow],
    days: &[DailyAggregate],
    include_bookmarks: bool,
) -> SummaryStats {
    let total_impressions: f64 = rows.iter().map(|r| r.row.impressions).sum();
    let total_interactions: f64 = rows
        .iter()
        .map(|r| r.row.interaction_total(include_bookmarks))
        .sum();
    let overall_engagement_rate = (total_impressions > 0.0)
        .then(|| (total_interactions / total_impressions) * 100.0)
        .filter(|r| r.is_finite());
    let rates: Vec<f64> = rows.iter().filter_map(|r| r.engagement_rate).collect();
    let best_day = days
        .iter()
        .filter_map(|d| d.engagement_rate_mean.map(|m| (d.date, m)))
        .max_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(Ordering::Equal)
                // earliest date wins ties
                .then_with(|| b.0.cmp(&a.0))
        })
        .map(|(date, _)| date);
    SummaryStats {
        total_posts: rows.len(),
        total_impressions,
        total_interactions,
        overall_engagement_rate,
        avg_post_engagement_rate: mean(&rates),
        days_reported: days.len(),
        best_day,
    }
}
