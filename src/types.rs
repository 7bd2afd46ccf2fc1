use crate::config::Field;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tabled::Tabled;

/// The input table exactly as read: a header row plus string cells.
///
/// Every record is padded or cut to the header width by the loader, so
/// `records[i][j]` is always the cell of column `headers[j]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, records: Vec<Vec<String>>) -> Self {
        Self { headers, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, idx: usize) -> Option<RawRecord<'_>> {
        self.records.get(idx).map(|cells| RawRecord {
            headers: &self.headers,
            cells,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = RawRecord<'_>> {
        self.records.iter().map(move |cells| RawRecord {
            headers: &self.headers,
            cells,
        })
    }
}

/// Column name -> cell view over one record of a `RawTable`.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    headers: &'a [String],
    cells: &'a [String],
}

impl<'a> RawRecord<'a> {
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.headers.iter().position(|h| h == column)?;
        Some(self.cell(idx))
    }

    /// Cell by column position; missing trailing cells read as blank.
    pub fn cell(&self, idx: usize) -> &'a str {
        self.cells.get(idx).map(String::as_str).unwrap_or("")
    }
}

/// A record mapped onto the canonical schema.
///
/// Numeric fields are always finite and non-negative; anything that could
/// not be read as such was replaced by 0 during normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRow {
    pub timestamp: Option<NaiveDateTime>,
    pub likes: f64,
    pub comments: f64,
    pub shares: f64,
    pub bookmarks: f64,
    pub impressions: f64,
    pub engagements: f64,
    /// Unconsumed source columns in header order, values untouched.
    pub extra: Vec<(String, String)>,
}

impl NormalizedRow {
    /// Numeric value of a canonical field. `Timestamp` has none.
    pub fn metric(&self, field: Field) -> Option<f64> {
        match field {
            Field::Timestamp => None,
            Field::Likes => Some(self.likes),
            Field::Comments => Some(self.comments),
            Field::Shares => Some(self.shares),
            Field::Bookmarks => Some(self.bookmarks),
            Field::Impressions => Some(self.impressions),
            Field::Engagements => Some(self.engagements),
        }
    }

    pub(crate) fn metric_mut(&mut self, field: Field) -> Option<&mut f64> {
        match field {
            Field::Timestamp => None,
            Field::Likes => Some(&mut self.likes),
            Field::Comments => Some(&mut self.comments),
            Field::Shares => Some(&mut self.shares),
            Field::Bookmarks => Some(&mut self.bookmarks),
            Field::Impressions => Some(&mut self.impressions),
            Field::Engagements => Some(&mut self.engagements),
        }
    }

    /// likes + comments + shares, plus bookmarks when they count.
    pub fn interaction_total(&self, include_bookmarks: bool) -> f64 {
        let base = self.likes + self.comments + self.shares;
        if include_bookmarks {
            base + self.bookmarks
        } else {
            base
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.timestamp.map(|ts| ts.date())
    }

    pub fn extra_value(&self, column: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

/// A normalized row with its engagement rate.
///
/// `engagement_rate` is `None` when impressions are zero, negative or
/// absent. It is never collapsed to 0.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRow {
    pub row: NormalizedRow,
    pub engagement_rate: Option<f64>,
}

/// Per-calendar-day roll-up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub posts: usize,
    pub rated_posts: usize,
    pub engagements_sum: f64,
    pub impressions_sum: f64,
    pub engagement_rate_mean: Option<f64>,
}

impl DailyAggregate {
    /// A day is worth reporting only if it has engagements, impressions and
    /// at least one defined rate.
    pub fn is_informative(&self) -> bool {
        self.engagements_sum > 0.0
            && self.impressions_sum > 0.0
            && self.engagement_rate_mean.is_some()
    }
}

/// A cell that could not be read as its field's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellIssue {
    /// Zero-based data row index (header excluded).
    pub row: usize,
    pub column: String,
    pub value: String,
}

#[derive(Debug, Tabled, Clone)]
pub struct DerivedRowView {
    #[tabled(rename = "Timestamp")]
    pub timestamp: String,
    #[tabled(rename = "Likes")]
    pub likes: String,
    #[tabled(rename = "Comments")]
    pub comments: String,
    #[tabled(rename = "Shares")]
    pub shares: String,
    #[tabled(rename = "Bookmarks")]
    pub bookmarks: String,
    #[tabled(rename = "Impressions")]
    pub impressions: String,
    #[tabled(rename = "Engagements")]
    pub engagements: String,
    #[tabled(rename = "EngagementRate")]
    pub engagement_rate: String,
}

#[derive(Debug, Tabled, Clone)]
pub struct DailyAggregateView {
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Posts")]
    pub posts: usize,
    #[tabled(rename = "Engagements")]
    pub engagements_sum: String,
    #[tabled(rename = "Impressions")]
    pub impressions_sum: String,
    #[tabled(rename = "AvgEngagementRate")]
    pub engagement_rate_mean: String,
}

/// Headline numbers for the dashboard tiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_posts: usize,
    pub total_impressions: f64,
    pub total_interactions: f64,
    /// Total interactions over total impressions, as a percentage.
    pub overall_engagement_rate: Option<f64>,
    /// Mean of the defined per-post rates.
    pub avg_post_engagement_rate: Option<f64>,
    pub days_reported: usize,
    pub best_day: Option<NaiveDate>,
}
