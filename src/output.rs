use crate::config::Field;
use crate::error::ReportError;
use crate::types::{DailyAggregate, DailyAggregateView, DerivedRow, DerivedRowView};
use crate::util::{format_number, format_rate, TIMESTAMP_OUTPUT_FORMAT};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the per-row table: canonical fields, `engagement_rate`, then the
/// pass-through columns. An undefined rate is an empty cell.
pub fn write_derived<W: Write>(writer: W, rows: &[DerivedRow]) -> Result<(), ReportError> {
    let extra_columns: Vec<&str> = rows
        .first()
        .map(|r| r.row.extra.iter().map(|(name, _)| name.as_str()).collect())
        .unwrap_or_default();

    let mut wtr = csv::Writer::from_writer(writer);
    let mut header: Vec<&str> = Field::ALL.iter().map(|f| f.canonical_name()).collect();
    header.push("engagement_rate");
    header.extend(extra_columns.iter().copied());
    wtr.write_record(&header)?;

    for d in rows {
        let mut record: Vec<String> = Field::ALL
            .iter()
            .map(|&field| match d.row.metric(field) {
                Some(v) => v.to_string(),
                None => d
                    .row
                    .timestamp
                    .map(|ts| ts.format(TIMESTAMP_OUTPUT_FORMAT).to_string())
                    .unwrap_or_default(),
            })
            .collect();
        record.push(d.engagement_rate.map(|r| r.to_string()).unwrap_or_default());
        record.extend(
            extra_columns
                .iter()
                .map(|name| d.row.extra_value(name).unwrap_or_default().to_string()),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_derived_csv(path: &Path, rows: &[DerivedRow]) -> Result<(), ReportError> {
    let file = std::fs::File::create(path)?;
    write_derived(file, rows)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ReportError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

impl From<&DerivedRow> for DerivedRowView {
    fn from(d: &DerivedRow) -> Self {
        let r = &d.row;
        DerivedRowView {
            timestamp: r
                .timestamp
                .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
            likes: format_number(r.likes, 0),
            comments: format_number(r.comments, 0),
            shares: format_number(r.shares, 0),
            bookmarks: format_number(r.bookmarks, 0),
            impressions: format_number(r.impressions, 0),
            engagements: format_number(r.engagements, 0),
            engagement_rate: format_rate(d.engagement_rate),
        }
    }
}

impl From<&DailyAggregate> for DailyAggregateView {
    fn from(d: &DailyAggregate) -> Self {
        DailyAggregateView {
            date: d.date.format("%Y-%m-%d").to_string(),
            posts: d.posts,
            engagements_sum: format_number(d.engagements_sum, 0),
            impressions_sum: format_number(d.impressions_sum, 0),
            engagement_rate_mean: format_rate(d.engagement_rate_mean),
        }
    }
}

/// Markdown preview of the first `max_rows` rows.
pub fn render_table<T: Tabled>(rows: Vec<T>, max_rows: usize) -> String {
    let slice: Vec<T> = rows.into_iter().take(max_rows).collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: Vec<T>, max_rows: usize)
where
    T: Tabled,
{
    println!("\n{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    println!("{}\n", render_table(rows, max_rows));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NormalizedRow;
    use chrono::NaiveDate;

    fn sample() -> Vec<DerivedRow> {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0);
        vec![
            DerivedRow {
                row: NormalizedRow {
                    timestamp: ts,
                    likes: 10.0,
                    comments: 2.0,
                    shares: 1.0,
                    impressions: 100.0,
                    engagements: 13.0,
                    extra: vec![("Post text".to_string(), "hi, all".to_string())],
                    ..NormalizedRow::default()
                },
                engagement_rate: Some(13.0),
            },
            DerivedRow {
                row: NormalizedRow {
                    likes: 5.0,
                    engagements: 5.0,
                    extra: vec![("Post text".to_string(), String::new())],
                    ..NormalizedRow::default()
                },
                engagement_rate: None,
            },
        ]
    }

    #[test]
    fn derived_csv_keeps_undefined_distinct_from_zero() {
        let mut buf = Vec::new();
        write_derived(&mut buf, &sample()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "timestamp,likes,comments,shares,bookmarks,impressions,engagements,engagement_rate,Post text"
        );
        assert_eq!(lines[1], "2024-01-01T09:30:00,10,2,1,0,100,13,13,\"hi, all\"");
        assert_eq!(lines[2], ",5,0,0,0,0,5,,");
    }

    #[test]
    fn views_render_na_for_missing_rates() {
        let rows = sample();
        let view = DerivedRowView::from(&rows[1]);
        assert_eq!(view.engagement_rate, "n/a");
        assert_eq!(view.timestamp, "-");

        let rendered = render_table(rows.iter().map(DerivedRowView::from).collect(), 5);
        assert!(rendered.contains("13.00%"));
        assert!(rendered.contains("n/a"));
        assert_eq!(render_table(Vec::<DailyAggregateView>::new(), 5), "(no rows)");
    }
}
