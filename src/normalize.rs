// Schema normalization: map whatever column names an export uses onto the
// canonical row, reading every cell leniently.
use crate::config::{Field, PipelineConfig};
use crate::types::{CellIssue, NormalizedRow, RawTable};
use crate::util::{parse_count_safe, parse_timestamp_safe, TIMESTAMP_OUTPUT_FORMAT};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeReport {
    /// Canonical fields with no matching source column.
    pub missing_columns: Vec<Field>,
    /// Source column chosen for each resolved field.
    pub resolved_columns: BTreeMap<Field, String>,
    /// Columns carried through untouched.
    pub passthrough_columns: Vec<String>,
    /// Non-blank cells that could not be read; replaced by 0 or no timestamp.
    pub uncoercible_values: Vec<CellIssue>,
}

/// Pick a header position for each canonical field: the first alias
/// present in the header wins.
fn resolve_columns(headers: &[String], config: &PipelineConfig) -> BTreeMap<Field, usize> {
    Field::ALL
        .into_iter()
        .filter_map(|field| {
            config
                .column_aliases
                .names(field)
                .iter()
                .find_map(|alias| headers.iter().position(|h| h == alias))
                .map(|idx| (field, idx))
        })
        .collect()
}

/// Map every record of `table` onto a `NormalizedRow`, in input order.
pub fn normalize(table: &RawTable, config: &PipelineConfig) -> (Vec<NormalizedRow>, NormalizeReport) {
    let resolved = resolve_columns(&table.headers, config);
    let missing_columns: Vec<Field> = Field::ALL
        .into_iter()
        .filter(|f| !resolved.contains_key(f))
        .collect();
    let passthrough: Vec<usize> = (0..table.headers.len())
        .filter(|idx| !resolved.values().any(|v| v == idx))
        .collect();
    let derive_engagements = !resolved.contains_key(&Field::Engagements);

    let mut uncoercible_values = Vec::new();
    let mut rows = Vec::with_capacity(table.len());

    for (row_idx, record) in table.iter().enumerate() {
        let mut row = NormalizedRow::default();
        for (&field, &col) in &resolved {
            let cell = record.cell(col);
            if cell.trim().is_empty() {
                continue;
            }
            let ok = if field == Field::Timestamp {
                row.timestamp = parse_timestamp_safe(Some(cell));
                row.timestamp.is_some()
            } else {
                match (row.metric_mut(field), parse_count_safe(Some(cell))) {
                    (Some(slot), Some(v)) => {
                        *slot = v;
                        true
                    }
                    _ => false,
                }
            };
            if !ok {
                uncoercible_values.push(CellIssue {
                    row: row_idx,
                    column: table.headers[col].clone(),
                    value: cell.to_string(),
                });
            }
        }
        if derive_engagements {
            row.engagements = row.interaction_total(config.include_bookmarks_in_interactions);
        }
        row.extra = passthrough
            .iter()
            .map(|&idx| (table.headers[idx].clone(), record.cell(idx).to_string()))
            .collect();
        rows.push(row);
    }

    let report = NormalizeReport {
        missing_columns,
        resolved_columns: resolved
            .iter()
            .map(|(&field, &idx)| (field, table.headers[idx].clone()))
            .collect(),
        passthrough_columns: passthrough.iter().map(|&idx| table.headers[idx].clone()).collect(),
        uncoercible_values,
    };
    (rows, report)
}

/// Render normalized rows back into a table with canonical headers followed
/// by the pass-through columns of the first row.
///
/// Normalizing the result yields the same rows again.
pub fn denormalize(rows: &[NormalizedRow]) -> RawTable {
    let extra_columns: Vec<String> = rows
        .first()
        .map(|r| r.extra.iter().map(|(name, _)| name.clone()).collect())
        .unwrap_or_default();

    let mut headers: Vec<String> = Field::ALL
        .iter()
        .map(|f| f.canonical_name().to_string())
        .collect();
    headers.extend(extra_columns.iter().cloned());

    let records = rows
        .iter()
        .map(|row| {
            let mut cells: Vec<String> = Field::ALL
                .iter()
                .map(|&field| match row.metric(field) {
                    Some(v) => v.to_string(),
                    None => row
                        .timestamp
                        .map(|ts| ts.format(TIMESTAMP_OUTPUT_FORMAT).to_string())
                        .unwrap_or_default(),
                })
                .collect();
            cells.extend(
                extra_columns
                    .iter()
                    .map(|name| row.extra_value(name).unwrap_or_default().to_string()),
            );
            cells
        })
        .collect();

    RawTable::new(headers, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::read_table;
    use chrono::NaiveDate;

    const X_EXPORT: &str = "\
Post id,Date,Impressions,Likes,Replies,Reposts,Bookmarks,Engagements,Post text
1,2024-01-01 09:00:00,\"1,200\",40,5,3,2,60,hello
2,2024-01-02,300,abc,1,0,,4,world
3,not a date,0,0,0,0,0,0,
";

    fn normalize_str(csv: &str, config: &PipelineConfig) -> (Vec<NormalizedRow>, NormalizeReport) {
        let table = read_table(csv.as_bytes()).unwrap();
        normalize(&table, config)
    }

    #[test]
    fn resolves_capitalised_aliases() {
        let (rows, report) = normalize_str(X_EXPORT, &PipelineConfig::default());
        assert_eq!(rows.len(), 3);
        assert!(report.missing_columns.is_empty());
        assert_eq!(report.resolved_columns[&Field::Comments], "Replies");
        assert_eq!(report.resolved_columns[&Field::Shares], "Reposts");

        let first = &rows[0];
        assert_eq!(
            first.timestamp.map(|ts| ts.date()),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(first.impressions, 1200.0);
        assert_eq!(first.likes, 40.0);
        assert_eq!(first.comments, 5.0);
        assert_eq!(first.shares, 3.0);
        assert_eq!(first.bookmarks, 2.0);
        assert_eq!(first.engagements, 60.0);
    }

    #[test]
    fn bad_cells_become_defaults_and_are_reported() {
        let (rows, report) = normalize_str(X_EXPORT, &PipelineConfig::default());
        assert_eq!(rows[1].likes, 0.0);
        assert_eq!(rows[1].bookmarks, 0.0);
        assert_eq!(rows[2].timestamp, None);

        let issues: Vec<(usize, &str)> = report
            .uncoercible_values
            .iter()
            .map(|i| (i.row, i.column.as_str()))
            .collect();
        assert_eq!(issues, vec![(1, "Likes"), (2, "Date")]);
    }

    #[test]
    fn unknown_columns_pass_through_in_order() {
        let (rows, report) = normalize_str(X_EXPORT, &PipelineConfig::default());
        assert_eq!(report.passthrough_columns, vec!["Post id", "Post text"]);
        assert_eq!(
            rows[0].extra,
            vec![
                ("Post id".to_string(), "1".to_string()),
                ("Post text".to_string(), "hello".to_string()),
            ]
        );
        assert_eq!(rows[2].extra_value("Post text"), Some(""));
    }

    #[test]
    fn missing_columns_default_to_zero() {
        let csv = "likes,comments\n3,4\n";
        let (rows, report) = normalize_str(csv, &PipelineConfig::default());
        assert_eq!(
            report.missing_columns,
            vec![
                Field::Timestamp,
                Field::Shares,
                Field::Bookmarks,
                Field::Impressions,
                Field::Engagements
            ]
        );
        assert_eq!(rows[0].impressions, 0.0);
        assert_eq!(rows[0].timestamp, None);
        assert!(report.uncoercible_values.is_empty());
    }

    #[test]
    fn engagements_fall_back_to_interaction_total() {
        let csv = "likes,comments,shares,bookmarks\n10,2,1,4\n";
        let (rows, _) = normalize_str(csv, &PipelineConfig::default());
        assert_eq!(rows[0].engagements, 13.0);

        let config = PipelineConfig {
            include_bookmarks_in_interactions: true,
            ..PipelineConfig::default()
        };
        let (rows, _) = normalize_str(csv, &config);
        assert_eq!(rows[0].engagements, 17.0);
    }

    #[test]
    fn first_alias_wins_and_loser_passes_through() {
        let csv = "Likes,likes\n1,2\n";
        let (rows, report) = normalize_str(csv, &PipelineConfig::default());
        assert_eq!(rows[0].likes, 2.0);
        assert_eq!(report.passthrough_columns, vec!["Likes"]);
    }

    #[test]
    fn negative_counts_are_rejected() {
        let csv = "impressions,likes\n-50,3\n";
        let (rows, report) = normalize_str(csv, &PipelineConfig::default());
        assert_eq!(rows[0].impressions, 0.0);
        assert_eq!(report.uncoercible_values.len(), 1);
        assert_eq!(report.uncoercible_values[0].value, "-50");
    }

    #[test]
    fn normalization_is_idempotent() {
        let config = PipelineConfig::default();
        let (rows, _) = normalize_str(X_EXPORT, &config);
        let (again, report) = normalize(&denormalize(&rows), &config);
        assert_eq!(again, rows);
        assert!(report.uncoercible_values.is_empty());
    }
}
