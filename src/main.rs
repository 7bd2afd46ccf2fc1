// Entry point and high-level CLI flow.
//
// - Load the export (a given file, or the newest .csv in a directory).
// - Run the pipeline and report what it had to recover from.
// - Write the row table, the daily table and summary.json, and print
//   Markdown previews of each.
use anyhow::{bail, Context, Result};
use clap::Parser;
use engagement_report::config::resolve_config;
use engagement_report::types::{DailyAggregateView, DerivedRowView};
use engagement_report::{aggregate, loader, output, pipeline, util, Diagnostics};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Engagement rate and daily roll-ups for post metric exports", long_about = None)]
struct Cli {
    /// CSV export to process
    input: Option<PathBuf>,

    /// Process the most recently modified .csv in this directory instead
    #[arg(long, conflicts_with = "input")]
    dir: Option<PathBuf>,

    /// TOML file with `include_bookmarks_in_interactions` and `[column_aliases]`
    #[arg(long)]
    config: Option<PathBuf>,

    /// Count bookmarks as an interaction (overrides the config file)
    #[arg(long)]
    include_bookmarks: bool,

    /// Where the output files are written
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Rows shown in each console preview
    #[arg(long, default_value_t = 5)]
    preview: usize,
}

fn resolve_input(cli: &Cli) -> Result<PathBuf> {
    match (&cli.input, &cli.dir) {
        (Some(path), _) => Ok(path.clone()),
        (None, Some(dir)) => loader::latest_csv_in(dir)
            .with_context(|| format!("looking for an export in {}", dir.display())),
        (None, None) => bail!("pass an input file or --dir"),
    }
}

/// Turn the pipeline's diagnostics into log events.
fn log_diagnostics(diag: &Diagnostics) {
    for field in &diag.missing_columns {
        warn!(%field, "no source column; using defaults");
    }
    if !diag.passthrough_columns.is_empty() {
        debug!(columns = ?diag.passthrough_columns, "passing through unrecognized columns");
    }
    for issue in &diag.uncoercible_values {
        debug!(row = issue.row, column = %issue.column, value = %issue.value, "unreadable cell");
    }
    if !diag.uncoercible_values.is_empty() {
        warn!(
            "{} cells could not be read and were treated as 0 / no timestamp",
            util::format_int(diag.uncoercible_values.len() as u64)
        );
    }
    if diag.undefined_rate_rows > 0 {
        info!(
            "{} rows have no engagement rate (zero or missing impressions)",
            util::format_int(diag.undefined_rate_rows as u64)
        );
    }
    if diag.rows_without_timestamp > 0 {
        warn!(
            "{} rows have no timestamp and are left out of the daily table",
            util::format_int(diag.rows_without_timestamp as u64)
        );
    }
    if !diag.dropped_days.is_empty() {
        info!(days = ?diag.dropped_days, "dropped days without engagement signal");
    }
}

/// Write one output file; a failure is logged and the remaining outputs
/// are still attempted.
fn write_output(path: &Path, result: Result<(), engagement_report::ReportError>) {
    match result {
        Ok(()) => info!(path = %path.display(), "written"),
        Err(e) => error!(path = %path.display(), "write error: {}", e),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let input = resolve_input(&cli)?;
    let config = resolve_config(cli.config.as_deref(), cli.include_bookmarks)?;

    let table = loader::load_table(&input)
        .with_context(|| format!("failed to load {}", input.display()))?;
    println!(
        "Processing dataset... ({} rows loaded)",
        util::format_int(table.len() as u64)
    );

    let out = pipeline::run(&table, &config);
    log_diagnostics(&out.diagnostics);

    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("creating {}", cli.out_dir.display()))?;
    let rows_file = cli.out_dir.join("derived_rows.csv");
    let daily_file = cli.out_dir.join("daily_aggregates.csv");
    let summary_file = cli.out_dir.join("summary.json");

    write_output(&rows_file, output::write_derived_csv(&rows_file, &out.rows));
    output::preview_table(
        "Posts with Engagement Rate",
        Some(if config.include_bookmarks_in_interactions {
            "interactions = likes + comments + shares + bookmarks"
        } else {
            "interactions = likes + comments + shares"
        }),
        out.rows.iter().map(DerivedRowView::from).collect(),
        cli.preview,
    );
    println!("(Full table exported to {})\n", rows_file.display());

    write_output(&daily_file, output::write_csv(&daily_file, &out.daily));
    output::preview_table(
        "Daily Engagement",
        Some("days without impressions, engagements or a defined rate are omitted"),
        out.daily.iter().map(DailyAggregateView::from).collect(),
        cli.preview,
    );
    println!("(Full table exported to {})\n", daily_file.display());

    let summary = aggregate::generate_summary(
        &out.rows,
        &out.daily,
        config.include_bookmarks_in_interactions,
    );
    write_output(&summary_file, output::write_json(&summary_file, &summary));
    println!("Summary Stats ({}):", summary_file.display());
    println!(
        "{{\"posts\": {}, \"impressions\": {}, \"engagement_rate\": \"{}\"}}\n",
        util::format_int(summary.total_posts as u64),
        util::format_number(summary.total_impressions, 0),
        util::format_rate(summary.overall_engagement_rate)
    );
    Ok(())
}
