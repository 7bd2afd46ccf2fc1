use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop a run before the pipeline gets to see any rows.
///
/// Everything that can go wrong with an individual cell or row is recovered
/// inside the pipeline and reported through `Diagnostics` instead.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("input table has no header row")]
    MissingHeader,

    #[error("invalid config file {}: {}", .path.display(), .source)]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown field `{field}` in column_aliases of {}", .path.display())]
    UnknownField { path: PathBuf, field: String },

    #[error("no .csv file found in {}", .0.display())]
    NoInputFound(PathBuf),
}
