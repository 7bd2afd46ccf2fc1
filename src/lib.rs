//! Engagement-rate derivation and daily roll-ups for social-media post
//! exports.
//!
//! The pipeline is `loader` -> `normalize` -> `metrics` -> `aggregate`,
//! wired together by [`pipeline::run`].
pub mod aggregate;
pub mod config;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod types;
pub mod util;

pub use config::{ColumnAliases, Field, PipelineConfig};
pub use error::ReportError;
pub use pipeline::{run, Diagnostics, PipelineOutput};
