//! Reconciles a multi-table compliance export (previous day, today and an
//! optional day-over-day table) into one dataset, and derives the grouped,
//! filtered summaries the dashboard shows.
pub mod decode;
pub mod delta;
pub mod error;
pub mod filters;
pub mod loader;
pub mod output;
pub mod regions;
pub mod reports;
pub mod segment;
pub mod types;
pub mod util;

pub use error::DashboardError;
pub use loader::{assemble, assemble_at, load_dataset, LoadReport};
pub use types::{AggregatedMetrics, Dataset, DeltaRecord, MetricsRecord};
