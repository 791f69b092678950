//! Export matching Strava activities to a flat CSV file.

pub mod error;
pub mod export;
pub mod pipeline;

pub use error::{ExportError, ExportResult};
pub use export::{ExportRow, DEFAULT_MARKER, DEFAULT_OUTPUT};
pub use pipeline::{ExportOptions, ExportSummary, run};
