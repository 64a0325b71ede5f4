//! Export orchestration for confdown.
//!
//! This crate ties the search stream, the Markdown converter, and the
//! filesystem writer into the end-to-end `export` workflow.

pub mod pipeline;
pub mod writer;

pub use pipeline::{
    ExportConfig, ExportSummary, ProgressReporter, SilentProgress, export, list_spaces,
};
pub use writer::{SpaceWriter, sanitize_component};
