//! End-to-end export pipeline: search stream → convert → write.
//!
//! The loop is strictly sequential and pull-driven: one page is pulled
//! from the stream, converted, and written before the next is touched.
//! Peak memory stays at one batch plus one page, whatever the space size.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use confdown_client::{ApiClient, PageStream, SearchQuery};
use confdown_markdown::{ConvertOptions, convert_page};
use confdown_shared::{ConfdownError, Result, SpaceInfo};

use crate::writer::SpaceWriter;

/// Configuration for one export run.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Space keys to export, e.g. `["ENG", "OPS"]`.
    pub space_keys: Vec<String>,
    /// Root directory the space trees are written under.
    pub output_root: PathBuf,
    /// Search archived spaces too.
    pub include_archived: bool,
    /// Append comment sections to page documents.
    pub include_comments: bool,
}

/// Result of a completed export run.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Pages written to disk.
    pub pages_exported: usize,
    /// Pages whose body failed to convert and carry an error banner.
    pub pages_degraded: usize,
    /// Root directory the export landed in.
    pub output_root: PathBuf,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting export status.
pub trait ProgressReporter: Send + Sync {
    /// Called after each page is written.
    fn page_written(&self, title: &str, count: usize);
    /// Called once when the run completes.
    fn finished(&self, summary: &ExportSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn page_written(&self, _title: &str, _count: usize) {}
    fn finished(&self, _summary: &ExportSummary) {}
}

/// Run a full export of the configured spaces.
///
/// Conversion failures degrade individual documents and the run continues;
/// a transport or filesystem error aborts the run with everything written
/// so far left on disk.
#[instrument(skip_all, fields(spaces = ?config.space_keys))]
pub async fn export(
    api: &ApiClient,
    config: &ExportConfig,
    progress: &dyn ProgressReporter,
) -> Result<ExportSummary> {
    let start = Instant::now();

    if config.space_keys.is_empty() {
        return Err(ConfdownError::validation("no space keys to export"));
    }

    std::fs::create_dir_all(&config.output_root)
        .map_err(|e| ConfdownError::io(&config.output_root, e))?;

    info!(spaces = ?config.space_keys, out = %config.output_root.display(), "starting export");

    let query = SearchQuery {
        space_keys: config.space_keys.clone(),
        include_archived: config.include_archived,
    };
    let mut stream = PageStream::new(api, query);

    let convert_opts = ConvertOptions {
        include_comments: config.include_comments,
    };

    let mut writers: HashMap<String, SpaceWriter> = HashMap::new();
    let mut pages_exported = 0usize;
    let mut pages_degraded = 0usize;

    while let Some(next) = stream.next().await {
        let page = next?;

        let result = convert_page(&page, &convert_opts);
        if result.degraded {
            warn!(page_id = %page.id, title = %page.title, "page degraded to fallback document");
            pages_degraded += 1;
        }

        let space_key = page
            .space
            .as_ref()
            .map(|s| s.key.clone())
            .unwrap_or_else(|| "UNKNOWN".to_string());
        let writer = match writers.entry(space_key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let writer = SpaceWriter::new(&config.output_root, entry.key())?;
                entry.insert(writer)
            }
        };
        writer.write_page(&page, &result.markdown)?;

        pages_exported += 1;
        progress.page_written(&page.title, pages_exported);
    }

    let summary = ExportSummary {
        pages_exported,
        pages_degraded,
        output_root: config.output_root.clone(),
        elapsed: start.elapsed(),
    };

    progress.finished(&summary);

    info!(
        pages = summary.pages_exported,
        degraded = summary.pages_degraded,
        elapsed_ms = summary.elapsed.as_millis(),
        "export complete"
    );

    Ok(summary)
}

/// List the spaces visible to the configured credential.
pub async fn list_spaces(api: &ApiClient) -> Result<Vec<SpaceInfo>> {
    api.list_spaces().await
}
