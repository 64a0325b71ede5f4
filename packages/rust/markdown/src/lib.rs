//! ADF-to-Markdown conversion for Confluence pages.
//!
//! [`convert_page`] is the single entry point and is total: every page in,
//! one valid Markdown document out. A body that fails to parse degrades to
//! a document with full frontmatter and an error banner; a panic anywhere
//! in the tree walk is caught and degrades to a minimal document carrying
//! a bounded excerpt of the raw body.

pub mod adf;
mod cleanup;
pub mod comments;
pub mod mark;
pub mod render;

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, instrument};

use confdown_shared::Page;

use crate::adf::parse_adf;
use crate::comments::render_comments;
use crate::render::{RenderContext, format_iso_date, render_node};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Banner line opening every degraded document body.
pub const CONVERSION_ERROR_BANNER: &str = "> **Conversion error**";

/// Cap on the raw-body excerpt embedded in a panic-fallback document.
const RAW_DUMP_LIMIT: usize = 1000;

/// Result of converting one page.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// The final Markdown document, frontmatter included.
    pub markdown: String,
    /// True when the body could not be converted and the document carries
    /// an error banner instead.
    pub degraded: bool,
}

/// Options for page conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Append the comment section when the page has comments.
    pub include_comments: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            include_comments: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Convert one page to a Markdown document.
#[instrument(skip_all, fields(page_id = %page.id, title = %page.title))]
pub fn convert_page(page: &Page, opts: &ConvertOptions) -> ConvertResult {
    match panic::catch_unwind(AssertUnwindSafe(|| convert_inner(page, opts))) {
        Ok(result) => result,
        Err(_) => {
            error!("conversion panicked, emitting fallback document");
            ConvertResult {
                markdown: panic_fallback(page),
                degraded: true,
            }
        }
    }
}

fn convert_inner(page: &Page, opts: &ConvertOptions) -> ConvertResult {
    let mut ctx = RenderContext::new();
    let mut degraded = false;

    let body = match page.body.as_deref() {
        Some(raw) => match parse_adf(raw) {
            Ok(tree) => render_node(&tree, &mut ctx),
            Err(e) => {
                degraded = true;
                error_body(&e.to_string())
            }
        },
        None => {
            degraded = true;
            error_body("page has no ADF body")
        }
    };

    let mut doc = build_frontmatter(page);
    doc.push('\n');
    doc.push_str(&body);

    if opts.include_comments && !page.comments.is_empty() {
        // Exactly one blank line between body and comments.
        while !doc.ends_with("\n\n") {
            doc.push('\n');
        }
        doc.push_str(&render_comments(&page.comments, &mut ctx));
    }

    debug!(degraded, len = doc.len(), "page converted");

    ConvertResult {
        markdown: cleanup::run_pipeline(&doc),
        degraded,
    }
}

fn error_body(message: &str) -> String {
    format!("{CONVERSION_ERROR_BANNER}\n>\n> {message}\n")
}

/// Last-resort document for a page whose conversion panicked. Only the
/// fields that cannot themselves misbehave go into the frontmatter.
fn panic_fallback(page: &Page) -> String {
    let mut doc = String::from("---\n");
    push_field(&mut doc, "title", &page.title);
    push_field(&mut doc, "id", &page.id);
    doc.push_str("---\n\n");
    doc.push_str(&error_body(
        "unexpected conversion failure, raw body excerpt below",
    ));
    if let Some(body) = &page.body {
        let excerpt: String = body.chars().take(RAW_DUMP_LIMIT).collect();
        doc.push_str("\n```\n");
        doc.push_str(&excerpt);
        doc.push_str("\n```\n");
    }
    doc
}

// ---------------------------------------------------------------------------
// Frontmatter
// ---------------------------------------------------------------------------

/// Build the YAML frontmatter block by hand.
///
/// Values are double-quoted with embedded quotes doubled. Absent fields
/// are omitted entirely, never emitted empty.
fn build_frontmatter(page: &Page) -> String {
    let mut fm = String::from("---\n");
    push_field(&mut fm, "title", &page.title);
    push_field(&mut fm, "id", &page.id);
    if let Some(url) = &page.url {
        push_field(&mut fm, "url", url);
    }
    if let Some(space) = &page.space {
        push_field(&mut fm, "space", &space.key);
        if !space.name.is_empty() {
            push_field(&mut fm, "space_name", &space.name);
        }
    }
    if !page.path.is_empty() {
        push_field(&mut fm, "path", &page.path.join(" > "));
    }
    if !page.labels.is_empty() {
        let labels: Vec<String> = page
            .labels
            .iter()
            .map(|label| format!("\"{}\"", escape_yaml_string(label)))
            .collect();
        fm.push_str(&format!("labels: [{}]\n", labels.join(", ")));
    }
    if let Some(version) = &page.version {
        fm.push_str(&format!("version: {}\n", version.number));
        if let Some(author) = &version.author {
            push_field(&mut fm, "author", author);
        }
        if let Some(when) = &version.when {
            push_field(&mut fm, "updated", &format_iso_date(when));
        }
    }
    fm.push_str("---\n");
    fm
}

fn push_field(fm: &mut String, key: &str, value: &str) {
    fm.push_str(&format!("{key}: \"{}\"\n", escape_yaml_string(value)));
}

/// Escape a YAML double-quoted scalar by doubling embedded quotes.
fn escape_yaml_string(s: &str) -> String {
    s.replace('"', "\"\"")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
