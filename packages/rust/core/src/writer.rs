//! Export tree writer.
//!
//! Pages land under `<output_root>/<SPACE_KEY>/`, mirroring the page
//! hierarchy: every ancestor title becomes a directory, a page with
//! children becomes `Title/index.md` so its children can nest under it,
//! and a leaf page becomes `Title.md`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use confdown_shared::{ConfdownError, Page, Result};

/// Longest file name component we will emit.
const MAX_COMPONENT_LEN: usize = 120;

/// Writes the pages of one space to disk.
pub struct SpaceWriter {
    space_dir: PathBuf,
    written: HashSet<PathBuf>,
}

impl SpaceWriter {
    /// Create the space directory under `output_root`.
    pub fn new(output_root: &Path, space_key: &str) -> Result<Self> {
        let space_dir = output_root.join(sanitize_component(space_key));
        std::fs::create_dir_all(&space_dir).map_err(|e| ConfdownError::io(&space_dir, e))?;
        Ok(Self {
            space_dir,
            written: HashSet::new(),
        })
    }

    /// Write one converted page, creating ancestor directories as needed.
    /// Returns the path of the written file.
    pub fn write_page(&mut self, page: &Page, markdown: &str) -> Result<PathBuf> {
        let mut dir = self.space_dir.clone();
        for ancestor in &page.path {
            dir.push(sanitize_component(ancestor));
        }

        let mut file_path = page_file_path(&dir, page, None);
        if !self.written.insert(file_path.clone()) {
            // Sibling pages can share a title; the page id keeps them apart.
            file_path = page_file_path(&dir, page, Some(&page.id));
            self.written.insert(file_path.clone());
        }

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfdownError::io(parent, e))?;
        }
        std::fs::write(&file_path, markdown).map_err(|e| ConfdownError::io(&file_path, e))?;

        debug!(path = %file_path.display(), title = %page.title, "wrote page");
        Ok(file_path)
    }

    pub fn space_dir(&self) -> &Path {
        &self.space_dir
    }
}

fn page_file_path(dir: &Path, page: &Page, suffix: Option<&str>) -> PathBuf {
    let stem = match suffix {
        Some(suffix) => format!("{}-{suffix}", sanitize_component(&page.title)),
        None => sanitize_component(&page.title),
    };
    if page.has_children {
        dir.join(stem).join("index.md")
    } else {
        dir.join(format!("{stem}.md"))
    }
}

/// Make a page title safe to use as a file or directory name.
///
/// Path separators and characters rejected by common filesystems become
/// underscores, surrounding whitespace and trailing dots are stripped,
/// and the result is capped at [`MAX_COMPONENT_LEN`] characters. An empty
/// result falls back to `untitled`.
pub fn sanitize_component(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for ch in title.chars() {
        match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => out.push('_'),
            c if c.is_control() => out.push('_'),
            c => out.push(c),
        }
    }

    let cleaned: String = out
        .trim()
        .trim_end_matches(['.', ' '])
        .chars()
        .take(MAX_COMPONENT_LEN)
        .collect();
    if cleaned.is_empty() {
        "untitled".to_string()
    } else {
        cleaned
    }
}
