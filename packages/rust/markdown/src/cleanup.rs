//! Post-conversion cleanup pipeline for assembled Markdown documents.
//!
//! Each cleanup pass is a function `&str -> String` applied in sequence.
//! The renderer leaves block seams behind (stacked blank lines, trailing
//! spaces); these passes settle the document into its final shape. Both
//! whitespace passes track fence state line by line, so code block
//! content leaves the pipeline exactly as the renderer emitted it.

/// Run the full cleanup pipeline on an assembled document.
pub(crate) fn run_pipeline(md: &str) -> String {
    let mut result = md.to_string();

    result = trim_line_ends(&result);
    result = collapse_blank_lines(&result);
    result = ensure_trailing_newline(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Trim trailing whitespace per line
// ---------------------------------------------------------------------------

/// Strip trailing whitespace from every line outside fenced code blocks.
/// Runs first so that blank lines holding stray spaces collapse in the
/// next pass.
fn trim_line_ends(md: &str) -> String {
    let mut result = String::new();
    let mut in_code_block = false;

    for line in md.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            result.push_str(line);
            result.push('\n');
            continue;
        }

        if in_code_block {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        result.push_str(line.trim_end());
        result.push('\n');
    }

    // Drop the terminator the loop added; the trailing newline pass settles it.
    if result.ends_with('\n') {
        result.pop();
    }

    result
}

// ---------------------------------------------------------------------------
// Pass 2: Collapse excessive blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of 3+ blank lines into exactly 2, leaving fenced code
/// blocks untouched.
fn collapse_blank_lines(md: &str) -> String {
    let mut result = String::new();
    let mut in_code_block = false;
    let mut blank_run = 0;

    for line in md.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            blank_run = 0;
            result.push_str(line);
            result.push('\n');
            continue;
        }

        if in_code_block {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        if line.is_empty() {
            blank_run += 1;
            if blank_run > 2 {
                continue;
            }
        } else {
            blank_run = 0;
        }

        result.push_str(line);
        result.push('\n');
    }

    if result.ends_with('\n') {
        result.pop();
    }

    result
}

// ---------------------------------------------------------------------------
// Pass 3: Ensure trailing newline
// ---------------------------------------------------------------------------

/// End the document with exactly one newline.
fn ensure_trailing_newline(md: &str) -> String {
    let trimmed = md.trim_end_matches('\n');
    format!("{trimmed}\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
