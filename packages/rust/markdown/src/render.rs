//! ADF tree to Markdown rendering.
//!
//! [`render_node`] dispatches on [`NodeKind`] with an exhaustive match.
//! Block handlers end their output with a blank line; inline handlers
//! return bare text. All mutable state lives in a [`RenderContext`]
//! created per conversion call, so nothing leaks between documents.

use std::collections::HashMap;

use tracing::warn;

use crate::adf::{AdfNode, NodeKind};
use crate::mark::apply_marks;

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Mutable rendering state for a single conversion call.
#[derive(Debug, Default)]
pub struct RenderContext {
    /// Monotonic id source for tables. Ids are never reused within a call,
    /// so sibling and nested tables always key distinct matrices.
    next_table_id: u64,
    /// Ids of tables currently being collected, innermost last.
    table_stack: Vec<u64>,
    /// Cell matrix per in-progress table.
    tables: HashMap<u64, Vec<Vec<String>>>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn begin_table(&mut self) -> u64 {
        let id = self.next_table_id;
        self.next_table_id += 1;
        self.table_stack.push(id);
        self.tables.insert(id, Vec::new());
        id
    }

    fn finish_table(&mut self, id: u64) -> Vec<Vec<String>> {
        self.table_stack.pop();
        self.tables.remove(&id).unwrap_or_default()
    }

    fn in_table(&self) -> bool {
        !self.table_stack.is_empty()
    }

    fn begin_row(&mut self) {
        if let Some(rows) = self.current_table_mut() {
            rows.push(Vec::new());
        }
    }

    fn push_cell(&mut self, text: String) {
        if let Some(row) = self.current_table_mut().and_then(|rows| rows.last_mut()) {
            row.push(text);
        }
    }

    fn current_table_mut(&mut self) -> Option<&mut Vec<Vec<String>>> {
        let id = *self.table_stack.last()?;
        self.tables.get_mut(&id)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Render one node (and its subtree) to Markdown.
pub fn render_node(node: &AdfNode, ctx: &mut RenderContext) -> String {
    match NodeKind::from_type(&node.node_type) {
        NodeKind::Doc => render_children(node, ctx),
        NodeKind::Paragraph => {
            let inline = render_children(node, ctx);
            if inline.trim().is_empty() {
                String::new()
            } else {
                format!("{inline}\n\n")
            }
        }
        NodeKind::Text => {
            let text = sanitize_text(node.text.as_deref().unwrap_or(""));
            apply_marks(&text, &node.marks)
        }
        NodeKind::Heading => {
            let level = attr_i64(node, "level").unwrap_or(1).clamp(1, 6) as usize;
            let inline = render_children(node, ctx);
            format!("{} {}\n\n", "#".repeat(level), inline.trim())
        }
        NodeKind::BulletList => render_list(node, ctx, false),
        NodeKind::OrderedList => render_list(node, ctx, true),
        NodeKind::ListItem => render_children(node, ctx),
        NodeKind::CodeBlock => {
            let language = attr_str(node, "language").unwrap_or("");
            let code = collect_raw_text(node);
            format!("```{language}\n{}\n```\n\n", code.trim_end_matches('\n'))
        }
        NodeKind::Blockquote => {
            let body = render_children(node, ctx);
            quote_lines(&body)
        }
        NodeKind::HardBreak => "\n".to_string(),
        NodeKind::Rule => "---\n\n".to_string(),
        NodeKind::Panel => {
            let kind = attr_str(node, "panelType").unwrap_or("info").to_string();
            let body = render_children(node, ctx);
            render_callout(&kind, &body)
        }
        NodeKind::Table => render_table(node, ctx),
        NodeKind::TableRow => {
            if ctx.in_table() {
                ctx.begin_row();
                render_children(node, ctx);
                String::new()
            } else {
                warn!("tableRow outside a table, rendering children inline");
                render_children(node, ctx)
            }
        }
        NodeKind::TableCell | NodeKind::TableHeader => {
            if ctx.in_table() {
                let inner = render_children(node, ctx);
                ctx.push_cell(flatten_cell(&inner));
                String::new()
            } else {
                warn!(kind = %node.node_type, "table cell outside a table, rendering children inline");
                render_children(node, ctx)
            }
        }
        NodeKind::Media => render_media(node),
        NodeKind::MediaGroup | NodeKind::MediaSingle => render_children(node, ctx),
        NodeKind::Caption => {
            let inline = render_children(node, ctx);
            format!("*{}*\n\n", inline.trim())
        }
        NodeKind::TaskList => {
            let items = render_children(node, ctx);
            format!("{}\n\n", items.trim_end())
        }
        NodeKind::TaskItem => {
            let checkbox = match attr_str(node, "state") {
                Some("DONE") => "[x]",
                _ => "[ ]",
            };
            let inline = render_children(node, ctx);
            format!("- {checkbox} {}\n", inline.trim())
        }
        NodeKind::Mention => match attr_str(node, "text") {
            Some(text) => text.to_string(),
            None => format!("@{}", attr_str(node, "id").unwrap_or("unknown")),
        },
        NodeKind::Emoji => attr_str(node, "text")
            .or_else(|| attr_str(node, "shortName"))
            .unwrap_or("")
            .to_string(),
        NodeKind::Date => render_date(node),
        NodeKind::Status => format!("`{}`", attr_str(node, "text").unwrap_or("")),
        NodeKind::Expand | NodeKind::NestedExpand => {
            let title = attr_str(node, "title").unwrap_or("Details").to_string();
            let body = render_children(node, ctx);
            format!("**{title}**\n\n{body}")
        }
        NodeKind::Extension | NodeKind::BodiedExtension => render_extension(node, ctx, false),
        NodeKind::InlineExtension => render_extension(node, ctx, true),
        NodeKind::LayoutSection | NodeKind::LayoutColumn => render_children(node, ctx),
        NodeKind::DecisionList => {
            let items = render_children(node, ctx);
            format!("{}\n\n", items.trim_end())
        }
        NodeKind::DecisionItem => {
            let inline = render_children(node, ctx);
            format!("- ✓ {}\n", inline.trim())
        }
        NodeKind::Unknown(kind) => {
            warn!(kind = %kind, "unknown node type, rendering children");
            render_children(node, ctx)
        }
    }
}

fn render_children(node: &AdfNode, ctx: &mut RenderContext) -> String {
    node.content
        .iter()
        .map(|child| render_node(child, ctx))
        .collect()
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Escape Markdown-significant characters in raw text.
///
/// Applied exactly once per text node, before marks wrap it. Not
/// idempotent: a second pass escapes the backslashes it just added.
pub fn sanitize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' | '*' | '_' | '`' | '[' | ']' | '(' | ')' | '#' | '+' | '-' | '.' | '!' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Format an ISO-8601 timestamp as `YYYY-MM-DD`, falling back to the raw
/// string when it does not parse.
pub(crate) fn format_iso_date(iso: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(iso) {
        Ok(dt) => dt.format("%Y-%m-%d").to_string(),
        Err(_) => iso.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Block helpers
// ---------------------------------------------------------------------------

fn render_list(node: &AdfNode, ctx: &mut RenderContext, ordered: bool) -> String {
    let start = if ordered {
        attr_i64(node, "order").unwrap_or(1)
    } else {
        1
    };

    let mut out = String::new();
    for (index, item) in node.content.iter().enumerate() {
        let marker = if ordered {
            format!("{}. ", start + index as i64)
        } else {
            "- ".to_string()
        };
        let indent = " ".repeat(marker.len());

        let body = render_node(item, ctx);
        let body = body.trim_end();
        if body.is_empty() {
            out.push_str(marker.trim_end());
            out.push('\n');
            continue;
        }
        for (line_index, line) in body.lines().enumerate() {
            if line_index == 0 {
                out.push_str(&marker);
            } else if !line.is_empty() {
                out.push_str(&indent);
            }
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push('\n');
    out
}

fn quote_lines(body: &str) -> String {
    let mut out = String::new();
    for line in body.trim_end().lines() {
        if line.is_empty() {
            out.push_str(">\n");
        } else {
            out.push_str("> ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push('\n');
    out
}

fn render_callout(kind: &str, body: &str) -> String {
    let mut out = format!("> **{}**\n", capitalize(kind));
    for line in body.trim_end().lines() {
        if line.is_empty() {
            out.push_str(">\n");
        } else {
            out.push_str("> ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push('\n');
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Two-pass table rendering. Pass one walks rows and cells, which
/// accumulate into the context matrix keyed by this table's id; pass two
/// emits the matrix with every row padded to the widest row.
fn render_table(node: &AdfNode, ctx: &mut RenderContext) -> String {
    let id = ctx.begin_table();
    for child in &node.content {
        render_node(child, ctx);
    }
    let rows = ctx.finish_table(id);
    emit_table(&rows)
}

fn emit_table(rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    let col_count = rows.iter().map(Vec::len).max().unwrap_or(0);
    if col_count == 0 {
        return String::new();
    }

    let padded: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut row = row.clone();
            row.resize(col_count, String::new());
            row
        })
        .collect();

    let mut md = String::new();
    md.push_str(&format!("| {} |\n", padded[0].join(" | ")));
    md.push_str(&format!(
        "| {} |\n",
        vec!["---"; col_count].join(" | ")
    ));
    for row in &padded[1..] {
        md.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    md.push('\n');
    md
}

/// Cell text is a single Markdown table cell: trimmed, with each run of
/// embedded newlines collapsed to one space. Spacing within a line is
/// kept as rendered.
fn flatten_cell(text: &str) -> String {
    let mut flat = String::with_capacity(text.len());
    let mut at_line_break = false;
    for ch in text.trim().chars() {
        if ch == '\n' {
            at_line_break = true;
            continue;
        }
        if at_line_break {
            flat.push(' ');
            at_line_break = false;
        }
        flat.push(ch);
    }
    flat
}

// ---------------------------------------------------------------------------
// Leaf helpers
// ---------------------------------------------------------------------------

fn render_media(node: &AdfNode) -> String {
    match attr_str(node, "type") {
        Some("external") => {
            let url = attr_str(node, "url").unwrap_or("");
            let alt = attr_str(node, "alt").unwrap_or("image");
            format!("![{alt}]({url})\n\n")
        }
        Some("link") => {
            format!("[media: {}]\n\n", attr_str(node, "id").unwrap_or("unknown"))
        }
        _ => {
            let name = attr_str(node, "alt")
                .or_else(|| attr_str(node, "id"))
                .unwrap_or("unknown");
            format!("[attachment: {name}]\n\n")
        }
    }
}

fn render_date(node: &AdfNode) -> String {
    let Some(raw) = attr_value(node, "timestamp") else {
        return String::new();
    };
    let millis = match raw {
        serde_json::Value::String(s) => s.parse::<i64>().ok(),
        other => other.as_i64(),
    };
    match millis.and_then(chrono::DateTime::from_timestamp_millis) {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => {
            warn!("date node with unparseable timestamp");
            raw.as_str().unwrap_or("").to_string()
        }
    }
}

fn render_extension(node: &AdfNode, ctx: &mut RenderContext, inline: bool) -> String {
    let key = attr_str(node, "extensionKey").unwrap_or("unknown").to_string();
    match key.as_str() {
        "code" => {
            let language = macro_param(node, "language").unwrap_or_default();
            let code = collect_raw_text(node);
            format!("```{language}\n{}\n```\n\n", code.trim_end_matches('\n'))
        }
        "info" | "note" | "warning" | "tip" => {
            let body = render_children(node, ctx);
            render_callout(&key, &body)
        }
        _ => {
            let ext_type = attr_str(node, "extensionType").unwrap_or("extension").to_string();
            let fallback = format!("[{ext_type}:{key}]");
            let body = render_children(node, ctx);
            if inline {
                fallback
            } else if body.trim().is_empty() {
                format!("{fallback}\n\n")
            } else {
                format!("{fallback}\n\n{body}")
            }
        }
    }
}

fn macro_param(node: &AdfNode, name: &str) -> Option<String> {
    attr_value(node, "parameters")?
        .get("macroParams")?
        .get(name)?
        .get("value")?
        .as_str()
        .map(str::to_string)
}

fn collect_raw_text(node: &AdfNode) -> String {
    let mut out = String::new();
    if let Some(text) = &node.text {
        out.push_str(text);
    }
    for child in &node.content {
        out.push_str(&collect_raw_text(child));
    }
    out
}

fn attr_str<'a>(node: &'a AdfNode, key: &str) -> Option<&'a str> {
    attr_value(node, key)?.as_str()
}

fn attr_i64(node: &AdfNode, key: &str) -> Option<i64> {
    let value = attr_value(node, key)?;
    value.as_i64().or_else(|| value.as_str()?.parse().ok())
}

fn attr_value<'a>(node: &'a AdfNode, key: &str) -> Option<&'a serde_json::Value> {
    node.attrs.as_ref()?.get(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adf::parse_adf;

    fn render(adf: serde_json::Value) -> String {
        let tree = parse_adf(&adf.to_string()).expect("parse");
        render_node(&tree, &mut RenderContext::new())
    }

    fn text(value: &str) -> serde_json::Value {
        serde_json::json!({"type": "text", "text": value})
    }

    #[test]
    fn paragraph_renders_as_block() {
        let out = render(serde_json::json!({
            "type": "doc",
            "content": [{"type": "paragraph", "content": [text("Hello world")]}]
        }));
        assert_eq!(out, "Hello world\n\n");
    }

    #[test]
    fn sanitize_escapes_every_special_once() {
        assert_eq!(sanitize_text("a*b"), r"a\*b");
        assert_eq!(sanitize_text("[x](y)"), r"\[x\]\(y\)");
        assert_eq!(sanitize_text("#1 + 2 - 3."), r"\#1 \+ 2 \- 3\.");
    }

    #[test]
    fn sanitize_is_not_idempotent() {
        let once = sanitize_text("a*b");
        let twice = sanitize_text(&once);
        assert_eq!(once, r"a\*b");
        assert_eq!(twice, r"a\\\*b");
        assert_ne!(once, twice);
    }

    #[test]
    fn heading_level_is_clamped_to_six() {
        let out = render(serde_json::json!({
            "type": "heading",
            "attrs": {"level": 7},
            "content": [text("Deep")]
        }));
        assert_eq!(out, "###### Deep\n\n");

        let out = render(serde_json::json!({
            "type": "heading",
            "attrs": {"level": 2},
            "content": [text("Two")]
        }));
        assert_eq!(out, "## Two\n\n");
    }

    #[test]
    fn bullet_list_renders_markers() {
        let item = |label: &str| {
            serde_json::json!({
                "type": "listItem",
                "content": [{"type": "paragraph", "content": [text(label)]}]
            })
        };
        let out = render(serde_json::json!({
            "type": "bulletList",
            "content": [item("one"), item("two"), item("three")]
        }));
        assert_eq!(out, "- one\n- two\n- three\n\n");
    }

    #[test]
    fn nested_list_is_indented_under_its_item() {
        let out = render(serde_json::json!({
            "type": "bulletList",
            "content": [{
                "type": "listItem",
                "content": [
                    {"type": "paragraph", "content": [text("outer")]},
                    {
                        "type": "bulletList",
                        "content": [{
                            "type": "listItem",
                            "content": [{"type": "paragraph", "content": [text("inner")]}]
                        }]
                    }
                ]
            }]
        }));
        assert_eq!(out, "- outer\n\n  - inner\n\n");
    }

    #[test]
    fn ordered_list_respects_start_attr() {
        let item = |label: &str| {
            serde_json::json!({
                "type": "listItem",
                "content": [{"type": "paragraph", "content": [text(label)]}]
            })
        };
        let out = render(serde_json::json!({
            "type": "orderedList",
            "attrs": {"order": 3},
            "content": [item("a"), item("b")]
        }));
        assert_eq!(out, "3. a\n4. b\n\n");
    }

    #[test]
    fn code_block_keeps_text_raw() {
        let out = render(serde_json::json!({
            "type": "codeBlock",
            "attrs": {"language": "rust"},
            "content": [text("let x = a * b;")]
        }));
        assert_eq!(out, "```rust\nlet x = a * b;\n```\n\n");
    }

    #[test]
    fn blockquote_prefixes_every_line() {
        let out = render(serde_json::json!({
            "type": "blockquote",
            "content": [
                {"type": "paragraph", "content": [text("first")]},
                {"type": "paragraph", "content": [text("second")]}
            ]
        }));
        assert_eq!(out, "> first\n>\n> second\n\n");
    }

    #[test]
    fn panel_renders_as_labelled_callout() {
        let out = render(serde_json::json!({
            "type": "panel",
            "attrs": {"panelType": "warning"},
            "content": [{"type": "paragraph", "content": [text("Careful")]}]
        }));
        assert_eq!(out, "> **Warning**\n> Careful\n\n");
    }

    #[test]
    fn uneven_table_pads_to_widest_row() {
        let cell = |label: &str| {
            serde_json::json!({
                "type": "tableCell",
                "content": [{"type": "paragraph", "content": [text(label)]}]
            })
        };
        let out = render(serde_json::json!({
            "type": "table",
            "content": [
                {"type": "tableRow", "content": [cell("a"), cell("b")]},
                {"type": "tableRow", "content": [cell("c"), cell("d"), cell("e")]},
                {"type": "tableRow", "content": [cell("f")]}
            ]
        }));
        assert_eq!(
            out,
            "| a | b |  |\n| --- | --- | --- |\n| c | d | e |\n| f |  |  |\n\n"
        );
    }

    #[test]
    fn table_cells_collapse_internal_newlines() {
        let out = render(serde_json::json!({
            "type": "table",
            "content": [{
                "type": "tableRow",
                "content": [{
                    "type": "tableCell",
                    "content": [
                        {"type": "paragraph", "content": [text("first")]},
                        {"type": "paragraph", "content": [text("second")]}
                    ]
                }]
            }]
        }));
        assert_eq!(out, "| first second |\n| --- |\n\n");
    }

    #[test]
    fn table_cells_keep_interior_spacing() {
        let out = render(serde_json::json!({
            "type": "table",
            "content": [{
                "type": "tableRow",
                "content": [{
                    "type": "tableCell",
                    "content": [{"type": "paragraph", "content": [text("wide  gap")]}]
                }]
            }]
        }));
        assert_eq!(out, "| wide  gap |\n| --- |\n\n");
    }

    #[test]
    fn nested_table_stays_inside_its_cell() {
        let inner = serde_json::json!({
            "type": "table",
            "content": [{
                "type": "tableRow",
                "content": [{
                    "type": "tableCell",
                    "content": [{"type": "paragraph", "content": [text("in")]}]
                }]
            }]
        });
        let out = render(serde_json::json!({
            "type": "table",
            "content": [{
                "type": "tableRow",
                "content": [
                    {"type": "tableCell", "content": [inner]},
                    {"type": "tableCell", "content": [{"type": "paragraph", "content": [text("out")]}]}
                ]
            }]
        }));
        // The inner table flattens into its cell; the outer keeps two columns.
        assert_eq!(out, "| | in | | --- | | out |\n| --- | --- |\n\n");
    }

    #[test]
    fn task_items_carry_checkbox_state() {
        let out = render(serde_json::json!({
            "type": "taskList",
            "content": [
                {"type": "taskItem", "attrs": {"state": "DONE"}, "content": [text("done")]},
                {"type": "taskItem", "attrs": {"state": "TODO"}, "content": [text("open")]}
            ]
        }));
        assert_eq!(out, "- [x] done\n- [ ] open\n\n");
    }

    #[test]
    fn inline_leaves_render_in_place() {
        let out = render(serde_json::json!({
            "type": "paragraph",
            "content": [
                {"type": "mention", "attrs": {"text": "@Ada"}},
                text(" shipped "),
                {"type": "status", "attrs": {"text": "DONE"}},
                text(" "),
                {"type": "emoji", "attrs": {"shortName": ":tada:"}}
            ]
        }));
        assert_eq!(out, "@Ada shipped `DONE` :tada:\n\n");
    }

    #[test]
    fn date_node_formats_epoch_millis() {
        let out = render(serde_json::json!({
            "type": "date",
            "attrs": {"timestamp": "1715558400000"}
        }));
        assert_eq!(out, "2024-05-13");
    }

    #[test]
    fn expand_renders_title_then_body() {
        let out = render(serde_json::json!({
            "type": "expand",
            "attrs": {"title": "More"},
            "content": [{"type": "paragraph", "content": [text("hidden")]}]
        }));
        assert_eq!(out, "**More**\n\nhidden\n\n");
    }

    #[test]
    fn code_macro_extension_becomes_fence() {
        let out = render(serde_json::json!({
            "type": "bodiedExtension",
            "attrs": {
                "extensionKey": "code",
                "parameters": {"macroParams": {"language": {"value": "python"}}}
            },
            "content": [{"type": "paragraph", "content": [text("print(1)")]}]
        }));
        assert_eq!(out, "```python\nprint(1)\n```\n\n");
    }

    #[test]
    fn unknown_extension_gets_structured_fallback() {
        let out = render(serde_json::json!({
            "type": "extension",
            "attrs": {
                "extensionType": "com.atlassian.confluence.macro.core",
                "extensionKey": "jira"
            }
        }));
        assert_eq!(out, "[com.atlassian.confluence.macro.core:jira]\n\n");
    }

    #[test]
    fn unknown_node_falls_back_to_children() {
        let out = render(serde_json::json!({
            "type": "futureWidget",
            "content": [{"type": "paragraph", "content": [text("still here")]}]
        }));
        assert_eq!(out, "still here\n\n");
    }

    #[test]
    fn unknown_leaf_renders_empty() {
        let out = render(serde_json::json!({"type": "futureLeaf"}));
        assert_eq!(out, "");
    }

    #[test]
    fn rule_and_hard_break_render_literals() {
        assert_eq!(render(serde_json::json!({"type": "rule"})), "---\n\n");
        let out = render(serde_json::json!({
            "type": "paragraph",
            "content": [text("a"), {"type": "hardBreak"}, text("b")]
        }));
        assert_eq!(out, "a\nb\n\n");
    }

    #[test]
    fn media_variants_render_distinctly() {
        let external = render(serde_json::json!({
            "type": "media",
            "attrs": {"type": "external", "url": "https://img.test/x.png", "alt": "diagram"}
        }));
        assert_eq!(external, "![diagram](https://img.test/x.png)\n\n");

        let file = render(serde_json::json!({
            "type": "media",
            "attrs": {"type": "file", "id": "att-123"}
        }));
        assert_eq!(file, "[attachment: att-123]\n\n");
    }

    #[test]
    fn table_ids_stay_distinct_across_one_call() {
        let table = serde_json::json!({
            "type": "table",
            "content": [{
                "type": "tableRow",
                "content": [{
                    "type": "tableCell",
                    "content": [{"type": "paragraph", "content": [text("x")]}]
                }]
            }]
        });
        let mut ctx = RenderContext::new();
        let tree = parse_adf(
            &serde_json::json!({"type": "doc", "content": [table.clone(), table]}).to_string(),
        )
        .expect("parse");
        let out = render_node(&tree, &mut ctx);
        assert_eq!(out.matches("| x |").count(), 2);
        assert_eq!(ctx.next_table_id, 2);
        assert!(ctx.table_stack.is_empty());
    }
}
