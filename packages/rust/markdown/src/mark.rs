//! Mark application.
//!
//! A text node can carry several marks in any order. [`apply_marks`] sorts
//! them by [`MarkKind::priority`] and folds left-to-right, so the lowest
//! priority wraps innermost and `{em, strong}` on `x` is always `**_x_**`,
//! whichever way the wire listed them.

use tracing::warn;

use crate::adf::{AdfMark, MarkKind};

/// Wrap already-sanitized text in its marks in canonical order.
pub fn apply_marks(text: &str, marks: &[AdfMark]) -> String {
    let mut sorted: Vec<&AdfMark> = marks.iter().collect();
    sorted.sort_by_key(|mark| MarkKind::from_type(&mark.mark_type).priority());

    sorted
        .into_iter()
        .fold(text.to_string(), |acc, mark| apply_one(&acc, mark))
}

fn apply_one(text: &str, mark: &AdfMark) -> String {
    match MarkKind::from_type(&mark.mark_type) {
        MarkKind::Code => format!("`{text}`"),
        MarkKind::Link => {
            let href = mark_attr(mark, "href").unwrap_or("");
            format!("[{text}]({href})")
        }
        MarkKind::Em => format!("_{text}_"),
        MarkKind::Strong => format!("**{text}**"),
        MarkKind::Strike => format!("~~{text}~~"),
        MarkKind::Underline => format!("<u>{text}</u>"),
        // Markdown has no color; the text passes through unchanged.
        MarkKind::TextColor => text.to_string(),
        MarkKind::Subsup => {
            let tag = match mark_attr(mark, "type") {
                Some("sup") => "sup",
                _ => "sub",
            };
            format!("<{tag}>{text}</{tag}>")
        }
        MarkKind::Unknown(kind) => {
            warn!(mark = %kind, "unknown mark type, leaving text unwrapped");
            text.to_string()
        }
    }
}

fn mark_attr<'a>(mark: &'a AdfMark, key: &str) -> Option<&'a str> {
    mark.attrs.as_ref()?.get(key)?.as_str()
}
