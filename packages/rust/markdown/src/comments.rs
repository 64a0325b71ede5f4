//! Comment section rendering.
//!
//! Threads render under `## Comments`, inline threads before page
//! threads. A comment at reply depth d gets d levels of blockquote
//! prefix, so a reply always sits one level deeper than its parent.

use confdown_shared::{Comment, CommentLocation};

use crate::adf::parse_adf;
use crate::render::{RenderContext, format_iso_date, render_node};

/// Render the comment section for a page. Empty input yields an empty
/// string so the caller can append unconditionally.
pub fn render_comments(comments: &[Comment], ctx: &mut RenderContext) -> String {
    if comments.is_empty() {
        return String::new();
    }

    let inline: Vec<&Comment> = comments
        .iter()
        .filter(|c| c.location == CommentLocation::Inline)
        .collect();
    let footer: Vec<&Comment> = comments
        .iter()
        .filter(|c| c.location == CommentLocation::Footer)
        .collect();

    let mut out = String::from("## Comments\n\n");

    if !inline.is_empty() {
        out.push_str("### Inline comments\n\n");
        for thread in inline {
            // The page text the thread was anchored to, quoted once for
            // the whole thread.
            if let Some(original) = &thread.original_text {
                out.push_str(&format!("> \"{}\"\n\n", original.trim()));
            }
            out.push_str(&render_thread(thread, 0, ctx));
        }
    }

    if !footer.is_empty() {
        out.push_str("### Page comments\n\n");
        for thread in footer {
            out.push_str(&render_thread(thread, 0, ctx));
        }
    }

    out
}

fn render_thread(comment: &Comment, depth: usize, ctx: &mut RenderContext) -> String {
    let prefix = "> ".repeat(depth);
    let mut out = String::new();

    out.push_str(&prefix);
    out.push_str(&header_line(comment));
    out.push('\n');

    for line in body_text(comment, ctx).lines() {
        out.push_str(&prefix);
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');

    for reply in &comment.replies {
        out.push_str(&render_thread(reply, depth + 1, ctx));
    }

    out
}

fn header_line(comment: &Comment) -> String {
    let author = comment
        .version
        .as_ref()
        .and_then(|v| v.author.as_deref())
        .unwrap_or("Unknown");
    match comment.version.as_ref().and_then(|v| v.when.as_deref()) {
        Some(when) => format!("**{author}** ({}):", format_iso_date(when)),
        None => format!("**{author}**:"),
    }
}

fn body_text(comment: &Comment, ctx: &mut RenderContext) -> String {
    let Some(raw) = &comment.body else {
        return String::new();
    };
    match parse_adf(raw) {
        Ok(tree) => render_node(&tree, ctx).trim_end().to_string(),
        Err(_) => "_[comment body could not be parsed]_".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confdown_shared::Version;

    fn adf_body(text: &str) -> String {
        serde_json::json!({
            "version": 1,
            "type": "doc",
            "content": [{"type": "paragraph", "content": [{"type": "text", "text": text}]}]
        })
        .to_string()
    }

    fn comment(id: &str, author: &str, text: &str, location: CommentLocation) -> Comment {
        Comment {
            id: id.to_string(),
            title: String::new(),
            status: "current".to_string(),
            body: Some(adf_body(text)),
            location,
            original_text: None,
            replies: Vec::new(),
            version: Some(Version {
                number: 1,
                when: Some("2024-05-20T10:00:00.000Z".to_string()),
                author: Some(author.to_string()),
            }),
        }
    }

    #[test]
    fn empty_input_renders_nothing() {
        let out = render_comments(&[], &mut RenderContext::new());
        assert_eq!(out, "");
    }

    #[test]
    fn inline_threads_come_before_page_threads() {
        let mut inline = comment("1", "Ada", "inline note", CommentLocation::Inline);
        inline.original_text = Some("the anchored text".to_string());
        let footer = comment("2", "Grace", "page note", CommentLocation::Footer);

        let out = render_comments(&[footer, inline], &mut RenderContext::new());

        let inline_at = out.find("### Inline comments").expect("inline section");
        let footer_at = out.find("### Page comments").expect("page section");
        assert!(out.starts_with("## Comments\n\n"));
        assert!(inline_at < footer_at);
        assert!(out.contains("> \"the anchored text\"\n\n"));
    }

    #[test]
    fn reply_renders_one_level_deeper_than_parent() {
        let mut root = comment("a", "Ada", "comment A", CommentLocation::Footer);
        let mut reply = comment("b", "Grace", "comment B", CommentLocation::Footer);
        let leaf = comment("c", "Edith", "comment C", CommentLocation::Footer);
        reply.replies.push(leaf);
        root.replies.push(reply);

        let out = render_comments(&[root], &mut RenderContext::new());

        assert!(out.contains("**Ada** (2024-05-20):\ncomment A\n"));
        assert!(out.contains("> **Grace** (2024-05-20):\n> comment B\n"));
        assert!(out.contains("> > **Edith** (2024-05-20):\n> > comment C\n"));
    }

    #[test]
    fn version_without_date_drops_the_parenthetical() {
        let mut c = comment("1", "Ada", "hi", CommentLocation::Footer);
        c.version = Some(Version {
            number: 1,
            when: None,
            author: Some("Ada".to_string()),
        });
        let out = render_comments(&[c], &mut RenderContext::new());
        assert!(out.contains("**Ada**:\nhi\n"));
    }

    #[test]
    fn unparseable_body_becomes_inline_note() {
        let mut c = comment("1", "Ada", "ignored", CommentLocation::Footer);
        c.body = Some("{broken".to_string());
        let out = render_comments(&[c], &mut RenderContext::new());
        assert!(out.contains("_[comment body could not be parsed]_"));
    }

    #[test]
    fn missing_author_falls_back_to_unknown() {
        let mut c = comment("1", "Ada", "hi", CommentLocation::Footer);
        c.version = None;
        let out = render_comments(&[c], &mut RenderContext::new());
        assert!(out.contains("**Unknown**:\nhi\n"));
    }
}
