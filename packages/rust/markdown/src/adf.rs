//! ADF (Atlassian Document Format) tree model.
//!
//! The wire schema is `{version, type: "doc", content: [...]}` with nodes
//! `{type, attrs?, content?, marks?, text?}` and marks `{type, attrs?}`.
//! Node and mark kinds are mapped onto enums up front so the renderer is
//! one exhaustive `match` per kind: forgetting a handler is a compile
//! error, and anything the API ships ahead of us lands in `Unknown`.

use serde::Deserialize;

use confdown_shared::{ConfdownError, Result};

/// One node of an ADF tree.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdfNode {
    #[serde(default, rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub attrs: Option<serde_json::Value>,
    #[serde(default)]
    pub content: Vec<AdfNode>,
    #[serde(default)]
    pub marks: Vec<AdfMark>,
    #[serde(default)]
    pub text: Option<String>,
}

/// A formatting mark attached to an inline node.
#[derive(Debug, Clone, Deserialize)]
pub struct AdfMark {
    #[serde(default, rename = "type")]
    pub mark_type: String,
    #[serde(default)]
    pub attrs: Option<serde_json::Value>,
}

/// Parse a raw ADF JSON string into a tree.
pub fn parse_adf(raw: &str) -> Result<AdfNode> {
    serde_json::from_str(raw).map_err(|e| ConfdownError::parse(format!("invalid ADF body: {e}")))
}

// ---------------------------------------------------------------------------
// NodeKind
// ---------------------------------------------------------------------------

/// Every node kind the renderer handles, plus a catch-all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Doc,
    Paragraph,
    Text,
    Heading,
    BulletList,
    OrderedList,
    ListItem,
    CodeBlock,
    Blockquote,
    HardBreak,
    Rule,
    Panel,
    Table,
    TableRow,
    TableCell,
    TableHeader,
    Media,
    MediaGroup,
    MediaSingle,
    Caption,
    TaskList,
    TaskItem,
    Mention,
    Emoji,
    Date,
    Status,
    Expand,
    NestedExpand,
    Extension,
    BodiedExtension,
    InlineExtension,
    LayoutSection,
    LayoutColumn,
    DecisionList,
    DecisionItem,
    Unknown(String),
}

impl NodeKind {
    pub fn from_type(node_type: &str) -> Self {
        match node_type {
            "doc" => Self::Doc,
            "paragraph" => Self::Paragraph,
            "text" => Self::Text,
            "heading" => Self::Heading,
            "bulletList" => Self::BulletList,
            "orderedList" => Self::OrderedList,
            "listItem" => Self::ListItem,
            "codeBlock" => Self::CodeBlock,
            "blockquote" => Self::Blockquote,
            "hardBreak" => Self::HardBreak,
            "rule" => Self::Rule,
            "panel" => Self::Panel,
            "table" => Self::Table,
            "tableRow" => Self::TableRow,
            "tableCell" => Self::TableCell,
            "tableHeader" => Self::TableHeader,
            "media" => Self::Media,
            "mediaGroup" => Self::MediaGroup,
            "mediaSingle" => Self::MediaSingle,
            "caption" => Self::Caption,
            "taskList" => Self::TaskList,
            "taskItem" => Self::TaskItem,
            "mention" => Self::Mention,
            "emoji" => Self::Emoji,
            "date" => Self::Date,
            "status" => Self::Status,
            "expand" => Self::Expand,
            "nestedExpand" => Self::NestedExpand,
            "extension" => Self::Extension,
            "bodiedExtension" => Self::BodiedExtension,
            "inlineExtension" => Self::InlineExtension,
            "layoutSection" => Self::LayoutSection,
            "layoutColumn" => Self::LayoutColumn,
            "decisionList" => Self::DecisionList,
            "decisionItem" => Self::DecisionItem,
            other => Self::Unknown(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// MarkKind
// ---------------------------------------------------------------------------

/// Every mark kind the renderer handles, plus a catch-all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkKind {
    Code,
    Link,
    Em,
    Strong,
    Strike,
    Underline,
    TextColor,
    Subsup,
    Unknown(String),
}

impl MarkKind {
    pub fn from_type(mark_type: &str) -> Self {
        match mark_type {
            "code" => Self::Code,
            "link" => Self::Link,
            "em" => Self::Em,
            "strong" => Self::Strong,
            "strike" => Self::Strike,
            "underline" => Self::Underline,
            "textColor" => Self::TextColor,
            "subsup" => Self::Subsup,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Fixed application priority. Marks are unordered on the wire; sorting
    /// by this value and folding left-to-right puts the lowest priority
    /// innermost and makes output independent of input order.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Code => 1,
            Self::Link => 2,
            Self::Em => 3,
            Self::Strong => 4,
            Self::Strike => 5,
            Self::Underline => 6,
            Self::TextColor => 7,
            Self::Subsup => 8,
            Self::Unknown(_) => 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_doc() {
        let tree = parse_adf(r#"{"version":1,"type":"doc","content":[{"type":"paragraph"}]}"#)
            .expect("parse");
        assert_eq!(tree.node_type, "doc");
        assert_eq!(tree.content.len(), 1);
        assert_eq!(NodeKind::from_type(&tree.content[0].node_type), NodeKind::Paragraph);
    }

    #[test]
    fn parse_rejects_invalid_json() {
        let err = parse_adf("{not json").unwrap_err();
        assert!(err.to_string().contains("invalid ADF body"));
    }

    #[test]
    fn unknown_kinds_are_captured() {
        assert_eq!(
            NodeKind::from_type("futureWidget"),
            NodeKind::Unknown("futureWidget".into())
        );
        assert_eq!(
            MarkKind::from_type("futureMark"),
            MarkKind::Unknown("futureMark".into())
        );
    }

    #[test]
    fn mark_priorities_are_strictly_ordered() {
        let known = [
            MarkKind::Code,
            MarkKind::Link,
            MarkKind::Em,
            MarkKind::Strong,
            MarkKind::Strike,
            MarkKind::Underline,
            MarkKind::TextColor,
            MarkKind::Subsup,
        ];
        for pair in known.windows(2) {
            assert!(pair[0].priority() < pair[1].priority());
        }
        assert_eq!(MarkKind::Unknown("x".into()).priority(), 100);
    }
}
