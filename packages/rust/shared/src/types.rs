//! Core domain types for confdown exports.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// A fully-hydrated Confluence page as yielded by the content stream.
///
/// Constructed once per retrieval batch and treated as immutable downstream:
/// the conversion engine never mutates its input, and nothing is cached
/// between pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Content id (numeric on the wire, kept as a string).
    pub id: String,
    /// Page title.
    pub title: String,
    /// Content status (`current`, `archived`, ...).
    pub status: String,
    /// Raw ADF body JSON exactly as returned by the API. Parsed lazily by the
    /// conversion engine so a malformed body degrades one page, not the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Ancestor titles in API order (root first, nearest parent last).
    /// Always the same length as the raw ancestor list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
    /// Root comments with replies nested. See [`Comment`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
    /// Label names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Like count and liker display names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<Likes>,
    /// Latest version info.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    /// Owning space.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<SpaceRef>,
    /// Canonical web URL of the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// True when the page has child pages; the writer exports it as a
    /// directory with an `index.md` instead of a leaf file.
    #[serde(default)]
    pub has_children: bool,
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// Where a comment is anchored on its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentLocation {
    /// Anchored to a text selection inside the body.
    Inline,
    /// A regular comment at the foot of the page.
    Footer,
}

/// One node of a page's comment forest.
///
/// Every comment is owned by exactly one place: the page's root list or a
/// single parent's `replies`. Root membership is derived during forest
/// reconstruction (a comment is a root iff no other comment lists it as a
/// child), never stored on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Content id.
    pub id: String,
    /// Comment title (usually `Re: <page title>`).
    pub title: String,
    /// Content status.
    pub status: String,
    /// Raw ADF body JSON, like [`Page::body`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Inline or footer.
    pub location: CommentLocation,
    /// For inline comments: the span of page text the comment targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
    /// Direct replies, in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<Comment>,
    /// Version info (carries author and timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

// ---------------------------------------------------------------------------
// Metadata fragments
// ---------------------------------------------------------------------------

/// Version metadata attached to pages and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    /// Version number, starting at 1.
    pub number: i64,
    /// ISO-8601 timestamp of the edit, kept verbatim from the wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    /// Display name of the editing user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Like count plus liker display names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Likes {
    pub count: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub likers: Vec<String>,
}

/// Key and display name of the space a page belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceRef {
    pub key: String,
    pub name: String,
}

/// One entry of the instance's space inventory (`confdown spaces`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceInfo {
    pub key: String,
    pub name: String,
    /// `global` or `personal`.
    pub kind: String,
    /// `current` or `archived`.
    pub status: String,
}
