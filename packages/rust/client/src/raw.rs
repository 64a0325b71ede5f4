//! Serde models for the Confluence REST wire format.
//!
//! Only the fields the exporter consumes are declared; unknown fields are
//! ignored. Every collection and sub-object defaults to empty/absent so a
//! response missing an expansion degrades to missing data, not a decode
//! error.

use serde::Deserialize;

use confdown_shared::{Likes, Version};

// ---------------------------------------------------------------------------
// Search response envelope
// ---------------------------------------------------------------------------

/// Response of `/rest/api/content/search`.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<RawContent>,
    #[serde(default, rename = "_links")]
    pub links: ResponseLinks,
}

/// Pagination links. `next` is opaque and followed verbatim.
#[derive(Debug, Default, Deserialize)]
pub struct ResponseLinks {
    #[serde(default)]
    pub next: Option<String>,
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// One content record from a search batch, with the expansions the stream
/// always requests.
#[derive(Debug, Deserialize)]
pub struct RawContent {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub ancestors: Vec<RawAncestor>,
    #[serde(default)]
    pub body: Option<RawBody>,
    #[serde(default)]
    pub version: Option<RawVersion>,
    #[serde(default)]
    pub metadata: Option<RawMetadata>,
    #[serde(default)]
    pub space: Option<RawSpace>,
    #[serde(default)]
    pub children: Option<RawChildren>,
    #[serde(default)]
    pub descendants: Option<RawDescendants>,
    #[serde(default, rename = "_links")]
    pub links: Option<ContentLinks>,
}

#[derive(Debug, Deserialize)]
pub struct RawAncestor {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct RawBody {
    #[serde(default)]
    pub atlas_doc_format: Option<RawBodyRepresentation>,
}

/// The ADF payload arrives as a JSON string inside the JSON response.
/// It stays a string until the conversion engine parses it.
#[derive(Debug, Deserialize)]
pub struct RawBodyRepresentation {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct RawVersion {
    #[serde(default)]
    pub number: i64,
    #[serde(default)]
    pub when: Option<String>,
    #[serde(default)]
    pub by: Option<RawUser>,
}

impl From<RawVersion> for Version {
    fn from(raw: RawVersion) -> Self {
        Version {
            number: raw.number,
            when: raw.when,
            author: raw.by.map(|u| u.display_name),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawUser {
    #[serde(default, rename = "displayName")]
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct RawMetadata {
    #[serde(default)]
    pub labels: Option<RawLabels>,
    #[serde(default)]
    pub likes: Option<RawLikes>,
}

#[derive(Debug, Deserialize)]
pub struct RawLabels {
    #[serde(default)]
    pub results: Vec<RawLabel>,
}

#[derive(Debug, Deserialize)]
pub struct RawLabel {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RawLikes {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub users: Vec<RawUser>,
}

impl From<RawLikes> for Likes {
    fn from(raw: RawLikes) -> Self {
        Likes {
            count: raw.count,
            likers: raw.users.into_iter().map(|u| u.display_name).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawSpace {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub status: String,
}

/// `children.page` expansion; only the size matters (folder detection).
#[derive(Debug, Deserialize)]
pub struct RawChildren {
    #[serde(default)]
    pub page: Option<RawChildPages>,
}

#[derive(Debug, Deserialize)]
pub struct RawChildPages {
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Deserialize)]
pub struct ContentLinks {
    #[serde(default)]
    pub webui: Option<String>,
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

/// `descendants.comment` expansion: every comment of the page, flat.
#[derive(Debug, Deserialize)]
pub struct RawDescendants {
    #[serde(default)]
    pub comment: Option<RawCommentList>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawCommentList {
    #[serde(default)]
    pub results: Vec<RawComment>,
}

/// One comment from the flat descendant list. Its `children.comment` holds
/// nested copies of direct replies; the forest builder only reads their ids.
#[derive(Debug, Deserialize)]
pub struct RawComment {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub body: Option<RawBody>,
    #[serde(default)]
    pub extensions: Option<RawCommentExtensions>,
    #[serde(default)]
    pub version: Option<RawVersion>,
    #[serde(default)]
    pub children: Option<RawCommentChildren>,
}

#[derive(Debug, Deserialize)]
pub struct RawCommentExtensions {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, rename = "inlineProperties")]
    pub inline_properties: Option<RawInlineProperties>,
}

#[derive(Debug, Deserialize)]
pub struct RawInlineProperties {
    #[serde(default, rename = "originalSelection")]
    pub original_selection: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawCommentChildren {
    #[serde(default)]
    pub comment: Option<RawCommentList>,
}

// ---------------------------------------------------------------------------
// Space inventory
// ---------------------------------------------------------------------------

/// Response of `/rest/api/space`.
#[derive(Debug, Deserialize)]
pub struct SpaceListResponse {
    #[serde(default)]
    pub results: Vec<RawSpace>,
    #[serde(default, rename = "_links")]
    pub links: ResponseLinks,
}
