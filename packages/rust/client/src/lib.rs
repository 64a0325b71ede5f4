//! Confluence REST client: fetch, pagination, comment-forest rebuild.
//!
//! [`PageStream`] is the entry point. It turns a space-scoped CQL search
//! into a pull-based sequence of fully-hydrated [`confdown_shared::Page`]
//! records: one HTTP call per batch, server continuation links followed
//! verbatim until none is returned, comment forests reconstructed from the
//! flat descendant lists along the way.

pub mod api;
pub mod forest;
pub mod raw;
pub mod stream;

pub use api::{ApiClient, ApiCredentials};
pub use forest::build_comment_forest;
pub use stream::{EXPAND_FIELDS, PAGE_LIMIT, PageStream, SearchQuery, convert_raw_page};
