//! Lazily-paginated content stream over the CQL search API.
//!
//! [`PageStream`] is pull-based: each refill issues exactly one HTTP call
//! (the structured query first, then the opaque `_links.next` of the prior
//! response) and converts the batch into domain [`Page`] records. The
//! consumer controls pacing; nothing is fetched until it pulls.

use std::collections::VecDeque;

use tracing::debug;

use confdown_shared::{Page, Result, SpaceRef};

use crate::api::ApiClient;
use crate::forest::build_comment_forest;
use crate::raw::{RawContent, SearchResponse};

/// Search endpoint, relative to the instance base URL.
const SEARCH_PATH: &str = "/rest/api/content/search";

/// Batch size for search requests.
pub const PAGE_LIMIT: u32 = 250;

/// Field expansions requested with every search call.
///
/// Structural: the API silently omits whatever is not expanded, so a
/// missing entry here surfaces as missing output rather than an error.
/// The list is requested verbatim on the first call; continuation links
/// already carry it.
pub const EXPAND_FIELDS: &[&str] = &[
    "ancestors",
    "body.atlas_doc_format",
    "version",
    "space",
    "metadata.labels",
    "metadata.likes",
    "children.page",
    "descendants.comment.body.atlas_doc_format",
    "descendants.comment.extensions.location",
    "descendants.comment.extensions.inlineProperties",
    "descendants.comment.version",
    "descendants.comment.children.comment",
    "descendants.comment.metadata.likes",
];

// ---------------------------------------------------------------------------
// SearchQuery
// ---------------------------------------------------------------------------

/// Which spaces to export.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Space keys, e.g. `["ENG", "OPS"]`.
    pub space_keys: Vec<String>,
    /// Whether archived spaces are searched too.
    pub include_archived: bool,
}

impl SearchQuery {
    pub fn new(space_keys: Vec<String>) -> Self {
        Self {
            space_keys,
            include_archived: false,
        }
    }

    /// CQL filter over content type and space membership.
    pub fn to_cql(&self) -> String {
        let keys = self
            .space_keys
            .iter()
            .map(|k| format!("\"{k}\""))
            .collect::<Vec<_>>()
            .join(",");
        format!("type=page and space in ({keys})")
    }
}

// ---------------------------------------------------------------------------
// PageStream
// ---------------------------------------------------------------------------

enum StreamState {
    /// Nothing fetched yet: the next refill issues the structured query.
    Initial,
    /// The previous response returned a continuation link to follow.
    Next(String),
    /// No continuation link was returned, or an error ended the stream.
    Done,
}

/// Pull-based producer of fully-hydrated [`Page`] records.
///
/// One call in flight at a time, yielded in API order across batches. The
/// sequence ends only when a response carries no `_links.next`; a short or
/// even empty batch does not terminate it. The first transport or decode
/// error is yielded once, after which the stream is done. There is no
/// retry and no resume.
pub struct PageStream<'a> {
    api: &'a ApiClient,
    query: SearchQuery,
    buffer: VecDeque<Page>,
    state: StreamState,
}

impl<'a> PageStream<'a> {
    pub fn new(api: &'a ApiClient, query: SearchQuery) -> Self {
        Self {
            api,
            query,
            buffer: VecDeque::new(),
            state: StreamState::Initial,
        }
    }

    /// Pull the next page. `None` signals end of sequence.
    pub async fn next(&mut self) -> Option<Result<Page>> {
        loop {
            if let Some(page) = self.buffer.pop_front() {
                return Some(Ok(page));
            }

            // Leave the state at Done while a call is in flight: if it
            // fails, the error is yielded once and the stream stays ended.
            match std::mem::replace(&mut self.state, StreamState::Done) {
                StreamState::Initial => {
                    if let Err(e) = self.fetch_first().await {
                        return Some(Err(e));
                    }
                }
                StreamState::Next(link) => {
                    if let Err(e) = self.fetch_continuation(&link).await {
                        return Some(Err(e));
                    }
                }
                StreamState::Done => return None,
            }
        }
    }

    async fn fetch_first(&mut self) -> Result<()> {
        let params = [
            ("cql", self.query.to_cql()),
            ("start", "0".to_string()),
            ("limit", PAGE_LIMIT.to_string()),
            ("expand", EXPAND_FIELDS.join(",")),
            (
                "includeArchivedSpaces",
                self.query.include_archived.to_string(),
            ),
        ];
        let response: SearchResponse = self.api.fetch_json(SEARCH_PATH, &params).await?;
        self.ingest(response);
        Ok(())
    }

    /// Follow the opaque continuation link exactly as received. Its query
    /// string already encodes cursor, cql, and expansions; rebuilding any
    /// of it would desynchronize the cursor.
    async fn fetch_continuation(&mut self, link: &str) -> Result<()> {
        let response: SearchResponse = self.api.fetch_json(link, &[]).await?;
        self.ingest(response);
        Ok(())
    }

    fn ingest(&mut self, response: SearchResponse) {
        debug!(
            results = response.results.len(),
            has_next = response.links.next.is_some(),
            "search batch"
        );
        for raw in response.results {
            self.buffer
                .push_back(convert_raw_page(raw, self.api.base_url()));
        }
        self.state = match response.links.next {
            Some(next) => StreamState::Next(next),
            None => StreamState::Done,
        };
    }
}

// ---------------------------------------------------------------------------
// Raw -> domain conversion
// ---------------------------------------------------------------------------

/// Map one raw search result into a domain [`Page`].
pub fn convert_raw_page(raw: RawContent, base_url: &str) -> Page {
    let RawContent {
        id,
        title,
        status,
        ancestors,
        body,
        version,
        metadata,
        space,
        children,
        descendants,
        links,
    } = raw;

    // Ancestor titles in API order (root first); length always matches the
    // raw ancestor list.
    let path: Vec<String> = ancestors.into_iter().map(|a| a.title).collect();

    let body = body.and_then(|b| b.atlas_doc_format).map(|rep| rep.value);

    let (labels, likes) = match metadata {
        Some(meta) => (
            meta.labels
                .map(|l| l.results.into_iter().map(|r| r.name).collect())
                .unwrap_or_default(),
            meta.likes.map(Into::into),
        ),
        None => (Vec::new(), None),
    };

    let comments = build_comment_forest(
        descendants
            .and_then(|d| d.comment)
            .map(|list| list.results)
            .unwrap_or_default(),
    );

    let has_children = children
        .and_then(|c| c.page)
        .map(|p| p.size > 0)
        .unwrap_or(false);

    let url = links
        .and_then(|l| l.webui)
        .map(|webui| format!("{base_url}{webui}"));

    Page {
        id,
        title,
        status,
        body,
        path,
        comments,
        labels,
        likes,
        version: version.map(Into::into),
        space: space.map(|s| SpaceRef {
            key: s.key,
            name: s.name,
        }),
        url,
        has_children,
    }
}
