//! HTTP client for the Confluence Cloud REST API.
//!
//! One retrieval primitive, [`ApiClient::fetch_json`], serves both
//! structured queries and server-supplied continuation links. Continuation
//! links are opaque: they are requested exactly as received, never taken
//! apart and rebuilt.

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use confdown_shared::{ConfdownError, Result, SpaceInfo};

use crate::raw::SpaceListResponse;

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("confdown/", env!("CARGO_PKG_VERSION"));

/// Batch size for space-inventory requests.
const SPACE_LIMIT: u32 = 100;

/// Connection details for one Confluence instance.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    /// Instance base URL including the context path
    /// (e.g. `https://acme.atlassian.net/wiki`).
    pub base_url: String,
    /// Account email for basic auth.
    pub username: String,
    /// API token paired with the email.
    pub api_token: String,
}

/// Thin wrapper around `reqwest::Client` carrying instance credentials.
pub struct ApiClient {
    creds: ApiCredentials,
    client: Client,
}

impl ApiClient {
    /// Build a client for one instance.
    ///
    /// No request timeout is configured (reqwest defaults apply) and failed
    /// calls are not retried: a transport error aborts the running export.
    pub fn new(creds: ApiCredentials) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ConfdownError::Api(format!("failed to build HTTP client: {e}")))?;

        let mut creds = creds;
        while creds.base_url.ends_with('/') {
            creds.base_url.pop();
        }

        Ok(Self { creds, client })
    }

    /// GET a JSON document.
    ///
    /// A `path_or_url` starting with `http` is requested verbatim; anything
    /// else is appended to the instance base URL by plain concatenation.
    /// `Url::join` would resolve a leading `/rest/...` against the host root
    /// and drop the `/wiki` context path, so it is deliberately not used.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        path_or_url: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = if path_or_url.starts_with("http") {
            path_or_url.to_string()
        } else {
            format!("{}{}", self.creds.base_url, path_or_url)
        };

        debug!(%url, "GET");

        let mut request = self
            .client
            .get(&url)
            .basic_auth(&self.creds.username, Some(&self.creds.api_token));
        if !params.is_empty() {
            request = request.query(params);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ConfdownError::Api(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfdownError::Api(format!("{url}: HTTP {status}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ConfdownError::parse(format!("{url}: {e}")))
    }

    /// List every space visible to the authenticated user.
    ///
    /// Pages through `/rest/api/space` with the same continuation-link rules
    /// as the content stream.
    pub async fn list_spaces(&self) -> Result<Vec<SpaceInfo>> {
        let mut spaces = Vec::new();
        let mut next: Option<String> = None;

        loop {
            let response: SpaceListResponse = match next.take() {
                Some(link) => self.fetch_json(&link, &[]).await?,
                None => {
                    let params = [("limit", SPACE_LIMIT.to_string())];
                    self.fetch_json("/rest/api/space", &params).await?
                }
            };

            spaces.extend(response.results.into_iter().map(|s| SpaceInfo {
                key: s.key,
                name: s.name,
                kind: s.kind,
                status: s.status,
            }));

            match response.links.next {
                Some(link) => next = Some(link),
                None => break,
            }
        }

        Ok(spaces)
    }

    /// The configured base URL, trailing slash stripped.
    pub fn base_url(&self) -> &str {
        &self.creds.base_url
    }
}

#[cfg(test)]
mod api_tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: String) -> ApiClient {
        ApiClient::new(ApiCredentials {
            base_url,
            username: "dev@acme.example".into(),
            api_token: "token".into(),
        })
        .expect("build client")
    }

    #[tokio::test]
    async fn test_fetch_json_appends_path_to_base() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/space"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})),
            )
            .mount(&server)
            .await;

        // Trailing slash on base_url must not produce a double slash.
        let client = test_client(format!("{}/", server.uri()));
        let body: serde_json::Value = client.fetch_json("/rest/api/space", &[]).await.unwrap();
        assert_eq!(body["results"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_fetch_json_uses_absolute_urls_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/anywhere"))
            .and(query_param("cursor", "abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        // base_url points somewhere else entirely; the absolute URL wins.
        let client = test_client("https://unreachable.invalid/wiki".into());
        let url = format!("{}/anywhere?cursor=abc", server.uri());
        let body: serde_json::Value = client.fetch_json(&url, &[]).await.unwrap();
        assert_eq!(body["ok"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/space"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let result: Result<serde_json::Value> = client.fetch_json("/rest/api/space", &[]).await;
        let err = result.unwrap_err();
        assert!(matches!(err, ConfdownError::Api(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/space"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let result: Result<SpaceListResponse> = client.fetch_json("/rest/api/space", &[]).await;
        assert!(matches!(result.unwrap_err(), ConfdownError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_list_spaces_follows_continuation() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/space"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"key": "ENG", "name": "Engineering", "type": "global", "status": "current"},
                ],
                "_links": {"next": "/rest/api/space?cursor=p2"},
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/api/space"))
            .and(query_param("cursor", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"key": "OPS", "name": "Operations", "type": "global", "status": "archived"},
                ],
                "_links": {},
            })))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let spaces = client.list_spaces().await.unwrap();
        assert_eq!(spaces.len(), 2);
        assert_eq!(spaces[0].key, "ENG");
        assert_eq!(spaces[1].status, "archived");
    }
}
