use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use uclases_core::MatchItem;
use uclases_core::config::resolve_url;

use crate::error::{LookupError, Result};
use crate::http::{AjaxClient, with_query};

/// Anything that can answer a lookup query with match items.
#[async_trait]
pub trait MatchSource: Send + Sync {
    /// Raw lookup: transport and status errors are reported, not hidden.
    async fn lookup(&self, url: &str, query: &str) -> Result<Vec<MatchItem>>;
}

/// Lookup endpoint reached over HTTP: `GET {url}?q={query}`.
pub struct HttpMatchSource {
    client: AjaxClient,
    base_url: Option<String>,
}

impl HttpMatchSource {
    pub fn new(user_agent: &str) -> Result<Self> {
        Ok(Self::with_client(AjaxClient::new(user_agent)?))
    }

    pub fn with_client(client: AjaxClient) -> Self {
        Self {
            client,
            base_url: None,
        }
    }

    /// Resolve relative lookup URLs (as written in markup) against `base_url`.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }
}

#[async_trait]
impl MatchSource for HttpMatchSource {
    async fn lookup(&self, url: &str, query: &str) -> Result<Vec<MatchItem>> {
        let url = match &self.base_url {
            Some(base) => resolve_url(base, url),
            None => url.to_string(),
        };
        let endpoint = with_query(&url, query);
        let body = self.client.get(&endpoint).await?;
        parse_matches(&body)
    }
}

/// Parse a lookup body. Anything but a JSON array yields no matches;
/// array elements that are not objects are skipped. Fields of the wrong
/// type are read as text rather than dropping the element.
pub fn parse_matches(body: &str) -> Result<Vec<MatchItem>> {
    let value: Value = serde_json::from_str(body).map_err(|e| LookupError::Parse(e.to_string()))?;
    let Value::Array(items) = value else {
        debug!("lookup response is not an array");
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|v| match serde_json::from_value(v) {
            Ok(item) => Some(item),
            Err(e) => {
                debug!(error = %e, "skipping unreadable match");
                None
            }
        })
        .collect())
}

/// Fetch matches for `query`, degrading every failure to "no matches" and
/// keeping at most `max_results` items.
pub async fn fetch_matches(
    source: &dyn MatchSource,
    url: &str,
    query: &str,
    max_results: usize,
) -> Vec<MatchItem> {
    match source.lookup(url, query).await {
        Ok(mut items) => {
            items.truncate(max_results);
            items
        }
        Err(e) => {
            warn!(url, query, error = %e, "lookup failed, showing no matches");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use uclases_core::MatchId;

    fn source() -> HttpMatchSource {
        HttpMatchSource::new("uclases-test").unwrap()
    }

    #[tokio::test]
    async fn test_fetch_truncates_to_max_results() {
        let mut server = Server::new_async().await;
        let url = format!("{}/search/users", server.url());

        let m = server
            .mock("GET", "/search/users?q=al")
            .match_header("x-requested-with", "XMLHttpRequest")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"id": 1, "label": "Alice"},
                    {"id": 2, "label": "Albert"},
                    {"id": 3, "label": "Alonso"},
                    {"id": 4, "label": "Alma"}
                ]"#,
            )
            .create_async()
            .await;

        let items = fetch_matches(&source(), &url, "al", 3).await;
        m.assert_async().await;

        let labels: Vec<_> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Alice", "Albert", "Alonso"]);
        assert_eq!(items[1].id, MatchId::from(2));
    }

    #[tokio::test]
    async fn test_query_is_percent_encoded() {
        let mut server = Server::new_async().await;
        let url = format!("{}/search/courses", server.url());

        let m = server
            .mock("GET", "/search/courses?q=c%C3%A1lculo%20I")
            .with_status(200)
            .with_body(r#"[{"id": "calc-1", "label": "Cálculo I", "description": "MAT1610"}]"#)
            .create_async()
            .await;

        let items = fetch_matches(&source(), &url, "cálculo I", 15).await;
        m.assert_async().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description.as_deref(), Some("MAT1610"));
    }

    #[tokio::test]
    async fn test_non_success_status_degrades_to_empty() {
        let mut server = Server::new_async().await;
        let url = format!("{}/search/users", server.url());

        let _m = server
            .mock("GET", "/search/users?q=al")
            .with_status(500)
            .with_body(r#"[{"id": 1, "label": "Alice"}]"#)
            .create_async()
            .await;

        let raw = source().lookup(&url, "al").await;
        assert!(matches!(raw, Err(LookupError::Status { status: 500, .. })));

        let items = fetch_matches(&source(), &url, "al", 15).await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_non_array_body_degrades_to_empty() {
        let mut server = Server::new_async().await;
        let url = format!("{}/search/users", server.url());

        let _m = server
            .mock("GET", "/search/users?q=al")
            .with_status(200)
            .with_body(r#"{"results": [{"id": 1, "label": "Alice"}]}"#)
            .create_async()
            .await;

        assert!(fetch_matches(&source(), &url, "al", 15).await.is_empty());
    }

    #[tokio::test]
    async fn test_relative_url_resolves_against_base() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/search/users?q=uma")
            .with_status(200)
            .with_body(r#"[{"id": 9, "label": "Uma"}]"#)
            .create_async()
            .await;

        let source = source().with_base_url(&server.url());
        let items = fetch_matches(&source, "/search/users", "uma", 15).await;
        m.assert_async().await;
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_degrades_to_empty() {
        let items = fetch_matches(&source(), "http://127.0.0.1:1/search", "al", 15).await;
        assert!(items.is_empty());
    }

    #[test]
    fn test_parse_skips_non_objects_and_rejects_garbage() {
        let items = parse_matches(r#"[1, "x", {"label": "Alma"}, null]"#).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "Alma");
        assert!(matches!(parse_matches("<html>"), Err(LookupError::Parse(_))));
    }

    #[test]
    fn test_parse_keeps_items_with_mistyped_fields() {
        let items = parse_matches(
            r#"[
                {"id": 1, "label": "Alice"},
                {"id": true, "label": "Bool"},
                {"id": 3, "label": 42},
                {"id": 4, "label": "D", "description": 7}
            ]"#,
        )
        .unwrap();

        let labels: Vec<_> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Alice", "Bool", "42", "D"]);
        assert_eq!(items[1].id.as_value(), "true");
        assert_eq!(items[2].id, MatchId::from(3));
        assert_eq!(items[3].visible_description(), Some("7"));
    }
}
