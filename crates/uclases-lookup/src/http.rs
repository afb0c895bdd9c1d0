use reqwest::header::{HeaderMap, HeaderValue};

use crate::error::{LookupError, Result};

/// Header the backend uses to tell widget requests from page navigation.
pub const REQUESTED_WITH: &str = "x-requested-with";
pub const XML_HTTP_REQUEST: &str = "XMLHttpRequest";

// ─── AjaxClient ───────────────────────────────────────────────────────────────

/// Thin reqwest wrapper that marks every request as programmatic.
///
/// No retries and no timeout beyond the transport default: callers decide
/// how failures degrade.
#[derive(Debug, Clone)]
pub struct AjaxClient {
    client: reqwest::Client,
}

impl AjaxClient {
    pub fn new(user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(REQUESTED_WITH, HeaderValue::from_static(XML_HTTP_REQUEST));
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }

    /// GET `url`, failing on any non-2xx status.
    pub async fn get(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().await?;
        Self::read_body(url, resp).await
    }

    /// POST `fields` as an urlencoded form, failing on any non-2xx status.
    pub async fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<String> {
        let resp = self.client.post(url).form(fields).send().await?;
        Self::read_body(url, resp).await
    }

    async fn read_body(url: &str, resp: reqwest::Response) -> Result<String> {
        let status = resp.status();
        if !status.is_success() {
            return Err(LookupError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        resp.text().await.map_err(LookupError::Http)
    }
}

/// Append `q={query}` to `url`, percent-encoding the query.
pub fn with_query(url: &str, query: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}q={}", urlencoding::encode(query))
}
