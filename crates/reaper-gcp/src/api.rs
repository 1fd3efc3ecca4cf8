//! Authenticated JSON-over-HTTP calls to Google APIs.

use std::collections::HashSet;
use std::sync::Arc;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::auth::TokenSource;
use crate::error::{GcpError, GcpResult};

/// An HTTP client that attaches a fresh bearer token to every request.
#[derive(Clone)]
pub struct GoogleApi {
    http: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
}

impl GoogleApi {
    pub fn new(http: reqwest::Client, tokens: Arc<dyn TokenSource>) -> Self {
        Self { http, tokens }
    }

    /// GET a JSON document.
    ///
    /// An empty response body decodes as `{}`.
    pub async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> GcpResult<Value> {
        let req = self.http.get(url).query(query);
        self.send(req, url).await
    }

    /// POST a JSON body and return the JSON reply.
    pub async fn post_json(&self, url: &str, body: &Value) -> GcpResult<Value> {
        let req = self.http.post(url).json(body);
        self.send(req, url).await
    }

    /// GET and decode into a typed response.
    pub async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> GcpResult<T> {
        let value = self.get_json(url, query).await?;
        serde_json::from_value(value).map_err(|e| GcpError::decode(url, e.to_string()))
    }

    async fn send(&self, req: RequestBuilder, url: &str) -> GcpResult<Value> {
        let token = self.tokens.token().await?;
        debug!(%url, "google api request");

        let resp = req
            .bearer_auth(token)
            .send()
            .await
            .map_err(|source| GcpError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GcpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let bytes = resp.bytes().await.map_err(|source| GcpError::Transport {
            url: url.to_string(),
            source,
        })?;
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        serde_json::from_slice(&bytes).map_err(|e| GcpError::decode(url, e.to_string()))
    }
}

/// Page tokens handed out during one list call.
///
/// A server that hands back a token it already gave would otherwise keep
/// the listing going forever.
#[derive(Debug, Default)]
pub(crate) struct PageCursor {
    seen: HashSet<String>,
}

impl PageCursor {
    /// The token to request next, or `None` once the listing is complete.
    pub(crate) fn advance(&mut self, url: &str, next: Option<&str>) -> GcpResult<Option<String>> {
        match next.filter(|t| !t.is_empty()) {
            None => Ok(None),
            Some(token) if !self.seen.insert(token.to_string()) => Err(GcpError::decode(
                url,
                format!("page token {token:?} was returned twice"),
            )),
            Some(token) => Ok(Some(token.to_string())),
        }
    }
}
