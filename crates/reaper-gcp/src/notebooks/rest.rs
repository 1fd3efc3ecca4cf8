//! Notebooks over hand-built REST calls.
//!
//! Responses are navigated as untyped JSON: a malformed instance entry
//! is skipped on its own instead of failing the whole listing.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::warn;

use reaper_core::{Instance, LocationId, OperationResult};

use super::NotebookService;
use crate::api::{GoogleApi, PageCursor};
use crate::error::{GcpError, GcpResult};
use crate::operation::{Operation, OperationPoller};

pub struct RestNotebookService {
    api: GoogleApi,
    base: String,
    poller: OperationPoller,
}

impl RestNotebookService {
    /// `base` is the versioned API root, e.g. `https://notebooks.googleapis.com/v1`.
    pub fn new(api: GoogleApi, base: impl Into<String>, poller: OperationPoller) -> Self {
        Self {
            api,
            base: base.into(),
            poller,
        }
    }

    /// Fetch every page of a list call, returning the array under `field`
    /// from each page. `None` if the first page has no such array.
    async fn list_all(&self, url: &str, field: &str) -> GcpResult<Option<Vec<Value>>> {
        let mut items: Option<Vec<Value>> = None;
        let mut page_token: Option<String> = None;
        let mut cursor = PageCursor::default();

        loop {
            let query: Vec<(&str, &str)> = match page_token.as_deref() {
                Some(token) => vec![("pageToken", token)],
                None => Vec::new(),
            };
            let mut page = self.api.get_json(url, &query).await?;

            if let Some(Value::Array(entries)) = page.get_mut(field).map(Value::take) {
                items.get_or_insert_with(Vec::new).extend(entries);
            }

            page_token = cursor.advance(url, page.get("nextPageToken").and_then(Value::as_str))?;
            if page_token.is_none() {
                break;
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl NotebookService for RestNotebookService {
    async fn list_locations(&self, project: &str) -> GcpResult<Vec<LocationId>> {
        let url = format!("{}/projects/{}/locations", self.base, project);
        let Some(locations) = self.list_all(&url, "locations").await? else {
            return Err(GcpError::decode(&url, "response has no `locations`"));
        };

        Ok(locations
            .iter()
            .filter_map(|loc| loc.get("locationId").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    async fn list_instances(&self, project: &str, location: &str) -> GcpResult<Vec<Instance>> {
        let url = format!(
            "{}/projects/{}/locations/{}/instances",
            self.base, project, location
        );
        let entries = self.list_all(&url, "instances").await?.unwrap_or_default();

        let mut instances = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<Instance>(entry) {
                Ok(instance) => instances.push(instance),
                Err(e) => warn!(%project, %location, error = %e, "skipping malformed instance entry"),
            }
        }
        Ok(instances)
    }

    async fn stop_instance(&self, name: &str) -> GcpResult<OperationResult> {
        let url = format!("{}/{}:stop", self.base, name);
        let reply = self.api.post_json(&url, &json!({})).await?;
        let op: Operation =
            serde_json::from_value(reply).map_err(|e| GcpError::decode(&url, e.to_string()))?;
        self.poller.wait(op).await
    }
}
