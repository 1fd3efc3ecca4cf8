//! Notebooks over REST with typed page decoding.
//!
//! Same endpoints as the untyped service, but every page is decoded into
//! response structs; a page that fails to decode fails the whole call.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use reaper_core::{Instance, Location, LocationId, OperationResult};

use super::NotebookService;
use crate::api::{GoogleApi, PageCursor};
use crate::error::{GcpError, GcpResult};
use crate::operation::{Operation, OperationPoller};

/// One page of a paginated list response.
trait Page: DeserializeOwned {
    type Item;

    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListLocationsResponse {
    #[serde(default)]
    locations: Vec<Location>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl Page for ListLocationsResponse {
    type Item = Location;

    fn into_parts(self) -> (Vec<Location>, Option<String>) {
        (self.locations, self.next_page_token)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListInstancesResponse {
    #[serde(default)]
    instances: Vec<Instance>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl Page for ListInstancesResponse {
    type Item = Instance;

    fn into_parts(self) -> (Vec<Instance>, Option<String>) {
        (self.instances, self.next_page_token)
    }
}

pub struct ClientNotebookService {
    api: GoogleApi,
    base: String,
    poller: OperationPoller,
}

impl ClientNotebookService {
    /// `base` is the versioned API root, e.g. `https://notebooks.googleapis.com/v1`.
    pub fn new(api: GoogleApi, base: impl Into<String>, poller: OperationPoller) -> Self {
        Self {
            api,
            base: base.into(),
            poller,
        }
    }

    async fn collect<P: Page>(&self, url: &str) -> GcpResult<Vec<P::Item>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        let mut cursor = PageCursor::default();

        loop {
            let query: Vec<(&str, &str)> = match page_token.as_deref() {
                Some(token) => vec![("pageToken", token)],
                None => Vec::new(),
            };
            let page: P = self.api.get(url, &query).await?;
            let (batch, next) = page.into_parts();
            items.extend(batch);

            page_token = cursor.advance(url, next.as_deref())?;
            if page_token.is_none() {
                break;
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl NotebookService for ClientNotebookService {
    async fn list_locations(&self, project: &str) -> GcpResult<Vec<LocationId>> {
        let url = format!("{}/projects/{}/locations", self.base, project);
        let locations = self.collect::<ListLocationsResponse>(&url).await?;
        debug!(%project, count = locations.len(), "listed locations");
        Ok(locations.into_iter().map(|l| l.location_id).collect())
    }

    async fn list_instances(&self, project: &str, location: &str) -> GcpResult<Vec<Instance>> {
        let url = format!(
            "{}/projects/{}/locations/{}/instances",
            self.base, project, location
        );
        self.collect::<ListInstancesResponse>(&url).await
    }

    async fn stop_instance(&self, name: &str) -> GcpResult<OperationResult> {
        let url = format!("{}/{}:stop", self.base, name);
        let reply = self.api.post_json(&url, &json!({})).await?;
        let op: Operation =
            serde_json::from_value(reply).map_err(|e| GcpError::decode(&url, e.to_string()))?;
        debug!(instance = %name, operation = %op.name, "stop accepted, waiting for completion");
        self.poller.wait(op).await
    }
}
