//! Notebook management.
//!
//! Two interchangeable implementations of [`NotebookService`] talk to
//! the Notebooks v1 API; [`notebook_service`] picks one from the config.

mod client;
mod rest;

use std::sync::Arc;

use async_trait::async_trait;

use reaper_core::{Instance, LocationId, NotebookTransport, OperationResult, ReaperConfig};

use crate::api::GoogleApi;
use crate::error::GcpResult;
use crate::operation::OperationPoller;

pub use client::ClientNotebookService;
pub use rest::RestNotebookService;

/// Lists and stops managed notebook instances.
#[async_trait]
pub trait NotebookService: Send + Sync {
    /// Locations the notebooks service supports for `project`.
    async fn list_locations(&self, project: &str) -> GcpResult<Vec<LocationId>>;

    /// Instances in `project` at `location`.
    async fn list_instances(&self, project: &str, location: &str) -> GcpResult<Vec<Instance>>;

    /// Stop an instance by its fully-qualified name and wait for the
    /// stop operation to finish.
    async fn stop_instance(&self, name: &str) -> GcpResult<OperationResult>;
}

/// Pick the notebook service a config asks for.
pub fn notebook_service(config: &ReaperConfig, api: GoogleApi) -> Arc<dyn NotebookService> {
    let base = format!("{}/v1", config.endpoints.notebooks.trim_end_matches('/'));
    let poller = OperationPoller::new(
        api.clone(),
        base.clone(),
        config.stop_poll_interval,
        config.stop_timeout,
    );
    match config.transport {
        NotebookTransport::Rest => Arc::new(RestNotebookService::new(api, base, poller)),
        NotebookTransport::Client => Arc::new(ClientNotebookService::new(api, base, poller)),
    }
}
