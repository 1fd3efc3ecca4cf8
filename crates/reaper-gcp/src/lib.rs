//! reaper-gcp — the Google Cloud collaborators behind a sweep.
//!
//! Three narrow seams, each a trait so the sweep can run against live
//! APIs or an in-memory fake:
//!
//! ```text
//! TokenSource       → bearer token (static, or Application Default Credentials)
//! ProjectDirectory  → ACTIVE project ids (Resource Manager v3 search)
//! NotebookService   → locations, instances, blocking stop (Notebooks v1)
//!   ├── RestNotebookService    hand-built calls over untyped JSON
//!   └── ClientNotebookService  same calls, each page decoded into structs
//! ```
//!
//! Stop calls return a long-running operation; both notebook services
//! poll it until `done` before returning.

pub mod api;
pub mod auth;
pub mod error;
pub mod memory;
pub mod notebooks;
pub mod operation;
pub mod resource_manager;

use std::sync::Arc;
use std::time::Duration;

use reaper_core::ReaperConfig;

pub use api::GoogleApi;
pub use auth::{CLOUD_PLATFORM_SCOPE, DefaultCredentials, StaticToken, TokenSource};
pub use error::{GcpError, GcpResult};
pub use memory::InMemoryCloud;
pub use notebooks::{ClientNotebookService, NotebookService, RestNotebookService};
pub use operation::{Operation, OperationPoller};
pub use resource_manager::{HomeProject, ProjectDirectory, ResourceManagerClient};

/// Per-request timeout for every Google API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// The live collaborators selected by a `ReaperConfig`.
#[derive(Clone)]
pub struct GoogleCloud {
    pub projects: Arc<dyn ProjectDirectory>,
    pub notebooks: Arc<dyn NotebookService>,
}

impl GoogleCloud {
    pub fn from_config(config: &ReaperConfig) -> GcpResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(GcpError::Client)?;
        let tokens = auth::token_source(config);
        let api = GoogleApi::new(http, tokens);

        Ok(Self {
            projects: resource_manager::project_directory(config, api.clone()),
            notebooks: notebooks::notebook_service(config, api),
        })
    }
}
