//! Project enumeration.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use reaper_core::{Project, ProjectId, ProjectScope, ProjectState, ReaperConfig};

use crate::api::{GoogleApi, PageCursor};
use crate::error::GcpResult;

const ACTIVE_QUERY: &str = "state:ACTIVE";

/// Lists the projects a sweep covers.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    async fn search_active_projects(&self) -> GcpResult<Vec<ProjectId>>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchProjectsResponse {
    #[serde(default)]
    projects: Vec<Project>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Cloud Resource Manager v3 `projects:search`.
pub struct ResourceManagerClient {
    api: GoogleApi,
    search_url: String,
}

impl ResourceManagerClient {
    pub fn new(api: GoogleApi, endpoint: &str) -> Self {
        Self {
            api,
            search_url: format!("{}/v3/projects:search", endpoint.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl ProjectDirectory for ResourceManagerClient {
    async fn search_active_projects(&self) -> GcpResult<Vec<ProjectId>> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;
        let mut cursor = PageCursor::default();

        loop {
            let mut query = vec![("query", ACTIVE_QUERY)];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let page: SearchProjectsResponse = self.api.get(&self.search_url, &query).await?;

            for project in page.projects {
                // The query already filters on state; trust but verify.
                if project.state == ProjectState::Active {
                    debug!(project = %project.project_id, "found active project");
                    ids.push(project.project_id);
                }
            }

            page_token = cursor.advance(&self.search_url, page.next_page_token.as_deref())?;
            if page_token.is_none() {
                break;
            }
        }

        Ok(ids)
    }
}

/// A single configured project, for identities that cannot search.
#[derive(Debug, Clone)]
pub struct HomeProject(ProjectId);

impl HomeProject {
    pub fn new(project_id: impl Into<ProjectId>) -> Self {
        Self(project_id.into())
    }
}

#[async_trait]
impl ProjectDirectory for HomeProject {
    async fn search_active_projects(&self) -> GcpResult<Vec<ProjectId>> {
        Ok(vec![self.0.clone()])
    }
}

/// Pick the project directory a config asks for.
pub fn project_directory(config: &ReaperConfig, api: GoogleApi) -> Arc<dyn ProjectDirectory> {
    match config.project_scope {
        ProjectScope::Search => Arc::new(ResourceManagerClient::new(
            api,
            &config.endpoints.resource_manager,
        )),
        ProjectScope::Home => Arc::new(HomeProject::new(config.project_id.clone())),
    }
}
