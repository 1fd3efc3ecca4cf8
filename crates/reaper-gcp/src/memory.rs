//! In-memory collaborators (for testing).
//!
//! `InMemoryCloud` implements both [`ProjectDirectory`] and
//! [`NotebookService`] over a mutable model of projects, locations and
//! instances. Stops flip the instance to `STOPPED`, so a second sweep
//! observes the effect of the first. Failures can be injected per
//! project, per location, per instance, or for credentials as a whole.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use reaper_core::{Instance, InstanceName, InstanceStatus, LocationId, OperationResult, ProjectId};

use crate::error::{GcpError, GcpResult};
use crate::notebooks::NotebookService;
use crate::resource_manager::ProjectDirectory;

#[derive(Default)]
struct CloudState {
    projects: Vec<ProjectId>,
    locations: HashMap<ProjectId, Vec<LocationId>>,
    instances: HashMap<(ProjectId, LocationId), Vec<Instance>>,
    failing_projects: bool,
    failing_locations: HashSet<ProjectId>,
    failing_instances: HashSet<(ProjectId, LocationId)>,
    failing_stops: HashSet<InstanceName>,
    auth_failure: bool,
    stop_calls: Vec<InstanceName>,
}

/// A scriptable stand-in for Resource Manager and Notebooks.
#[derive(Default)]
pub struct InMemoryCloud {
    state: Mutex<CloudState>,
}

impl InMemoryCloud {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CloudState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_project(&self, project: &str) {
        self.lock().projects.push(project.to_string());
    }

    pub fn add_location(&self, project: &str, location: &str) {
        self.lock()
            .locations
            .entry(project.to_string())
            .or_default()
            .push(location.to_string());
    }

    pub fn add_instance(&self, project: &str, location: &str, instance: Instance) {
        self.lock()
            .instances
            .entry((project.to_string(), location.to_string()))
            .or_default()
            .push(instance);
    }

    /// Make project search fail with a transport-style error.
    pub fn fail_project_search(&self) {
        self.lock().failing_projects = true;
    }

    pub fn fail_locations(&self, project: &str) {
        self.lock().failing_locations.insert(project.to_string());
    }

    pub fn fail_instances(&self, project: &str, location: &str) {
        self.lock()
            .failing_instances
            .insert((project.to_string(), location.to_string()));
    }

    pub fn fail_stop(&self, name: &str) {
        self.lock().failing_stops.insert(name.to_string());
    }

    /// Make every call fail as if the credentials were revoked.
    pub fn fail_auth(&self) {
        self.lock().auth_failure = true;
    }

    /// Instance names a stop was requested for, in call order.
    pub fn stop_calls(&self) -> Vec<InstanceName> {
        self.lock().stop_calls.clone()
    }

    /// Current view of one instance.
    pub fn instance(&self, name: &str) -> Option<Instance> {
        self.lock()
            .instances
            .values()
            .flatten()
            .find(|i| i.name == name)
            .cloned()
    }

    fn check_auth(state: &CloudState) -> GcpResult<()> {
        if state.auth_failure {
            return Err(GcpError::Auth("credentials revoked".to_string()));
        }
        Ok(())
    }
}

fn outage(what: &str) -> GcpError {
    GcpError::Status {
        url: format!("memory://{what}"),
        status: 503,
        body: "simulated outage".to_string(),
    }
}

#[async_trait]
impl ProjectDirectory for InMemoryCloud {
    async fn search_active_projects(&self) -> GcpResult<Vec<ProjectId>> {
        let state = self.lock();
        Self::check_auth(&state)?;
        if state.failing_projects {
            return Err(outage("projects"));
        }
        Ok(state.projects.clone())
    }
}

#[async_trait]
impl NotebookService for InMemoryCloud {
    async fn list_locations(&self, project: &str) -> GcpResult<Vec<LocationId>> {
        let state = self.lock();
        Self::check_auth(&state)?;
        if state.failing_locations.contains(project) {
            return Err(outage(&format!("projects/{project}/locations")));
        }
        Ok(state.locations.get(project).cloned().unwrap_or_default())
    }

    async fn list_instances(&self, project: &str, location: &str) -> GcpResult<Vec<Instance>> {
        let state = self.lock();
        Self::check_auth(&state)?;
        let key = (project.to_string(), location.to_string());
        if state.failing_instances.contains(&key) {
            return Err(outage(&format!("projects/{project}/locations/{location}/instances")));
        }
        Ok(state.instances.get(&key).cloned().unwrap_or_default())
    }

    async fn stop_instance(&self, name: &str) -> GcpResult<OperationResult> {
        let mut state = self.lock();
        Self::check_auth(&state)?;
        state.stop_calls.push(name.to_string());
        let call = state.stop_calls.len();

        if state.failing_stops.contains(name) {
            return Err(GcpError::Operation {
                name: format!("operations/stop-{call}"),
                message: "simulated stop failure".to_string(),
            });
        }

        let instance = state
            .instances
            .values_mut()
            .flatten()
            .find(|i| i.name == name)
            .ok_or_else(|| GcpError::Status {
                url: format!("memory://{name}:stop"),
                status: 404,
                body: "instance not found".to_string(),
            })?;
        instance.state = InstanceStatus::Stopped;

        Ok(OperationResult {
            operation: format!("operations/stop-{call}"),
            response: serde_json::to_value(&*instance).unwrap_or_default(),
        })
    }
}
