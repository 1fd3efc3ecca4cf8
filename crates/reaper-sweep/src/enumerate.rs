//! Project, location and instance enumeration.
//!
//! Each enumerator turns a collaborator failure into an empty listing
//! for that scope, so one broken project or location never hides its
//! siblings. Authentication failures are the exception: they surface
//! as `SweepError::Auth`.

use tracing::{debug, warn};

use reaper_core::{Instance, LocationId, ProjectId};
use reaper_gcp::{GcpError, NotebookService, ProjectDirectory};
use reaper_policy::RegionFilter;

use crate::error::SweepError;

fn absorb<T>(result: Result<Vec<T>, GcpError>, on_error: impl FnOnce(&GcpError)) -> Result<Vec<T>, SweepError> {
    match result {
        Ok(items) => Ok(items),
        Err(e) if e.is_auth() => Err(SweepError::Auth(e)),
        Err(e) => {
            on_error(&e);
            Ok(Vec::new())
        }
    }
}

/// ACTIVE projects visible to the sweep.
pub async fn active_projects(directory: &dyn ProjectDirectory) -> Result<Vec<ProjectId>, SweepError> {
    absorb(directory.search_active_projects().await, |e| {
        warn!(error = %e, "project search failed, nothing to sweep");
    })
}

/// Locations of `project` that pass the region allow-list.
pub async fn locations_in_scope(
    notebooks: &dyn NotebookService,
    regions: &RegionFilter,
    project: &str,
) -> Result<Vec<LocationId>, SweepError> {
    let locations = absorb(notebooks.list_locations(project).await, |e| {
        warn!(%project, error = %e, "listing locations failed, skipping project");
    })?;

    Ok(locations
        .into_iter()
        .filter(|location| {
            let keep = regions.in_scope(location);
            if !keep {
                debug!(%project, %location, "location outside region allow-list");
            }
            keep
        })
        .collect())
}

/// Notebook instances of `project` at `location`.
pub async fn instances(
    notebooks: &dyn NotebookService,
    project: &str,
    location: &str,
) -> Result<Vec<Instance>, SweepError> {
    absorb(notebooks.list_instances(project, location).await, |e| {
        warn!(%project, %location, error = %e, "listing instances failed, skipping location");
    })
}
