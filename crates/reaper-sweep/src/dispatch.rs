//! Stop dispatcher.

use tracing::{error, info};

use reaper_core::{Instance, StopOutcome};
use reaper_gcp::NotebookService;

use crate::error::SweepError;

/// Stop `instance` and wait for the stop to complete.
///
/// A failed stop becomes `StopOutcome::Failed` so the sweep can carry
/// on; only an authentication failure is returned as an error.
pub async fn stop(notebooks: &dyn NotebookService, instance: &Instance) -> Result<StopOutcome, SweepError> {
    info!(instance = %instance.name, "stopping idle instance");

    match notebooks.stop_instance(&instance.name).await {
        Ok(result) => {
            info!(instance = %instance.name, operation = %result.operation, "instance stopped");
            Ok(result.into())
        }
        Err(e) if e.is_auth() => Err(SweepError::Auth(e)),
        Err(e) => {
            error!(instance = %instance.name, error = %e, "stop failed");
            Ok(StopOutcome::Failed { error: e.to_string() })
        }
    }
}
