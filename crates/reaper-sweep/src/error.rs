//! Error types for a sweep.

use thiserror::Error;

use reaper_gcp::GcpError;

/// Failures that abort a whole sweep.
#[derive(Debug, Error)]
pub enum SweepError {
    /// Credentials were rejected or could not be obtained.
    #[error("sweep aborted: {0}")]
    Auth(#[source] GcpError),

    #[error("failed to set up cloud clients: {0}")]
    Setup(#[source] GcpError),
}
