//! Long-running operations.
//!
//! `instances.stop` answers with an operation handle rather than the
//! stopped instance. The poller re-reads the handle until `done`, so
//! callers only ever see the final result.

use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use reaper_core::OperationResult;

use crate::api::GoogleApi;
use crate::error::{GcpError, GcpResult};

/// A `google.longrunning.Operation`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<OperationError>,
    #[serde(default)]
    pub response: Option<Value>,
}

/// The `google.rpc.Status` attached to a failed operation.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

impl Operation {
    /// Convert a finished operation into its result.
    pub fn into_result(self) -> GcpResult<OperationResult> {
        if let Some(err) = self.error {
            return Err(GcpError::Operation {
                name: self.name,
                message: format!("code {}: {}", err.code, err.message),
            });
        }
        Ok(OperationResult {
            operation: self.name,
            response: self.response.unwrap_or(Value::Null),
        })
    }
}

/// Polls operations on one API host until they finish or time out.
#[derive(Clone)]
pub struct OperationPoller {
    api: GoogleApi,
    base: String,
    interval: Duration,
    timeout: Duration,
}

impl OperationPoller {
    /// `base` is the versioned API root, e.g. `https://notebooks.googleapis.com/v1`.
    pub fn new(api: GoogleApi, base: impl Into<String>, interval: Duration, timeout: Duration) -> Self {
        Self {
            api,
            base: base.into(),
            interval,
            timeout,
        }
    }

    /// Block until `op` is done and return its final result.
    pub async fn wait(&self, mut op: Operation) -> GcpResult<OperationResult> {
        let started = Instant::now();

        loop {
            if op.done {
                return op.into_result();
            }
            if op.name.is_empty() {
                return Err(GcpError::decode(&self.base, "pending operation has no name"));
            }
            let waited = started.elapsed();
            if waited >= self.timeout {
                return Err(GcpError::Timeout {
                    name: op.name,
                    waited,
                });
            }

            tokio::time::sleep(self.interval).await;
            debug!(operation = %op.name, "polling operation");
            let url = format!("{}/{}", self.base, op.name);
            op = self.api.get(&url, &[]).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_operation_yields_response() {
        let op: Operation = serde_json::from_str(
            r#"{"name": "projects/p/locations/l/operations/op-1", "done": true,
                "response": {"name": "projects/p/locations/l/instances/nb", "state": "STOPPED"}}"#,
        )
        .unwrap();
        let result = op.into_result().unwrap();
        assert_eq!(result.operation, "projects/p/locations/l/operations/op-1");
        assert_eq!(result.response["state"], "STOPPED");
    }

    #[test]
    fn failed_operation_is_an_error() {
        let op: Operation = serde_json::from_str(
            r#"{"name": "op-2", "done": true, "error": {"code": 9, "message": "instance is busy"}}"#,
        )
        .unwrap();
        let err = op.into_result().unwrap_err();
        assert!(err.to_string().contains("instance is busy"));
    }

    #[test]
    fn done_without_response_is_null() {
        let op: Operation = serde_json::from_str(r#"{"name": "op-3", "done": true}"#).unwrap();
        assert_eq!(op.into_result().unwrap().response, Value::Null);
    }
}
