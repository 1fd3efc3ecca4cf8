//! Domain types for the sweep.
//!
//! These mirror the subset of the Cloud Resource Manager v3 and
//! Notebooks v1 resources the reaper reads. Field names follow the
//! APIs' camelCase JSON so the same types decode live responses.
//! Nothing here is persisted between invocations.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Identifier of a cloud project (e.g. `my-project`).
pub type ProjectId = String;

/// Identifier of a location within a project (e.g. `us-central1-a`).
pub type LocationId = String;

/// Fully-qualified instance name:
/// `projects/{project}/locations/{location}/instances/{id}`.
pub type InstanceName = String;

// ── Project ───────────────────────────────────────────────────────

/// A project returned by `projects:search`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub project_id: ProjectId,
    #[serde(default)]
    pub state: ProjectState,
}

/// Lifecycle state of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectState {
    #[default]
    StateUnspecified,
    Active,
    DeleteRequested,
    #[serde(other)]
    Unknown,
}

// ── Location ──────────────────────────────────────────────────────

/// A location the notebooks service supports for a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub location_id: LocationId,
    #[serde(default)]
    pub name: Option<String>,
}

// ── Instance ──────────────────────────────────────────────────────

/// A managed notebook instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub name: InstanceName,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: InstanceStatus,
    /// Owner-controlled labels; the idle threshold lives here.
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: HashMap<String, String>,
    /// RFC 3339 timestamp of the last update, as reported by the API.
    #[serde(default)]
    pub update_time: Option<String>,
}

impl Instance {
    /// The trailing instance id of the fully-qualified name.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Read an explicit JSON `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Lifecycle state of a notebook instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceStatus {
    #[default]
    StateUnspecified,
    Starting,
    Provisioning,
    Active,
    Stopping,
    Stopped,
    Deleted,
    Upgrading,
    Initializing,
    Registering,
    Suspending,
    Suspended,
    #[serde(other)]
    Unknown,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StateUnspecified => "STATE_UNSPECIFIED",
            Self::Starting => "STARTING",
            Self::Provisioning => "PROVISIONING",
            Self::Active => "ACTIVE",
            Self::Stopping => "STOPPING",
            Self::Stopped => "STOPPED",
            Self::Deleted => "DELETED",
            Self::Upgrading => "UPGRADING",
            Self::Initializing => "INITIALIZING",
            Self::Registering => "REGISTERING",
            Self::Suspending => "SUSPENDING",
            Self::Suspended => "SUSPENDED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Stop outcomes ─────────────────────────────────────────────────

/// Final state of a completed stop operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationResult {
    /// Long-running operation name (`projects/.../operations/...`).
    pub operation: String,
    /// The operation's `response` document, or `null` if it carried none.
    pub response: serde_json::Value,
}

/// What happened to an instance the policy selected for stopping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StopOutcome {
    Stopped {
        operation: String,
        response: serde_json::Value,
    },
    Failed {
        error: String,
    },
}

impl StopOutcome {
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped { .. })
    }
}

impl From<OperationResult> for StopOutcome {
    fn from(result: OperationResult) -> Self {
        Self::Stopped {
            operation: result.operation,
            response: result.response,
        }
    }
}

/// Per-invocation result: instance name → stop outcome.
///
/// Only instances a stop was dispatched for appear here.
pub type SweepResult = BTreeMap<InstanceName, StopOutcome>;
