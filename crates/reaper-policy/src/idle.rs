//! Idle policy evaluator.
//!
//! Decides, for one instance and one reference instant, whether the
//! instance's own auto-shutdown threshold has been crossed.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use reaper_core::{Instance, InstanceStatus, ReaperConfig};

use crate::timestamp::{elapsed_seconds, parse_update_time};

/// Outcome of evaluating a single instance.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The instance has been idle at least as long as its threshold.
    Stop {
        idle_seconds: f64,
        threshold_seconds: u64,
    },
    /// Leave the instance alone.
    Skip(SkipReason),
}

impl Decision {
    pub fn is_stop(&self) -> bool {
        matches!(self, Self::Stop { .. })
    }
}

/// Why an instance was left running.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// No threshold under the metadata key, or not a non-negative integer.
    NotOptedIn,
    /// Only ACTIVE instances are stopped.
    NotActive(InstanceStatus),
    /// `updateTime` missing or unparseable.
    InvalidUpdateTime,
    /// `updateTime` lies in the future relative to now.
    ClockSkew { idle_seconds: f64 },
    BelowThreshold {
        idle_seconds: f64,
        threshold_seconds: u64,
    },
}

/// The idle-shutdown rule, keyed on a configurable metadata entry.
#[derive(Debug, Clone)]
pub struct IdlePolicy {
    metadata_key: String,
}

impl IdlePolicy {
    pub fn new(metadata_key: impl Into<String>) -> Self {
        Self {
            metadata_key: metadata_key.into(),
        }
    }

    pub fn from_config(config: &ReaperConfig) -> Self {
        Self::new(config.shutdown_seconds_metadata_key.clone())
    }

    pub fn metadata_key(&self) -> &str {
        &self.metadata_key
    }

    /// The instance's idle threshold in seconds, if it opted in.
    pub fn threshold(&self, instance: &Instance) -> Option<u64> {
        instance
            .metadata
            .get(&self.metadata_key)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
    }

    /// Evaluate one instance against `now`.
    pub fn decide(&self, instance: &Instance, now: DateTime<Utc>) -> Decision {
        let Some(threshold_seconds) = self.threshold(instance) else {
            debug!(
                instance = %instance.name,
                key = %self.metadata_key,
                "threshold metadata not set, skipping"
            );
            return Decision::Skip(SkipReason::NotOptedIn);
        };

        if instance.state != InstanceStatus::Active {
            debug!(
                instance = %instance.name,
                state = %instance.state,
                "instance not ACTIVE, skipping"
            );
            return Decision::Skip(SkipReason::NotActive(instance.state));
        }

        let updated_at = match instance.update_time.as_deref().map(parse_update_time) {
            Some(Ok(ts)) => ts,
            Some(Err(e)) => {
                warn!(instance = %instance.name, error = %e, "unparseable updateTime, skipping");
                return Decision::Skip(SkipReason::InvalidUpdateTime);
            }
            None => {
                warn!(instance = %instance.name, "instance has no updateTime, skipping");
                return Decision::Skip(SkipReason::InvalidUpdateTime);
            }
        };

        let idle_seconds = elapsed_seconds(updated_at, now);

        if idle_seconds < 0.0 {
            warn!(
                instance = %instance.name,
                idle_seconds,
                "updateTime is in the future, skipping"
            );
            return Decision::Skip(SkipReason::ClockSkew { idle_seconds });
        }

        if idle_seconds < threshold_seconds as f64 {
            debug!(
                instance = %instance.name,
                idle_seconds,
                threshold_seconds,
                "shutdown threshold not reached"
            );
            return Decision::Skip(SkipReason::BelowThreshold {
                idle_seconds,
                threshold_seconds,
            });
        }

        debug!(
            instance = %instance.name,
            idle_seconds,
            threshold_seconds,
            "shutdown threshold reached"
        );
        Decision::Stop {
            idle_seconds,
            threshold_seconds,
        }
    }
}
