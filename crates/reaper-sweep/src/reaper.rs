//! Run orchestrator.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use reaper_core::{Clock, InstanceName, ReaperConfig, StopOutcome, SweepResult, SystemClock};
use reaper_gcp::{GoogleCloud, NotebookService, ProjectDirectory};
use reaper_policy::{Decision, IdlePolicy, RegionFilter};

use crate::dispatch;
use crate::enumerate;
use crate::error::SweepError;

/// Counters for one sweep, logged when it finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub projects: usize,
    /// Locations that passed the region filter.
    pub locations: usize,
    pub instances: usize,
    pub stopped: usize,
    pub stop_failures: usize,
}

/// Everything a sweep produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    pub results: SweepResult,
    pub summary: SweepSummary,
}

impl SweepReport {
    fn record(&mut self, name: InstanceName, outcome: StopOutcome) {
        if outcome.is_stopped() {
            self.summary.stopped += 1;
        } else {
            self.summary.stop_failures += 1;
        }
        self.results.insert(name, outcome);
    }
}

/// Stops notebook instances whose idle threshold has passed.
pub struct Reaper {
    projects: Arc<dyn ProjectDirectory>,
    notebooks: Arc<dyn NotebookService>,
    policy: IdlePolicy,
    regions: RegionFilter,
    clock: Arc<dyn Clock>,
}

impl Reaper {
    /// Create a reaper over the given collaborators, reading wall-clock time.
    pub fn new(
        projects: Arc<dyn ProjectDirectory>,
        notebooks: Arc<dyn NotebookService>,
        policy: IdlePolicy,
        regions: RegionFilter,
    ) -> Self {
        Self {
            projects,
            notebooks,
            policy,
            regions,
            clock: Arc::new(SystemClock),
        }
    }

    /// Create a reaper against the live Google APIs.
    pub fn from_config(config: &ReaperConfig) -> Result<Self, SweepError> {
        let cloud = GoogleCloud::from_config(config).map_err(SweepError::Setup)?;
        Ok(Self::new(
            cloud.projects,
            cloud.notebooks,
            IdlePolicy::from_config(config),
            RegionFilter::from_config(config),
        ))
    }

    /// Replace the time source (for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run one sweep and return only the per-instance results.
    pub async fn sweep(&self) -> Result<SweepResult, SweepError> {
        self.run().await.map(|report| report.results)
    }

    /// Run one sweep over every in-scope project, location and instance.
    pub async fn run(&self) -> Result<SweepReport, SweepError> {
        let mut report = SweepReport::default();

        let projects = enumerate::active_projects(self.projects.as_ref()).await?;
        info!(projects = projects.len(), "sweep started");

        for project in &projects {
            report.summary.projects += 1;
            let now = self.clock.now();

            let locations =
                enumerate::locations_in_scope(self.notebooks.as_ref(), &self.regions, project).await?;

            for location in &locations {
                report.summary.locations += 1;
                let instances =
                    enumerate::instances(self.notebooks.as_ref(), project, location).await?;

                for instance in &instances {
                    report.summary.instances += 1;

                    if let Decision::Stop {
                        idle_seconds,
                        threshold_seconds,
                    } = self.policy.decide(instance, now)
                    {
                        info!(
                            instance = %instance.name,
                            idle_seconds,
                            threshold_seconds,
                            "idle threshold exceeded"
                        );
                        let outcome = dispatch::stop(self.notebooks.as_ref(), instance).await?;
                        report.record(instance.name.clone(), outcome);
                    }
                }
            }
        }

        let summary = report.summary;
        info!(
            projects = summary.projects,
            locations = summary.locations,
            instances = summary.instances,
            stopped = summary.stopped,
            stop_failures = summary.stop_failures,
            "sweep finished"
        );
        Ok(report)
    }
}
