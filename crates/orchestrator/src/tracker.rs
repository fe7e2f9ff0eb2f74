//! Translates workflow step snapshots into phase transitions.

use std::collections::HashMap;

use github::{RemoteStep, StepConclusion, StepStatus};

use crate::phases::{is_last_step, step_spec, Phase, StepSpec};

/// How far one job of the run has been handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobProgress {
    /// Highest step number already handled as completed.
    pub last_step_number: u64,
    /// Step last announced as running, so repeated polls stay quiet.
    pub running_step: Option<u64>,
}

/// Progress through one run's step list, threaded through the polling loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollState {
    /// Keyed by job id; step numbers restart in every job.
    pub jobs: HashMap<u64, JobProgress>,
    /// Set once any mapped step fails; freezes every later transition.
    pub failed: bool,
}

/// What a step transition means for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Running(&'static StepSpec),
    Succeeded(&'static StepSpec),
    /// The phase's last step succeeded.
    PhaseComplete(Phase),
    Failed(&'static StepSpec),
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest step number handled so far in `job_id`.
    pub fn last_step(&self, job_id: u64) -> u64 {
        self.jobs
            .get(&job_id)
            .map(|job| job.last_step_number)
            .unwrap_or(0)
    }

    /// Feed one snapshot of the run's steps and collect the outcomes it
    /// produces.
    ///
    /// Jobs are handled in the order they first appear, each in step-number
    /// order. Within a job, steps at or below its high-water mark were
    /// handled before and are ignored, and processing stops at the first
    /// step that has not completed, since a later step of the same job
    /// cannot have finished before it.
    pub fn advance(&mut self, steps: &[RemoteStep]) -> Vec<StepOutcome> {
        let mut job_order: Vec<u64> = Vec::new();
        for step in steps {
            if !job_order.contains(&step.job_id) {
                job_order.push(step.job_id);
            }
        }

        let mut outcomes = Vec::new();
        for job_id in job_order {
            let mut ordered: Vec<&RemoteStep> =
                steps.iter().filter(|step| step.job_id == job_id).collect();
            ordered.sort_by_key(|step| step.number);
            self.advance_job(job_id, &ordered, &mut outcomes);
        }
        outcomes
    }

    fn advance_job(&mut self, job_id: u64, steps: &[&RemoteStep], outcomes: &mut Vec<StepOutcome>) {
        let progress = self.jobs.entry(job_id).or_default();

        for step in steps {
            if step.number <= progress.last_step_number {
                continue;
            }
            let spec = step_spec(&step.name);

            if step.status != StepStatus::Completed {
                if step.status == StepStatus::InProgress
                    && progress.running_step != Some(step.number)
                {
                    if let Some(spec) = spec.filter(|_| !self.failed) {
                        outcomes.push(StepOutcome::Running(spec));
                    }
                    progress.running_step = Some(step.number);
                }
                break;
            }

            progress.last_step_number = step.number;

            let Some(spec) = spec else {
                continue;
            };
            if self.failed {
                continue;
            }

            match step.conclusion {
                Some(StepConclusion::Success) => {
                    outcomes.push(StepOutcome::Succeeded(spec));
                    if is_last_step(spec) {
                        outcomes.push(StepOutcome::PhaseComplete(spec.phase));
                    }
                }
                Some(StepConclusion::Failure) => {
                    self.failed = true;
                    outcomes.push(StepOutcome::Failed(spec));
                }
                Some(StepConclusion::Other) | None => {}
            }
        }
    }
}
