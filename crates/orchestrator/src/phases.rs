//! Client-visible phases and the workflow steps that drive them.
//!
//! [`STEP_TABLE`] is the only place step names are spelled out. The workflow
//! generator emits exactly these names and the step tracker looks them up
//! again, so renaming a step here renames it on both sides.

use std::collections::HashSet;
use std::fmt;

use crate::error::{OrchestratorError, Result};

/// Phase id used for failures that escaped the pipeline itself.
pub const ERROR_PHASE: &str = "error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Github,
    Postman,
    Spec,
    Aws,
    PostmanEnv,
    Sync,
    Complete,
}

impl Phase {
    pub fn all() -> &'static [Phase] {
        &[
            Phase::Github,
            Phase::Postman,
            Phase::Spec,
            Phase::Aws,
            Phase::PostmanEnv,
            Phase::Sync,
            Phase::Complete,
        ]
    }

    /// Phases that are reported by workflow steps, in workflow order.
    pub fn workflow_phases() -> &'static [Phase] {
        &[
            Phase::Postman,
            Phase::Spec,
            Phase::Aws,
            Phase::PostmanEnv,
            Phase::Sync,
        ]
    }

    /// Wire id carried in `ProgressEvent::phase`.
    pub fn id(&self) -> &'static str {
        match self {
            Phase::Github => "github",
            Phase::Postman => "postman",
            Phase::Spec => "spec",
            Phase::Aws => "aws",
            Phase::PostmanEnv => "postman-env",
            Phase::Sync => "sync",
            Phase::Complete => "complete",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Github => "GitHub repository",
            Phase::Postman => "Postman workspace",
            Phase::Spec => "API spec",
            Phase::Aws => "AWS deployment",
            Phase::PostmanEnv => "Postman environments",
            Phase::Sync => "Repository sync",
            Phase::Complete => "Provisioning",
        }
    }

    /// The step whose success completes this phase.
    pub fn last_step(&self) -> Option<&'static str> {
        match self {
            Phase::Postman => Some("Invite Requester to Workspace"),
            Phase::Spec => Some("Store Postman UIDs"),
            Phase::Aws => Some("Health Check"),
            Phase::PostmanEnv => Some("Store Environment UIDs"),
            Phase::Sync => Some("Commit Artifacts"),
            Phase::Github | Phase::Complete => None,
        }
    }

    /// Mapped steps of this phase, in workflow order.
    pub fn steps(&self) -> impl Iterator<Item = &'static StepSpec> {
        let phase = *self;
        STEP_TABLE.iter().filter(move |spec| spec.phase == phase)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// One workflow step the pipeline reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSpec {
    pub name: &'static str,
    pub phase: Phase,
    /// Message of the `running` event while the step executes.
    pub description: &'static str,
}

const fn step(name: &'static str, phase: Phase, description: &'static str) -> StepSpec {
    StepSpec {
        name,
        phase,
        description,
    }
}

pub static STEP_TABLE: &[StepSpec] = &[
    step("Install Postman CLI", Phase::Postman, "Installing Postman CLI"),
    step("Create Postman Workspace", Phase::Postman, "Creating Postman workspace"),
    step(
        "Assign Workspace to Governance Group",
        Phase::Postman,
        "Assigning workspace to governance group",
    ),
    step(
        "Invite Requester to Workspace",
        Phase::Postman,
        "Inviting requester to workspace",
    ),
    step("Upload Spec to Spec Hub", Phase::Spec, "Uploading OpenAPI spec to Spec Hub"),
    step("Lint Spec via Postman CLI", Phase::Spec, "Linting spec against governance rules"),
    step(
        "Generate Collections from Spec",
        Phase::Spec,
        "Generating baseline, smoke and contract collections",
    ),
    step("Inject Test Scripts", Phase::Spec, "Injecting test scripts into collections"),
    step("Store Postman UIDs", Phase::Spec, "Storing Postman resource IDs"),
    step("Configure AWS Credentials", Phase::Aws, "Configuring AWS credentials"),
    step("Package Lambda Functions", Phase::Aws, "Packaging Lambda functions"),
    step("Deploy Lambda Functions", Phase::Aws, "Deploying Lambda functions"),
    step("Create API Gateways", Phase::Aws, "Creating API gateways"),
    step("Health Check", Phase::Aws, "Running deployment health checks"),
    step(
        "Create Postman Environments",
        Phase::PostmanEnv,
        "Creating Postman environments",
    ),
    step("Create Mock Server", Phase::PostmanEnv, "Creating mock server"),
    step("Store Environment UIDs", Phase::PostmanEnv, "Storing environment IDs"),
    step(
        "Export Postman Artifacts to Repo",
        Phase::Sync,
        "Exporting Postman artifacts",
    ),
    step(
        "Connect Workspace to Repository",
        Phase::Sync,
        "Connecting workspace to repository",
    ),
    step("Commit Artifacts", Phase::Sync, "Committing artifacts to repository"),
];

/// Look up a workflow step by its exact name.
pub fn step_spec(name: &str) -> Option<&'static StepSpec> {
    STEP_TABLE.iter().find(|spec| spec.name == name)
}

pub fn is_last_step(spec: &StepSpec) -> bool {
    spec.phase.last_step() == Some(spec.name)
}

/// Checks that step names are unique and every phase's last step is one of
/// its own mapped steps.
pub fn validate_table() -> Result<()> {
    validate(STEP_TABLE)
}

fn validate(table: &[StepSpec]) -> Result<()> {
    let mut seen = HashSet::new();
    for spec in table {
        if !seen.insert(spec.name) {
            return Err(OrchestratorError::phase_table(format!(
                "step '{}' is listed twice",
                spec.name
            )));
        }
    }

    for phase in Phase::workflow_phases() {
        let Some(last) = phase.last_step() else {
            return Err(OrchestratorError::phase_table(format!(
                "phase '{}' has no last step",
                phase
            )));
        };
        let owned = table
            .iter()
            .any(|spec| spec.name == last && spec.phase == *phase);
        if !owned {
            return Err(OrchestratorError::phase_table(format!(
                "last step '{}' of phase '{}' is not one of its steps",
                last, phase
            )));
        }
    }

    Ok(())
}
