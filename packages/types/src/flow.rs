//! The validated `Flow` and its execution results.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::error::FlowError;

/// An ordered, non-empty sequence of validated commands plus a name and
/// environment map. Immutable after validation: nothing in this crate
/// mutates a `Flow` once built.
#[derive(Debug, Clone, Serialize)]
pub struct Flow {
    name: String,
    env: HashMap<String, String>,
    steps: Vec<Command>,
}

impl Flow {
    /// Builds a `Flow`. Returns `InvalidFlowStructure` if `steps` is empty:
    /// the step list of a validated `Flow` is never empty.
    pub fn new(
        name: impl Into<String>,
        env: HashMap<String, String>,
        steps: Vec<Command>,
    ) -> Result<Self, FlowError> {
        if steps.is_empty() {
            return Err(FlowError::InvalidFlowStructure {
                message: "step list must not be empty".to_string(),
            });
        }
        Ok(Flow { name: name.into(), env, steps })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    pub fn steps(&self) -> &[Command] {
        &self.steps
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed,
}

/// The outcome of a best-effort error screenshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ScreenshotResult {
    Captured(String),
    Failed(String),
    Disabled,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub index: usize,
    #[serde(skip)]
    pub command: Command,
    pub status: StepStatus,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    pub stdout: Option<serde_json::Value>,
    pub error: Option<FlowError>,
    pub screenshot: Option<ScreenshotResult>,
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u128(d.as_millis())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowErrorSummary {
    pub step_index: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowResult {
    pub flow_name: String,
    pub status: StepStatus,
    pub steps: Vec<StepResult>,
    pub error: Option<FlowErrorSummary>,
    /// Surfaced only when the flow fails, to avoid leaking ephemeral
    /// session names on the success path.
    pub session_name: Option<String>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl FlowResult {
    /// Consistency check: `status == Passed` iff every executed step
    /// passed.
    pub fn is_consistent(&self) -> bool {
        let all_passed = self.steps.iter().all(|s| s.status == StepStatus::Passed);
        (self.status == StepStatus::Passed) == all_passed
    }
}
