use std::fmt;

use schemars::JsonSchema;
use serde::{Serialize, Serializer};

/// Location of a step-level error, e.g. `step[2].url`.
pub type ErrorLocation = String;

/// The complete error taxonomy for the engine. Every fallible
/// operation in every crate ultimately returns one of these variants, or
/// converts its own local error type into one at the crate boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum FlowError {
    YamlSyntax { message: String, line: usize, column: usize },
    InvalidFlowStructure { message: String },
    InvalidCommand { step_index: usize, message: String, raw: String },
    UndefinedVariable { variable_name: String, location: ErrorLocation },
    BrandValidationError { kind: String, value: String, message: String },
    NotInstalled { binary: String },
    CommandFailed { exit_code: Option<i32>, stderr: String, args: Vec<String> },
    CommandExecutionFailed { message: String },
    AgentBrowserOutputParseError { raw_output: String },
    Timeout { args: Vec<String>, timeout_ms: u64 },
    AssertionFailed { message: String },
    FileReadError { path: String, message: String },
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowError::YamlSyntax { message, line, column } => {
                write!(f, "yaml syntax error at {}:{}: {}", line, column, message)
            }
            FlowError::InvalidFlowStructure { message } => {
                write!(f, "invalid flow structure: {}", message)
            }
            FlowError::InvalidCommand { step_index, message, raw } => {
                write!(f, "invalid command at step[{}]: {} (raw: {})", step_index, message, raw)
            }
            FlowError::UndefinedVariable { variable_name, location } => {
                write!(f, "undefined variable {} at {}", variable_name, location)
            }
            FlowError::BrandValidationError { kind, value, message } => {
                write!(f, "invalid {}: {:?}: {}", kind, value, message)
            }
            FlowError::NotInstalled { binary } => {
                write!(f, "browser CLI binary not found: {}", binary)
            }
            FlowError::CommandFailed { exit_code, stderr, args } => {
                write!(
                    f,
                    "browser CLI exited with {:?} (args: {:?}): {}",
                    exit_code, args, stderr
                )
            }
            FlowError::CommandExecutionFailed { message } => {
                write!(f, "browser CLI reported failure: {}", message)
            }
            FlowError::AgentBrowserOutputParseError { raw_output } => {
                write!(f, "could not parse browser CLI output: {}", raw_output)
            }
            FlowError::Timeout { args, timeout_ms } => {
                write!(f, "timed out after {}ms (args: {:?})", timeout_ms, args)
            }
            FlowError::AssertionFailed { message } => {
                write!(f, "assertion failed: {}", message)
            }
            FlowError::FileReadError { path, message } => {
                write!(f, "could not read {}: {}", path, message)
            }
        }
    }
}

impl std::error::Error for FlowError {}

/// `Unset | Set(T)` — distinguishes "value not supplied" from "value
/// supplied as the type's own default", per the design notes on symbolic
/// "use default" markers.
#[derive(Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
pub enum Maybe<T> {
    #[default]
    Unset,
    Set(T),
}

impl<T> Maybe<T> {
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Maybe::Unset => default,
            Maybe::Set(v) => v,
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Maybe::Set(_))
    }
}

impl<T: Serialize> Serialize for Maybe<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Maybe::Unset => serializer.serialize_none(),
            Maybe::Set(v) => v.serialize(serializer),
        }
    }
}
