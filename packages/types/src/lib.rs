//! Shared vocabulary for the enbu-flow engine: the error taxonomy, the
//! branded value newtypes, the selector model, and the command/flow data
//! model that every other crate in the workspace builds on.

pub mod brand;
pub mod command;
pub mod error;
pub mod flow;
pub mod schema_gen;
pub mod selector;

pub use command::Command;
pub use error::FlowError;
pub use flow::{Flow, FlowResult, ScreenshotResult, StepResult, StepStatus};
pub use selector::{AnySelector, InteractableSelector, Ref, ToCliSelector};
