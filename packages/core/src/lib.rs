//! YAML loading, variable resolution, and command validation for
//! enbu-flow: the pipeline that turns raw YAML text into a fully typed,
//! validated `Flow`.

pub mod loader;
pub mod resolver;
pub mod validator;

use std::collections::HashMap;
use std::path::Path;

use enbu_flow_types::error::FlowError;
use enbu_flow_types::flow::Flow;

pub use loader::{load_yaml, RawFlow};
pub use resolver::{resolve_steps, EnvLayers};
pub use validator::validate_steps;

/// Runs the full load -> resolve -> validate pipeline against `text`,
/// producing a validated `Flow` named after `flow_name`. `dotenv` is the
/// second-highest precedence env layer; process environment variables are
/// read live via `std::env::vars()`.
pub fn parse_flow(
    flow_name: impl Into<String>,
    text: &str,
    dotenv: &HashMap<String, String>,
) -> Result<Flow, FlowError> {
    let raw = load_yaml(text)?;
    let process_env: HashMap<String, String> = std::env::vars().collect();
    let layers = EnvLayers { process_env: &process_env, dotenv, flow_env: &raw.env };
    let resolved_steps = resolve_steps(&raw.steps, &layers)?;
    let commands = validate_steps(&resolved_steps)?;
    Flow::new(flow_name, raw.env, commands)
}

/// Loads a flow from a `.yaml`/`.yml` file on disk, deriving its name from
/// the file stem.
pub fn parse_flow_file(path: &Path, dotenv: &HashMap<String, String>) -> Result<Flow, FlowError> {
    let text = std::fs::read_to_string(path).map_err(|e| FlowError::FileReadError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let flow_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "flow".to_string());
    parse_flow(flow_name, &text, dotenv)
}
