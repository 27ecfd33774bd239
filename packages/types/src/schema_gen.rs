//! Generates JSON Schema documents for the authoring-facing command model,
//! for editors and external tooling that want to validate or autocomplete
//! flow YAML without depending on this crate directly.

use std::fs::{create_dir_all, write};
use std::path::{Path, PathBuf};

use schemars::{schema_for, JsonSchema};
use serde::Serialize;

use crate::command::Command;

fn save_schema<T: Serialize>(schema: &T, path: &Path) -> std::io::Result<()> {
    let schema_str = serde_json::to_string_pretty(schema)?;
    write(path, schema_str)
}

fn generate_and_save_schema<T: JsonSchema>(base_path: &Path, relative: &str) -> std::io::Result<()> {
    let schema = schema_for!(T);
    let full_path = base_path.join(relative);
    if let Some(parent) = full_path.parent() {
        create_dir_all(parent)?;
    }
    save_schema(&schema, &full_path)
}

/// Writes `command.json`, the schema for a single validated [`Command`],
/// under `base_path`.
pub fn generate_schema(base_path: PathBuf) -> std::io::Result<()> {
    generate_and_save_schema::<Command>(&base_path, "command.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_schema_describes_the_command_enum() {
        let dir = tempfile::tempdir().unwrap();
        generate_schema(dir.path().to_path_buf()).unwrap();
        let contents = std::fs::read_to_string(dir.path().join("command.json")).unwrap();
        assert!(contents.contains("kind"));
    }
}
