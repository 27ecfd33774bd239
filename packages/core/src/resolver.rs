//! Variable resolver. Expands `${NAME}` occurrences inside every string leaf
//! of every raw step, using a layered env lookup. Does not mutate its
//! arguments: every substitution happens on a deep clone.

use std::collections::HashMap;

use enbu_flow_types::brand::VARIABLE_NAME_PATTERN;
use enbu_flow_types::error::FlowError;
use serde_yaml::Value;

/// The three env layers consulted for `${NAME}`, highest precedence first:
/// process env, then a supplied dotenv map, then the flow's own env
/// document.
pub struct EnvLayers<'a> {
    pub process_env: &'a HashMap<String, String>,
    pub dotenv: &'a HashMap<String, String>,
    pub flow_env: &'a HashMap<String, String>,
}

impl<'a> EnvLayers<'a> {
    fn lookup(&self, name: &str) -> Option<&'a str> {
        self.process_env
            .get(name)
            .or_else(|| self.dotenv.get(name))
            .or_else(|| self.flow_env.get(name))
            .map(String::as_str)
    }
}

/// Maps a top-level command key to the field label used in an error
/// location when that command's payload is a bare scalar rather than a
/// mapping (e.g. `open: ${MISSING}` has no `url` key yet — the validator
/// hasn't run — but the location the caller sees names the field the
/// scalar will become). Commands whose shorthand scalar is ambiguous or
/// nonexistent fall back to the command name itself.
fn scalar_field_label(command: &str) -> &'static str {
    match command {
        "open" => "url",
        "click" | "dblclick" | "hover" | "focus" | "check" | "uncheck" => "selector",
        "assertVisible" | "assertNotVisible" | "assertEnabled" | "assertChecked" => "selector",
        "scrollIntoView" => "selector",
        "press" | "keydown" | "keyup" => "key",
        "wait" => "ms",
        "screenshot" => "path",
        "eval" => "expression",
        other => other,
    }
}

/// Resolves every `${NAME}` occurrence across `steps`, returning a new,
/// fully substituted list (the input is left untouched).
pub fn resolve_steps(steps: &[Value], env: &EnvLayers<'_>) -> Result<Vec<Value>, FlowError> {
    tracing::debug!(step_count = steps.len(), "resolving variables across steps");
    steps
        .iter()
        .enumerate()
        .map(|(index, step)| resolve_step(index, step, env))
        .collect()
}

fn resolve_step(index: usize, step: &Value, env: &EnvLayers<'_>) -> Result<Value, FlowError> {
    let base_location = format!("step[{}]", index);
    // A step is conventionally a single-key mapping; when it is (the
    // common, well-formed case) the location for a bare scalar payload
    // uses the command's friendly field label rather than the raw key.
    if let Value::Mapping(mapping) = step {
        if mapping.len() == 1 {
            let (key, value) = mapping.iter().next().expect("len == 1");
            let command = key.as_str().unwrap_or("");
            let resolved_value = if matches!(value, Value::Mapping(_) | Value::Sequence(_)) {
                resolve_value(value, &base_location, env)?
            } else {
                resolve_value(
                    value,
                    &format!("{}.{}", base_location, scalar_field_label(command)),
                    env,
                )?
            };
            let mut out = serde_yaml::Mapping::new();
            out.insert(key.clone(), resolved_value);
            return Ok(Value::Mapping(out));
        }
    }
    resolve_value(step, &base_location, env)
}

fn resolve_value(value: &Value, location: &str, env: &EnvLayers<'_>) -> Result<Value, FlowError> {
    match value {
        Value::String(s) => Ok(Value::String(substitute(s, location, env)?)),
        Value::Mapping(mapping) => {
            let mut out = serde_yaml::Mapping::new();
            for (key, value) in mapping {
                let key_name = key.as_str().unwrap_or_default();
                let nested_location = format!("{}.{}", location, key_name);
                out.insert(key.clone(), resolve_value(value, &nested_location, env)?);
            }
            Ok(Value::Mapping(out))
        }
        Value::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let nested_location = format!("{}[{}]", location, i);
                out.push(resolve_value(item, &nested_location, env)?);
            }
            Ok(Value::Sequence(out))
        }
        // Non-string, non-object leaves pass through unchanged.
        other => Ok(other.clone()),
    }
}

/// Replaces every `${NAME}` in `text`, failing on the first unresolved
/// name.
fn substitute(text: &str, location: &str, env: &EnvLayers<'_>) -> Result<String, FlowError> {
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            if let Some(end) = text[i + 2..].find('}') {
                let name = &text[i + 2..i + 2 + end];
                if VARIABLE_NAME_PATTERN.is_match(name) {
                    let value = env.lookup(name).ok_or_else(|| {
                        tracing::warn!(variable_name = name, location, "undefined variable referenced");
                        FlowError::UndefinedVariable {
                            variable_name: name.to_string(),
                            location: location.to_string(),
                        }
                    })?;
                    out.push_str(value);
                    i += 2 + end + 1;
                    continue;
                }
            }
        }
        // Not a recognised `${NAME}` reference: copy one char verbatim.
        let ch = text[i..].chars().next().expect("i < len");
        out.push(ch);
        i += ch.len_utf8();
    }
    Ok(out)
}
