//! YAML loader. Parses multi-document YAML into an untyped env map and an
//! untyped step list, without yet enforcing per-step shape.

use std::collections::HashMap;

use enbu_flow_types::error::FlowError;
use serde_yaml::Value;

/// The untyped result of the first parse pass: an optional env map (all
/// string keys and values) and a list of raw step values.
#[derive(Debug, Clone, Default)]
pub struct RawFlow {
    pub env: HashMap<String, String>,
    pub steps: Vec<Value>,
}

/// Parses `text` as one-or-more YAML documents.
///
/// - A single document is treated as the step list directly.
/// - Two or more documents: the first is the env map, the last is the
///   step list. Any documents in between are ignored.
pub fn load_yaml(text: &str) -> Result<RawFlow, FlowError> {
    let documents = split_documents(text)?;

    let (env_doc, steps_doc) = match documents.len() {
        0 => {
            return Err(FlowError::InvalidFlowStructure {
                message: "no YAML documents found".to_string(),
            });
        }
        1 => (None, &documents[0]),
        n => (Some(&documents[0]), &documents[n - 1]),
    };

    let env = match env_doc {
        Some(doc) => parse_env_document(doc)?,
        None => HashMap::new(),
    };

    let steps = parse_step_document(steps_doc)?;

    if steps.is_empty() {
        return Err(FlowError::InvalidFlowStructure {
            message: "step list must not be empty".to_string(),
        });
    }

    tracing::debug!(env_vars = env.len(), steps = steps.len(), "parsed flow document");
    Ok(RawFlow { env, steps })
}

fn split_documents(text: &str) -> Result<Vec<Value>, FlowError> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(document).map_err(|e| yaml_syntax_error(&e))?;
        // Blank documents (e.g. a trailing `---` with nothing after it)
        // deserialize to `Value::Null`; they carry no information and are
        // dropped rather than counted as an (ignored) middle document.
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}

fn yaml_syntax_error(e: &serde_yaml::Error) -> FlowError {
    let location = e.location();
    FlowError::YamlSyntax {
        message: e.to_string(),
        line: location.as_ref().map(|l| l.line()).unwrap_or(0),
        column: location.as_ref().map(|l| l.column()).unwrap_or(0),
    }
}

fn parse_env_document(doc: &Value) -> Result<HashMap<String, String>, FlowError> {
    let mapping = doc.as_mapping().ok_or_else(|| FlowError::InvalidFlowStructure {
        message: "env document must be a mapping of string keys to string values".to_string(),
    })?;

    // The conventional authoring form wraps variables under a top-level
    // `env:` key (`env:\n  NAME: value`); unwrap it when present so callers
    // write the same shape whether the env document stands alone or
    // precedes the step document. A document with no `env` key is taken
    // to be the flat variable map directly.
    let mapping = match mapping.get(Value::String("env".to_string())) {
        Some(Value::Mapping(inner)) => inner,
        Some(_) => {
            return Err(FlowError::InvalidFlowStructure {
                message: "'env' key must map to a mapping of string keys to string values"
                    .to_string(),
            });
        }
        None => mapping,
    };

    let mut env = HashMap::new();
    for (key, value) in mapping {
        let key = key.as_str().ok_or_else(|| FlowError::InvalidFlowStructure {
            message: "env keys must be strings".to_string(),
        })?;
        let value = value_to_string(value).ok_or_else(|| FlowError::InvalidFlowStructure {
            message: format!("env value for {} must be a scalar", key),
        })?;
        // Last-writer-wins for duplicate keys.
        env.insert(key.to_string(), value);
    }
    Ok(env)
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_step_document(doc: &Value) -> Result<Vec<Value>, FlowError> {
    match doc {
        Value::Sequence(items) => Ok(items.clone()),
        other => Err(FlowError::InvalidFlowStructure {
            message: format!("step document must be a sequence, got {:?}", variant_name(other)),
        }),
    }
}

fn variant_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}

use serde::Deserialize;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_document_is_the_step_list() {
        let raw = load_yaml(
            r#"
- open: https://example.com
- click: Login
"#,
        )
        .unwrap();
        assert!(raw.env.is_empty());
        assert_eq!(raw.steps.len(), 2);
    }

    #[test]
    fn two_documents_split_env_and_steps() {
        let raw = load_yaml(
            r#"
env:
  BASE: https://a.example
---
- open: ${BASE}
"#,
        )
        .unwrap();
        assert_eq!(raw.env.get("BASE").map(String::as_str), Some("https://a.example"));
        assert_eq!(raw.steps.len(), 1);
    }

    #[test]
    fn empty_step_list_is_invalid_flow_structure() {
        let err = load_yaml("[]").unwrap_err();
        assert!(matches!(err, FlowError::InvalidFlowStructure { .. }));
    }

    #[test]
    fn malformed_yaml_is_a_syntax_error() {
        let err = load_yaml("- open: [unterminated").unwrap_err();
        assert!(matches!(err, FlowError::YamlSyntax { .. }));
    }

    #[test]
    fn middle_documents_are_ignored() {
        let raw = load_yaml(
            r#"
env:
  BASE: https://a.example
---
ignored: true
---
- open: ${BASE}
"#,
        )
        .unwrap();
        assert_eq!(raw.steps.len(), 1);
    }
}
