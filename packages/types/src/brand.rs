//! Branded string newtypes. Each can only be constructed through its
//! `parse` constructor, which applies the relevant format predicate —
//! these strings are branded at validation time and cannot be constructed
//! outside the validator. Once built they are freely `Clone`-able and
//! comparable.

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::Serialize;

use crate::error::FlowError;

fn brand_error(kind: &str, value: &str, message: impl Into<String>) -> FlowError {
    FlowError::BrandValidationError {
        kind: kind.to_string(),
        value: value.to_string(),
        message: message.into(),
    }
}

/// An absolute, validated URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Url(String);

impl Url {
    pub fn parse(raw: &str) -> Result<Self, FlowError> {
        url::Url::parse(raw)
            .map_err(|e| brand_error("url", raw, e.to_string()))?;
        Ok(Url(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A filesystem path destined for an artifact (screenshot). Validation
/// only rejects the empty string; the adapter resolves it relative to the
/// execution working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct FilePath(String);

impl FilePath {
    pub fn parse(raw: &str) -> Result<Self, FlowError> {
        if raw.trim().is_empty() {
            return Err(brand_error("file_path", raw, "path must not be empty"));
        }
        Ok(FilePath(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A JavaScript expression to be evaluated in-page. Validation only
/// rejects the empty string; the external driver is the JS authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct JsExpression(String);

impl JsExpression {
    pub fn parse(raw: &str) -> Result<Self, FlowError> {
        if raw.trim().is_empty() {
            return Err(brand_error("js_expression", raw, "expression must not be empty"));
        }
        Ok(JsExpression(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A keyboard key identifier, e.g. `Enter`, `Tab`, `Control+A`. Validated
/// against the conservative grammar the external driver accepts: letters,
/// digits, and `+`-joined modifier chords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct KeyboardKey(String);

static KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+(\+[A-Za-z0-9]+)*$").expect("static pattern"));

impl KeyboardKey {
    pub fn parse(raw: &str) -> Result<Self, FlowError> {
        if !KEY_PATTERN.is_match(raw) {
            return Err(brand_error(
                "keyboard_key",
                raw,
                "expected letters/digits optionally joined with '+', e.g. Control+A",
            ));
        }
        Ok(KeyboardKey(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A variable name as it appears inside `${NAME}`.
pub static VARIABLE_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static pattern"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_requires_absolute_form() {
        assert!(Url::parse("https://example.com").is_ok());
        assert!(Url::parse("not a url").is_err());
    }

    #[test]
    fn keyboard_key_accepts_chords() {
        assert!(KeyboardKey::parse("Control+A").is_ok());
        assert!(KeyboardKey::parse("Enter").is_ok());
        assert!(KeyboardKey::parse("").is_err());
        assert!(KeyboardKey::parse("Control++A").is_err());
    }

    #[test]
    fn file_path_rejects_empty() {
        assert!(FilePath::parse("./out.png").is_ok());
        assert!(FilePath::parse("").is_err());
    }
}
