//! Tagged selector variants. Two closed, mutually exclusive
//! families distinguish whether a non-actionable text node qualifies:
//! `InteractableSelector` (must be actionable) and `AnySelector` (any DOM
//! text node qualifies). Each is a distinct nominal type so a function
//! accepting one cannot be handed the other by mistake.

use schemars::JsonSchema;
use serde::Serialize;

/// A selector usable where the target must be actionable: clickable,
/// focusable, fillable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub enum InteractableSelector {
    Css(String),
    InteractableText(String),
    Xpath(String),
}

/// A selector usable where any DOM text node qualifies: visibility
/// assertions, scroll-into-view, wait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub enum AnySelector {
    Css(String),
    AnyText(String),
    Xpath(String),
}

/// An opaque token produced by the external driver identifying a
/// previously located element (e.g. `@e1`). Passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Ref(String);

impl Ref {
    pub fn new(token: impl Into<String>) -> Self {
        Ref(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Converts a selector variant to the adapter's CLI token form. `{css}`
/// passes through verbatim, `{xpath}` is prefixed, both text families
/// collapse to `text=`, and a bare `Ref` passes through
/// verbatim (ref tokens like `@e1` are opaque to the adapter).
pub trait ToCliSelector {
    fn to_cli_token(&self) -> String;
}

impl ToCliSelector for InteractableSelector {
    fn to_cli_token(&self) -> String {
        match self {
            InteractableSelector::Css(s) => s.clone(),
            InteractableSelector::Xpath(s) => format!("xpath={}", s),
            InteractableSelector::InteractableText(s) => format!("text={}", s),
        }
    }
}

impl ToCliSelector for AnySelector {
    fn to_cli_token(&self) -> String {
        match self {
            AnySelector::Css(s) => s.clone(),
            AnySelector::Xpath(s) => format!("xpath={}", s),
            AnySelector::AnyText(s) => format!("text={}", s),
        }
    }
}

impl ToCliSelector for Ref {
    fn to_cli_token(&self) -> String {
        self.0.clone()
    }
}

/// Classifies a raw string by prefix (`@`, `#`, `.`, `[`, or `text=`) or by
/// being a short alphabetic tag name (<=20 chars) — used when the engine
/// must choose between `waitForSelector` and `waitForText` for a value
/// whose family is not yet known.
pub fn is_css_or_ref_selector(raw: &str) -> bool {
    if raw.starts_with('@')
        || raw.starts_with('#')
        || raw.starts_with('.')
        || raw.starts_with('[')
        || raw.starts_with("text=")
    {
        return true;
    }
    raw.len() <= 20 && !raw.is_empty() && raw.chars().all(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_and_ref_passthrough() {
        assert_eq!(InteractableSelector::Css("#go".into()).to_cli_token(), "#go");
        assert_eq!(Ref::new("@e1").to_cli_token(), "@e1");
    }

    #[test]
    fn xpath_is_prefixed() {
        assert_eq!(
            AnySelector::Xpath("//div".into()).to_cli_token(),
            "xpath=//div"
        );
    }

    #[test]
    fn text_families_collapse_to_text_token() {
        assert_eq!(
            InteractableSelector::InteractableText("Login".into()).to_cli_token(),
            "text=Login"
        );
        assert_eq!(
            AnySelector::AnyText("Dashboard".into()).to_cli_token(),
            "text=Dashboard"
        );
    }

    #[test]
    fn classify_by_prefix_or_short_tag_name() {
        assert!(is_css_or_ref_selector("#missing"));
        assert!(is_css_or_ref_selector("@e1"));
        assert!(is_css_or_ref_selector("button"));
        assert!(!is_css_or_ref_selector("Log in to continue"));
    }
}
