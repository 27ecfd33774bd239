//! Session identity. The session name is a plain string the adapter passes
//! through to the external browser CLI verbatim; this module only decides
//! what that string is.

use rand::distr::Alphanumeric;
use rand::Rng;

/// How the caller wants the browser session named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSpec {
    /// Used verbatim.
    Explicit(String),
    /// The engine appends a timestamp and random suffix to guarantee
    /// uniqueness.
    Prefix(String),
    /// Equivalent to `Prefix("enbu")`.
    Default,
}

impl SessionSpec {
    /// Resolves to the concrete session name the adapter will use.
    pub fn resolve(&self) -> String {
        match self {
            SessionSpec::Explicit(name) => name.clone(),
            SessionSpec::Prefix(prefix) => unique_session_name(prefix),
            SessionSpec::Default => unique_session_name("enbu"),
        }
    }
}

fn unique_session_name(prefix: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp_millis();
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("{}-{}-{}", prefix, timestamp, suffix.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_session_is_used_verbatim() {
        assert_eq!(SessionSpec::Explicit("my-session".to_string()).resolve(), "my-session");
    }

    #[test]
    fn default_session_uses_enbu_prefix() {
        assert!(SessionSpec::Default.resolve().starts_with("enbu-"));
    }

    #[test]
    fn prefix_sessions_are_unique_across_calls() {
        let spec = SessionSpec::Prefix("flow".to_string());
        let a = spec.resolve();
        let b = spec.resolve();
        assert_ne!(a, b);
        assert!(a.starts_with("flow-"));
    }
}
