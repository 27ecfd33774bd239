//! Per-execution mutable state: the resolved-ref cache a flow builds up as
//! its steps run. Not shared across executions — a fresh `ExecutionContext`
//! is built for each `run_flow` call.

use std::collections::HashMap;

use enbu_flow_types::selector::Ref;

/// Tracks refs the adapter has resolved for selectors seen earlier in the
/// flow, keyed by the selector's CLI token as originally authored: if a ref
/// was resolved earlier in the flow, it is reused; otherwise the original
/// selector is sent again.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    resolved_refs: HashMap<String, Ref>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        ExecutionContext::default()
    }

    /// Returns the cached ref's CLI token for `original_token`, if one was
    /// recorded by an earlier step; otherwise `original_token` itself.
    pub fn resolve<'a>(&'a self, original_token: &'a str) -> std::borrow::Cow<'a, str> {
        match self.resolved_refs.get(original_token) {
            Some(r) => std::borrow::Cow::Owned(r.as_str().to_string()),
            None => std::borrow::Cow::Borrowed(original_token),
        }
    }

    /// Records a ref the adapter reported for `original_token`, if any.
    pub fn record(&mut self, original_token: &str, resolved_ref: Option<String>) {
        if let Some(token) = resolved_ref {
            self.resolved_refs.insert(original_token.to_string(), Ref::new(token));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_selector_passes_through() {
        let ctx = ExecutionContext::new();
        assert_eq!(ctx.resolve("Login"), "Login");
    }

    #[test]
    fn recorded_ref_wins_on_later_resolution() {
        let mut ctx = ExecutionContext::new();
        ctx.record("Login", Some("@e1".to_string()));
        assert_eq!(ctx.resolve("Login"), "@e1");
    }

    #[test]
    fn missing_ref_leaves_selector_unresolved() {
        let mut ctx = ExecutionContext::new();
        ctx.record("Login", None);
        assert_eq!(ctx.resolve("Login"), "Login");
    }
}
