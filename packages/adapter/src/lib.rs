//! Browser Adapter: a typed façade over the external headless browser CLI.
//! Every public method on [`BrowserAdapter`] composes one CLI invocation,
//! via [`process::invoke`], and interprets its output envelope into a
//! domain-specific return type or a [`FlowError`].
//!
//! One subcommand per operation (`open`, `click`, `fill`, `wait`,
//! `screenshot`, …), a `--session` flag to target a named browser context,
//! and `--json` to request the machine-readable envelope.

pub mod process;

use enbu_flow_types::error::FlowError;
use enbu_flow_types::selector::ToCliSelector;
use process::AdapterConfig;
use serde::Deserialize;
use std::time::Duration;

/// A thin, cheaply-cloned façade bound to one named browser session. The
/// adapter itself holds no process handle — each call spawns its own child;
/// no connection pool is assumed.
#[derive(Debug, Clone)]
pub struct BrowserAdapter {
    config: AdapterConfig,
    session: String,
}

/// The envelope `data` payload for actions that have no result of their
/// own but may report back the resolved element `ref` — an opaque token
/// produced by the external driver identifying a previously located
/// element, which the executor's selector-resolution policy may cache for
/// later steps.
#[derive(Debug, Default, Deserialize)]
struct ActionData {
    #[serde(default, rename = "ref")]
    resolved_ref: Option<String>,
}

/// The envelope `data` payload for actions with no result and no ref to
/// report back (key events, scrolling, waiting).
#[derive(Debug, Deserialize)]
struct Empty {}

#[derive(Debug, Deserialize)]
struct VisibleData {
    visible: bool,
}

#[derive(Debug, Deserialize)]
struct CheckedData {
    checked: bool,
}

#[derive(Debug, Deserialize)]
struct EnabledData {
    enabled: bool,
}

#[derive(Debug, Deserialize)]
struct ScreenshotData {
    path: String,
}

impl BrowserAdapter {
    pub fn new(config: AdapterConfig, session: impl Into<String>) -> Self {
        BrowserAdapter { config, session: session.into() }
    }

    /// Whether the configured CLI binary can be located on `PATH`.
    pub fn is_installed(&self) -> bool {
        self.config.binary_available()
    }

    /// The session name this adapter targets. Surfaced by the executor in
    /// a `FlowResult` only when the flow fails, to avoid leaking ephemeral
    /// session names on the success path.
    pub fn session_name(&self) -> &str {
        &self.session
    }

    fn session_args(&self, extra: &[String]) -> Vec<String> {
        let mut args = vec!["--session".to_string(), self.session.clone()];
        if self.config.headed {
            args.push("--headed".to_string());
        }
        args.extend(extra.iter().cloned());
        args
    }

    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        subcommand: &str,
        args: &[String],
        timeout_override: Option<Duration>,
    ) -> Result<T, FlowError> {
        let full_args = self.session_args(args);
        process::invoke(&self.config, subcommand, &full_args, timeout_override).await
    }

    pub async fn open(&self, url: &str) -> Result<Option<String>, FlowError> {
        self.call::<ActionData>("open", &[url.to_string()], None).await.map(|d| d.resolved_ref)
    }

    pub async fn click(&self, selector: &impl ToCliSelector) -> Result<Option<String>, FlowError> {
        self.call::<ActionData>("click", &[selector.to_cli_token()], None).await.map(|d| d.resolved_ref)
    }

    pub async fn dblclick(&self, selector: &impl ToCliSelector) -> Result<Option<String>, FlowError> {
        self.call::<ActionData>("dblclick", &[selector.to_cli_token()], None).await.map(|d| d.resolved_ref)
    }

    pub async fn hover(&self, selector: &impl ToCliSelector) -> Result<Option<String>, FlowError> {
        self.call::<ActionData>("hover", &[selector.to_cli_token()], None).await.map(|d| d.resolved_ref)
    }

    pub async fn focus(&self, selector: &impl ToCliSelector) -> Result<Option<String>, FlowError> {
        self.call::<ActionData>("focus", &[selector.to_cli_token()], None).await.map(|d| d.resolved_ref)
    }

    pub async fn check(&self, selector: &impl ToCliSelector) -> Result<Option<String>, FlowError> {
        self.call::<ActionData>("check", &[selector.to_cli_token()], None).await.map(|d| d.resolved_ref)
    }

    pub async fn uncheck(&self, selector: &impl ToCliSelector) -> Result<Option<String>, FlowError> {
        self.call::<ActionData>("uncheck", &[selector.to_cli_token()], None).await.map(|d| d.resolved_ref)
    }

    pub async fn type_text(
        &self,
        selector: &impl ToCliSelector,
        value: &str,
    ) -> Result<Option<String>, FlowError> {
        self.call::<ActionData>("type", &[selector.to_cli_token(), value.to_string()], None)
            .await
            .map(|d| d.resolved_ref)
    }

    pub async fn fill(
        &self,
        selector: &impl ToCliSelector,
        value: &str,
    ) -> Result<Option<String>, FlowError> {
        self.call::<ActionData>("fill", &[selector.to_cli_token(), value.to_string()], None)
            .await
            .map(|d| d.resolved_ref)
    }

    pub async fn select(
        &self,
        selector: &impl ToCliSelector,
        option: &str,
    ) -> Result<Option<String>, FlowError> {
        self.call::<ActionData>("select", &[selector.to_cli_token(), option.to_string()], None)
            .await
            .map(|d| d.resolved_ref)
    }

    pub async fn press(&self, key: &str) -> Result<(), FlowError> {
        self.call::<Empty>("press", &[key.to_string()], None).await.map(|_| ())
    }

    pub async fn keydown(&self, key: &str) -> Result<(), FlowError> {
        self.call::<Empty>("keydown", &[key.to_string()], None).await.map(|_| ())
    }

    pub async fn keyup(&self, key: &str) -> Result<(), FlowError> {
        self.call::<Empty>("keyup", &[key.to_string()], None).await.map(|_| ())
    }

    pub async fn scroll(&self, direction: &str, amount: u64) -> Result<(), FlowError> {
        self.call::<Empty>(
            "scroll",
            &["--direction".to_string(), direction.to_string(), "--amount".to_string(), amount.to_string()],
            None,
        )
        .await
        .map(|_| ())
    }

    pub async fn scroll_into_view(
        &self,
        selector: &impl ToCliSelector,
    ) -> Result<Option<String>, FlowError> {
        self.call::<ActionData>("scroll-into-view", &[selector.to_cli_token()], None)
            .await
            .map(|d| d.resolved_ref)
    }

    pub async fn is_visible(&self, selector: &impl ToCliSelector) -> Result<bool, FlowError> {
        self.call::<VisibleData>("is-visible", &[selector.to_cli_token()], None)
            .await
            .map(|d| d.visible)
    }

    pub async fn is_checked(&self, selector: &impl ToCliSelector) -> Result<bool, FlowError> {
        self.call::<CheckedData>("is-checked", &[selector.to_cli_token()], None)
            .await
            .map(|d| d.checked)
    }

    pub async fn is_enabled(&self, selector: &impl ToCliSelector) -> Result<bool, FlowError> {
        self.call::<EnabledData>("is-enabled", &[selector.to_cli_token()], None)
            .await
            .map(|d| d.enabled)
    }

    pub async fn wait_for_selector(
        &self,
        selector: &impl ToCliSelector,
        timeout: Duration,
        poll_interval: Option<Duration>,
    ) -> Result<(), FlowError> {
        let mut args = vec![
            "--selector".to_string(),
            selector.to_cli_token(),
            "--timeout-ms".to_string(),
            timeout.as_millis().to_string(),
        ];
        if let Some(interval) = poll_interval {
            args.push("--interval-ms".to_string());
            args.push(interval.as_millis().to_string());
        }
        self.call::<Empty>("wait", &args, Some(timeout)).await.map(|_| ())
    }

    pub async fn wait_for_text(
        &self,
        text: &str,
        timeout: Duration,
        poll_interval: Option<Duration>,
    ) -> Result<(), FlowError> {
        let mut args = vec![
            "--text".to_string(),
            text.to_string(),
            "--timeout-ms".to_string(),
            timeout.as_millis().to_string(),
        ];
        if let Some(interval) = poll_interval {
            args.push("--interval-ms".to_string());
            args.push(interval.as_millis().to_string());
        }
        self.call::<Empty>("wait", &args, Some(timeout)).await.map(|_| ())
    }

    pub async fn wait_for_network_idle(&self, timeout: Duration) -> Result<(), FlowError> {
        self.call::<Empty>(
            "wait",
            &["--state".to_string(), "networkidle".to_string(), "--timeout-ms".to_string(), timeout.as_millis().to_string()],
            Some(timeout),
        )
        .await
        .map(|_| ())
    }

    pub async fn wait_for_load(&self, state: &str, timeout: Duration) -> Result<(), FlowError> {
        self.call::<Empty>(
            "wait",
            &["--state".to_string(), state.to_string(), "--timeout-ms".to_string(), timeout.as_millis().to_string()],
            Some(timeout),
        )
        .await
        .map(|_| ())
    }

    pub async fn wait_for_url(&self, pattern: &str, timeout: Duration) -> Result<(), FlowError> {
        self.call::<Empty>(
            "wait",
            &["--url".to_string(), pattern.to_string(), "--timeout-ms".to_string(), timeout.as_millis().to_string()],
            Some(timeout),
        )
        .await
        .map(|_| ())
    }

    pub async fn wait_for_function(&self, expression: &str, timeout: Duration) -> Result<(), FlowError> {
        self.call::<Empty>(
            "wait",
            &["--function".to_string(), expression.to_string(), "--timeout-ms".to_string(), timeout.as_millis().to_string()],
            Some(timeout),
        )
        .await
        .map(|_| ())
    }

    pub async fn wait_for_ms(&self, ms: u64) -> Result<(), FlowError> {
        self.call::<Empty>("wait", &[ms.to_string()], Some(Duration::from_millis(ms) + Duration::from_secs(5)))
            .await
            .map(|_| ())
    }

    /// `full`: `None` defers to the adapter's own default rather than
    /// forcing either a full-page or viewport-only capture.
    pub async fn screenshot(&self, path: &str, full: Option<bool>) -> Result<String, FlowError> {
        let mut args = vec![path.to_string()];
        if let Some(full) = full {
            args.push("--full-page".to_string());
            args.push(full.to_string());
        }
        self.call::<ScreenshotData>("screenshot", &args, None).await.map(|d| d.path)
    }

    pub async fn eval(&self, expression: &str) -> Result<serde_json::Value, FlowError> {
        self.call::<serde_json::Value>("eval", &[expression.to_string()], None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> BrowserAdapter {
        BrowserAdapter::new(
            AdapterConfig { binary: "definitely-not-a-real-binary-xyz".to_string(), ..AdapterConfig::default() },
            "test-session",
        )
    }

    #[tokio::test]
    async fn missing_binary_surfaces_as_not_installed_from_every_entry_point() {
        let adapter = adapter();
        assert!(!adapter.is_installed());
        let err = adapter.open("https://example.com").await.unwrap_err();
        assert!(matches!(err, FlowError::NotInstalled { .. }));
    }
}
