//! Subprocess plumbing for the external browser CLI. Every operation spawns
//! a fresh child process — no connection pool is assumed — composes its
//! argument vector, enforces a timeout with the adapter itself (not the
//! OS), and interprets the `{success, data, error}` output envelope.
//!
//! Grounded on the `agent-browser` CLI wrapper pattern: a
//! `Command::new("agent-browser")` per call, `--json` to request
//! machine-readable output, `which`-based presence detection.

use std::process::Stdio;
use std::time::Duration;

use enbu_flow_types::error::FlowError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::process::Command;
use tokio::time::timeout;

/// Configuration for every adapter call: which binary to invoke, the
/// working directory and environment to run it in, and the default
/// per-call timeout.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub binary: String,
    pub cwd: Option<std::path::PathBuf>,
    pub env: Vec<(String, String)>,
    pub default_timeout: Duration,
    /// Run the browser with a visible window rather than headless.
    /// Forwarded as `--headed` on every call.
    pub headed: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        AdapterConfig {
            binary: "agent-browser".to_string(),
            cwd: None,
            env: Vec::new(),
            default_timeout: Duration::from_secs(30),
            headed: false,
        }
    }
}

impl AdapterConfig {
    /// Whether the configured binary can be located on `PATH`. Checked
    /// lazily by callers before the first invocation of a flow, not
    /// cached — the binary could be installed or removed between flows.
    pub fn binary_available(&self) -> bool {
        which::which(&self.binary).is_ok()
    }
}

/// The envelope every successful invocation of the external CLI prints:
/// one JSON object followed by a newline.
#[derive(Debug, serde::Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    error: Option<String>,
}

/// Invokes `binary subcommand args... --json`, enforces `timeout_ms`, and
/// decodes the envelope's `data` field as `T`.
pub async fn invoke<T: DeserializeOwned>(
    config: &AdapterConfig,
    subcommand: &str,
    args: &[String],
    timeout_override: Option<Duration>,
) -> Result<T, FlowError> {
    if !config.binary_available() {
        return Err(FlowError::NotInstalled { binary: config.binary.clone() });
    }

    let mut full_args: Vec<String> = vec![subcommand.to_string()];
    full_args.extend(args.iter().cloned());
    full_args.push("--json".to_string());

    let mut command = Command::new(&config.binary);
    command.args(&full_args);
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());
    // When the timeout below fires, `wait_with_output`'s future (which owns
    // the child) is dropped before the process exits. `kill_on_drop` is what
    // turns that drop into an actual kill.
    command.kill_on_drop(true);
    if let Some(cwd) = &config.cwd {
        command.current_dir(cwd);
    }
    for (key, value) in &config.env {
        command.env(key, value);
    }

    tracing::debug!(binary = %config.binary, args = ?full_args, "spawning browser CLI");

    let call_timeout = timeout_override.unwrap_or(config.default_timeout);
    let mut child = command
        .spawn()
        .map_err(|_| FlowError::NotInstalled { binary: config.binary.clone() })?;

    let output = match timeout(call_timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(FlowError::CommandFailed {
                exit_code: None,
                stderr: e.to_string(),
                args: full_args,
            });
        }
        Err(_) => {
            return Err(FlowError::Timeout { args: full_args, timeout_ms: call_timeout.as_millis() as u64 });
        }
    };

    if !output.status.success() {
        return Err(FlowError::CommandFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            args: full_args,
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let envelope: Envelope = serde_json::from_str(stdout.trim()).map_err(|_| {
        FlowError::AgentBrowserOutputParseError { raw_output: stdout.to_string() }
    })?;

    if !envelope.success {
        return Err(FlowError::CommandExecutionFailed {
            message: envelope.error.unwrap_or_else(|| "command reported failure".to_string()),
        });
    }

    serde_json::from_value(envelope.data)
        .map_err(|_| FlowError::AgentBrowserOutputParseError { raw_output: stdout.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_agent_browser() {
        let config = AdapterConfig::default();
        assert_eq!(config.binary, "agent-browser");
    }

    #[tokio::test]
    async fn missing_binary_is_not_installed() {
        let config = AdapterConfig {
            binary: "definitely-not-a-real-binary-xyz".to_string(),
            ..AdapterConfig::default()
        };
        let err = invoke::<Value>(&config, "open", &[], None).await.unwrap_err();
        assert!(matches!(err, FlowError::NotInstalled { .. }));
    }

    #[tokio::test]
    async fn a_slow_child_is_killed_and_reported_as_timeout() {
        // `sh -c 'sleep 30'` run through `invoke` with a short timeout
        // override: the call must return `Timeout` well before the 30s
        // sleep would otherwise elapse, proving the future stops driving
        // the child rather than waiting it out. The trailing `--json` that
        // `invoke` always appends lands as `sh`'s harmless `$0`.
        let config = AdapterConfig { binary: "sh".to_string(), ..AdapterConfig::default() };
        let start = std::time::Instant::now();
        let err = invoke::<Value>(&config, "-c", &["sleep 30".to_string()], Some(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
