//! Execution options. Everything the step state machine needs to know
//! that isn't part of the flow itself.

use std::path::PathBuf;
use std::time::Duration;

use crate::session::SessionSpec;

/// Default ceiling for the explicit `assertVisible`/`assertNotVisible`
/// auto-wait, used when the caller does not override it.
pub const DEFAULT_AUTO_WAIT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default poll interval the adapter is asked to use while auto-waiting.
pub const DEFAULT_AUTO_WAIT_INTERVAL: Duration = Duration::from_millis(100);
/// Default per-command timeout for everything that is not an explicit wait.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// How the browser session this run attaches to should be named.
    pub session: SessionSpec,
    /// Run the browser with a visible window rather than headless.
    pub headed: bool,
    /// Stop at the first failed step rather than continuing to the end.
    pub bail: bool,
    /// Skip capturing a screenshot when a step fails.
    pub no_screenshot_on_error: bool,
    /// Ceiling applied to every adapter call that is not an explicit wait
    /// or auto-wait (open, click, fill, eval, …).
    pub command_timeout: Duration,
    /// Ceiling applied to the implicit wait `assertVisible`/
    /// `assertNotVisible` perform before checking.
    pub auto_wait_timeout: Duration,
    /// Poll interval passed to the adapter during auto-wait.
    pub auto_wait_interval: Duration,
    /// Working directory the browser CLI subprocess is spawned in, and
    /// the base directory screenshot paths are resolved against.
    pub cwd: Option<PathBuf>,
    /// Extra environment variables forwarded to the browser CLI
    /// subprocess, on top of the flow's own `env:` document.
    pub extra_env: Vec<(String, String)>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        ExecuteOptions {
            session: SessionSpec::Default,
            headed: false,
            bail: false,
            no_screenshot_on_error: false,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            auto_wait_timeout: DEFAULT_AUTO_WAIT_TIMEOUT,
            auto_wait_interval: DEFAULT_AUTO_WAIT_INTERVAL,
            cwd: None,
            extra_env: Vec::new(),
        }
    }
}
