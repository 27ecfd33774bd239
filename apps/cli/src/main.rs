//! `enbu-flow`: the binary entry point wiring the YAML loader, variable
//! resolver, command validator, and flow executor together, with the
//! progress emitter writing to stdout and a human-readable summary on
//! stderr.

mod config;

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use enbu_flow_adapter::process::AdapterConfig;
use enbu_flow_adapter::BrowserAdapter;
use enbu_flow_executor::options::ExecuteOptions;
use enbu_flow_executor::progress::ProgressEmitter;
use enbu_flow_executor::session::SessionSpec;
use enbu_flow_executor::run_flow;
use enbu_flow_types::flow::StepStatus;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "enbu-flow", about = "Runs a declarative browser-automation flow script")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parses and executes a flow YAML file against the external browser CLI.
    Run {
        /// Path to the flow's YAML script.
        flow: PathBuf,
        /// Run the browser with a visible window rather than headless.
        #[arg(long)]
        headed: bool,
        /// Explicit browser session name (default: a unique `enbu-` prefixed name).
        #[arg(long)]
        session: Option<String>,
        /// Stop at the first failed step rather than running every step.
        #[arg(long)]
        bail: bool,
        /// Skip capturing a screenshot when a step fails.
        #[arg(long = "no-screenshot-on-error")]
        no_screenshot_on_error: bool,
        /// Per-command timeout, in milliseconds.
        #[arg(long = "timeout-ms")]
        timeout_ms: Option<u64>,
        /// Auto-wait poll interval, in milliseconds.
        #[arg(long = "interval-ms")]
        interval_ms: Option<u64>,
        /// Working directory for the browser CLI subprocess and relative
        /// screenshot paths.
        #[arg(long)]
        cwd: Option<PathBuf>,
        /// Extra `KEY=VALUE` environment variables forwarded to the browser
        /// CLI subprocess. May be given more than once.
        #[arg(long = "env", value_parser = parse_env_pair)]
        env: Vec<(String, String)>,
    },
}

fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let app_config = config::Config::from_env()?;

    let Command::Run { flow, headed, session, bail, no_screenshot_on_error, timeout_ms, interval_ms, cwd, env } =
        cli.command;

    tracing::info!(flow = %flow.display(), "parsing flow");

    let dotenv_map: HashMap<String, String> = HashMap::new();
    let parsed = enbu_flow_core::parse_flow_file(&flow, &dotenv_map);
    let flow = match parsed {
        Ok(flow) => flow,
        Err(e) => {
            eprintln!("failed to parse flow: {}", e);
            std::process::exit(1);
        }
    };

    let session_spec = match session {
        Some(name) => SessionSpec::Explicit(name),
        None => SessionSpec::Default,
    };

    let adapter_config = AdapterConfig {
        binary: app_config.browser_cli,
        cwd: cwd.clone(),
        env: env.clone(),
        default_timeout: timeout_ms.map(Duration::from_millis).unwrap_or(app_config.default_command_timeout),
        headed,
    };
    let adapter = BrowserAdapter::new(adapter_config, session_spec.resolve());

    if !adapter.is_installed() {
        eprintln!("browser CLI binary not found on PATH");
        std::process::exit(1);
    }

    let options = ExecuteOptions {
        session: SessionSpec::Explicit(adapter.session_name().to_string()),
        headed,
        bail,
        no_screenshot_on_error,
        command_timeout: timeout_ms.map(Duration::from_millis).unwrap_or(app_config.default_command_timeout),
        auto_wait_timeout: app_config.default_auto_wait_timeout,
        auto_wait_interval: interval_ms
            .map(Duration::from_millis)
            .unwrap_or(enbu_flow_executor::options::DEFAULT_AUTO_WAIT_INTERVAL),
        cwd,
        extra_env: env,
    };

    let stdout = tokio::io::stdout();
    let mut emitter = ProgressEmitter::new(stdout);

    let result = run_flow(&flow, &adapter, &options, &mut emitter, None).await;

    print_summary(&result);

    if result.status == StepStatus::Passed {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn print_summary(result: &enbu_flow_types::flow::FlowResult) {
    eprintln!();
    eprintln!("flow '{}': {:?} ({} steps, {}ms)", result.flow_name, result.status, result.steps.len(), result.duration.as_millis());
    if let Some(error) = &result.error {
        eprintln!("  failed at step[{}]: {}", error.step_index, error.message);
    }
    if let Some(session_name) = &result.session_name {
        eprintln!("  session: {}", session_name);
    }
}
