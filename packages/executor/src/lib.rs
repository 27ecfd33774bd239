//! Flow executor. [`run_flow`] drives the per-step state machine: dispatch,
//! capture outcome, emit progress, decide whether to continue.

pub mod context;
pub mod handlers;
pub mod options;
pub mod progress;
pub mod session;

use std::time::Instant;

use enbu_flow_adapter::BrowserAdapter;
use enbu_flow_types::flow::{Flow, FlowErrorSummary, FlowResult, ScreenshotResult, StepResult, StepStatus};
use tokio::io::AsyncWrite;

use context::ExecutionContext;
use options::ExecuteOptions;
use progress::{ProgressCallback, ProgressEmitter, ProgressEvent, StepProgress};

/// Runs every step of `flow` against `adapter` in order, stopping early
/// only if a step fails and `options.bail` is set. Progress frames are
/// written to `progress` as each lifecycle event occurs; a
/// write failure there is logged and otherwise ignored, since the browser
/// automation itself must not be aborted by a broken output pipe.
pub async fn run_flow<W>(
    flow: &Flow,
    adapter: &BrowserAdapter,
    options: &ExecuteOptions,
    progress: &mut ProgressEmitter<W>,
    callback: Option<&(dyn ProgressCallback + Send + Sync)>,
) -> FlowResult
where
    W: AsyncWrite + Unpin,
{
    let run_start = Instant::now();
    let mut ctx = ExecutionContext::new();
    let step_total = flow.steps().len();

    emit(progress, &ProgressEvent::FlowStart { flow_name: flow.name().to_string(), step_total }).await;

    let mut step_results = Vec::with_capacity(step_total);
    let mut overall_status = StepStatus::Passed;
    let mut error_summary: Option<FlowErrorSummary> = None;

    for (index, command) in flow.steps().iter().enumerate() {
        if let Some(cb) = callback {
            cb.on_progress(StepProgress::Started { step_index: index, step_total }).await;
        }
        emit(progress, &ProgressEvent::StepStart { step_index: index, step_total }).await;

        let step_start = Instant::now();
        let dispatch_result = handlers::dispatch(adapter, &mut ctx, options, &command.kind).await;
        let duration = step_start.elapsed();

        let step_result = match dispatch_result {
            Ok(outcome) => StepResult {
                index,
                command: command.clone(),
                status: StepStatus::Passed,
                duration,
                stdout: outcome.stdout,
                error: None,
                screenshot: None,
            },
            Err(err) => {
                overall_status = StepStatus::Failed;
                if error_summary.is_none() {
                    error_summary =
                        Some(FlowErrorSummary { step_index: index, message: err.to_string() });
                }
                let screenshot = if options.no_screenshot_on_error {
                    ScreenshotResult::Disabled
                } else {
                    capture_error_screenshot(adapter).await
                };
                StepResult {
                    index,
                    command: command.clone(),
                    status: StepStatus::Failed,
                    duration,
                    stdout: None,
                    error: Some(err),
                    screenshot: Some(screenshot),
                }
            }
        };

        if let Some(cb) = callback {
            cb.on_progress(StepProgress::Completed {
                step_index: index,
                step_total,
                step_result: &step_result,
            })
            .await;
        }
        emit(progress, &ProgressEvent::step_complete(step_total, &step_result)).await;

        let should_bail = step_result.status == StepStatus::Failed && options.bail;
        step_results.push(step_result);
        if should_bail {
            break;
        }
    }

    let total_duration = run_start.elapsed();
    emit(
        progress,
        &ProgressEvent::FlowComplete {
            flow_name: flow.name().to_string(),
            status: overall_status,
            duration: total_duration,
        },
    )
    .await;

    FlowResult {
        flow_name: flow.name().to_string(),
        status: overall_status,
        steps: step_results,
        error: error_summary,
        session_name: (overall_status == StepStatus::Failed)
            .then(|| adapter.session_name().to_string()),
        duration: total_duration,
    }
}

async fn emit<W: AsyncWrite + Unpin>(progress: &mut ProgressEmitter<W>, event: &ProgressEvent) {
    if let Err(e) = progress.emit(event).await {
        tracing::warn!(error = %e, "failed to write progress event");
    }
}

/// Best-effort screenshot taken when a step fails, written under the
/// system temp directory so it survives regardless of the flow's own
/// working directory.
async fn capture_error_screenshot(adapter: &BrowserAdapter) -> ScreenshotResult {
    let path = error_screenshot_path();
    match adapter.screenshot(&path, None).await {
        Ok(captured) => ScreenshotResult::Captured(captured),
        Err(e) => ScreenshotResult::Failed(e.to_string()),
    }
}

fn error_screenshot_path() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    std::env::temp_dir()
        .join(format!("flow-error-{}.png", millis))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use enbu_flow_adapter::process::AdapterConfig;
    use enbu_flow_types::command::{Command, CommandKind};
    use enbu_flow_types::error::FlowError;
    use std::collections::HashMap;

    fn missing_binary_adapter() -> BrowserAdapter {
        BrowserAdapter::new(
            AdapterConfig { binary: "definitely-not-a-real-binary-xyz".to_string(), ..AdapterConfig::default() },
            "test-session",
        )
    }

    #[tokio::test]
    async fn a_flow_against_a_missing_binary_fails_on_the_first_step() {
        let flow = Flow::new(
            "smoke",
            HashMap::new(),
            vec![Command::new(CommandKind::Open {
                url: enbu_flow_types::brand::Url::parse("https://example.com").unwrap(),
            })],
        )
        .unwrap();
        let adapter = missing_binary_adapter();
        let options = ExecuteOptions::default();
        let mut buf: Vec<u8> = Vec::new();
        let mut emitter = ProgressEmitter::new(&mut buf);

        let result = run_flow(&flow, &adapter, &options, &mut emitter, None).await;

        assert_eq!(result.status, StepStatus::Failed);
        assert_eq!(result.steps.len(), 1);
        assert!(matches!(result.steps[0].error, Some(FlowError::NotInstalled { .. })));
        assert_eq!(result.session_name.as_deref(), Some("test-session"));
    }

    #[tokio::test]
    async fn bail_stops_after_the_first_failed_step() {
        let flow = Flow::new(
            "two-steps",
            HashMap::new(),
            vec![
                Command::new(CommandKind::Open {
                    url: enbu_flow_types::brand::Url::parse("https://example.com").unwrap(),
                }),
                Command::new(CommandKind::Press {
                    key: enbu_flow_types::brand::KeyboardKey::parse("Enter").unwrap(),
                }),
            ],
        )
        .unwrap();
        let adapter = missing_binary_adapter();
        let mut options = ExecuteOptions::default();
        options.bail = true;
        let mut buf: Vec<u8> = Vec::new();
        let mut emitter = ProgressEmitter::new(&mut buf);

        let result = run_flow(&flow, &adapter, &options, &mut emitter, None).await;

        assert_eq!(result.steps.len(), 1);
    }

    #[tokio::test]
    async fn without_bail_every_step_still_runs_and_reports_its_own_failure() {
        let flow = Flow::new(
            "two-steps",
            HashMap::new(),
            vec![
                Command::new(CommandKind::Open {
                    url: enbu_flow_types::brand::Url::parse("https://example.com").unwrap(),
                }),
                Command::new(CommandKind::Press {
                    key: enbu_flow_types::brand::KeyboardKey::parse("Enter").unwrap(),
                }),
            ],
        )
        .unwrap();
        let adapter = missing_binary_adapter();
        let mut options = ExecuteOptions::default();
        options.no_screenshot_on_error = true;
        let mut buf: Vec<u8> = Vec::new();
        let mut emitter = ProgressEmitter::new(&mut buf);

        let result = run_flow(&flow, &adapter, &options, &mut emitter, None).await;

        assert_eq!(result.steps.len(), 2);
        assert!(result.steps.iter().all(|s| s.status == StepStatus::Failed));
        assert!(matches!(result.steps[0].screenshot, Some(ScreenshotResult::Disabled)));
    }
}
