//! Integration coverage for a passing multi-step flow and for a timed-out
//! assertion under `bail`, driving `run_flow` against a small,
//! locally-written stand-in for the external browser CLI rather than
//! mocking the adapter itself — this exercises the real subprocess-spawn
//! path through `enbu_flow_adapter::process::invoke`.

use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use enbu_flow_adapter::process::AdapterConfig;
use enbu_flow_adapter::BrowserAdapter;
use enbu_flow_executor::options::ExecuteOptions;
use enbu_flow_executor::progress::ProgressEmitter;
use enbu_flow_executor::run_flow;
use enbu_flow_executor::session::SessionSpec;
use enbu_flow_types::flow::{Flow, StepStatus};

/// Writes an executable shell script standing in for the external browser
/// CLI: it always reports `{"success":true,"data":...}` except for a
/// `wait` subcommand whose args mention `missing`, which sleeps long
/// enough to blow past a short auto-wait timeout (used by S2 to provoke a
/// real `Timeout`, not a simulated one).
fn write_fake_browser_cli(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("fake-browser-cli.sh");
    let script = r#"#!/bin/sh
case "$1" in
  is-visible) echo '{"success":true,"data":{"visible":true}}' ;;
  is-checked) echo '{"success":true,"data":{"checked":true}}' ;;
  is-enabled) echo '{"success":true,"data":{"enabled":true}}' ;;
  wait)
    for arg in "$@"; do
      case "$arg" in
        *missing*) sleep 2 ;;
      esac
    done
    echo '{"success":true,"data":{}}'
    ;;
  *) echo '{"success":true,"data":{}}' ;;
esac
"#;
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(script.as_bytes()).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
    }
    path
}

fn adapter(dir: &std::path::Path) -> BrowserAdapter {
    let binary = write_fake_browser_cli(dir);
    BrowserAdapter::new(
        AdapterConfig { binary: binary.to_string_lossy().to_string(), ..AdapterConfig::default() },
        "it-session",
    )
}

/// S1. Happy path: every adapter call succeeds, all three steps pass.
#[tokio::test]
async fn s1_happy_path_passes_every_step() {
    let dir = tempfile::tempdir().unwrap();
    let dotenv = HashMap::new();
    let flow = enbu_flow_core::parse_flow(
        "s1",
        "- open: https://example.com\n- click: Login\n- assertVisible: Dashboard\n",
        &dotenv,
    )
    .unwrap();

    let adapter = adapter(dir.path());
    let options = ExecuteOptions::default();
    let mut buf: Vec<u8> = Vec::new();
    let mut emitter = ProgressEmitter::new(&mut buf);

    let result = run_flow(&flow, &adapter, &options, &mut emitter, None).await;

    assert_eq!(result.status, StepStatus::Passed);
    assert_eq!(result.steps.len(), 3);
    assert!(result.steps.iter().all(|s| s.status == StepStatus::Passed));
    assert!(result.is_consistent());
}

/// S2. `assertVisible: {css: "#missing"}` times out during auto-wait; with
/// `bail` set, the trailing `click` step is never dispatched.
#[tokio::test]
async fn s2_assertion_timeout_with_bail_stops_after_the_failing_step() {
    let dir = tempfile::tempdir().unwrap();
    let dotenv = HashMap::new();
    let flow = enbu_flow_core::parse_flow(
        "s2",
        "- open: https://example.com\n- assertVisible: {css: \"#missing\"}\n- click: Other\n",
        &dotenv,
    )
    .unwrap();

    let adapter = adapter(dir.path());
    let mut options = ExecuteOptions::default();
    options.bail = true;
    options.auto_wait_timeout = Duration::from_millis(100);
    options.no_screenshot_on_error = true;
    let mut buf: Vec<u8> = Vec::new();
    let mut emitter = ProgressEmitter::new(&mut buf);

    let result = run_flow(&flow, &adapter, &options, &mut emitter, None).await;

    assert_eq!(result.status, StepStatus::Failed);
    assert_eq!(result.steps.len(), 2);
    assert_eq!(result.steps[0].status, StepStatus::Passed);
    assert_eq!(result.steps[1].status, StepStatus::Failed);
    assert_eq!(result.error.as_ref().map(|e| e.step_index), Some(1));
}

/// Session identity is surfaced in the result only on failure.
#[tokio::test]
async fn session_name_is_suppressed_on_success_and_present_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let dotenv = HashMap::new();

    let passing = enbu_flow_core::parse_flow("ok", "- open: https://example.com\n", &dotenv).unwrap();
    let adapter_ok = adapter(dir.path());
    let options = ExecuteOptions { session: SessionSpec::Explicit("it-session".to_string()), ..ExecuteOptions::default() };
    let mut buf: Vec<u8> = Vec::new();
    let mut emitter = ProgressEmitter::new(&mut buf);
    let ok_result = run_flow(&passing, &adapter_ok, &options, &mut emitter, None).await;
    assert_eq!(ok_result.session_name, None);

    let failing = enbu_flow_core::parse_flow(
        "fail",
        "- assertVisible: {css: \"#missing\"}\n",
        &dotenv,
    )
    .unwrap();
    let adapter_fail = adapter(dir.path());
    let mut fail_options = options.clone();
    fail_options.auto_wait_timeout = Duration::from_millis(100);
    fail_options.no_screenshot_on_error = true;
    let mut buf2: Vec<u8> = Vec::new();
    let mut emitter2 = ProgressEmitter::new(&mut buf2);
    let fail_result = run_flow(&failing, &adapter_fail, &fail_options, &mut emitter2, None).await;
    assert_eq!(fail_result.session_name.as_deref(), Some("it-session"));
}
