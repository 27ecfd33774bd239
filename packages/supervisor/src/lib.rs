//! Flow Supervisor. Spawns the engine as a subprocess, reassembles
//! line-delimited JSON progress frames from its stdout, and forwards them as
//! strongly-typed events to a consumer — typically an editor-side test UI.
//!
//! An `mpsc::UnboundedReceiver` wrapped so a consumer can simply `recv()` in
//! a loop, fed by a background task that owns the child process. Also
//! implements `futures_util::Stream` for a consumer that prefers combinators
//! over a manual `recv()` loop.

pub mod error;
pub mod reassembly;

use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::task::{Context, Poll};

use enbu_flow_executor::progress::ProgressEvent;
use futures_util::Stream;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};

pub use error::SupervisorError;
use reassembly::LineReassembler;

/// One event delivered to the supervisor's consumer: either a typed
/// progress frame, a line of stderr diagnostics, or the terminal `close`
/// transition.
#[derive(Debug, Clone)]
pub enum SupervisorEvent {
    Frame(ProgressEvent),
    Error(String),
    Close(Option<i32>),
}

/// Configuration for the engine subprocess the supervisor launches.
#[derive(Debug, Clone, Default)]
pub struct EngineSpawnSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

/// Runs the engine as a child process and forwards reassembled progress
/// events to a consumer. Single-use: one supervisor per flow execution.
pub struct FlowSupervisor {
    events: mpsc::UnboundedReceiver<SupervisorEvent>,
    cancel: Option<oneshot::Sender<()>>,
}

impl FlowSupervisor {
    /// Spawns `spec.program` with stdout and stderr piped and stdin closed,
    /// and starts the background tasks that read, reassemble, and forward
    /// its output.
    pub fn spawn(spec: EngineSpawnSpec) -> Result<Self, SupervisorError> {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }
        for (key, value) in &spec.env {
            command.env(key, value);
        }

        tracing::debug!(program = %spec.program, args = ?spec.args, "spawning engine subprocess");

        let mut child = command.spawn().map_err(|e| SupervisorError::Spawn(e.to_string()))?;
        let stdout = child.stdout.take().expect("stdout piped");
        let stderr = child.stderr.take().expect("stderr piped");

        let (tx, rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let stdout_tx = tx.clone();
        let stdout_task = tokio::spawn(read_frames(stdout, stdout_tx));

        let stderr_tx = tx.clone();
        let stderr_task = tokio::spawn(read_diagnostics(stderr, stderr_tx));

        tokio::spawn(drive_child(child, cancel_rx, stdout_task, stderr_task, tx));

        Ok(FlowSupervisor { events: rx, cancel: Some(cancel_tx) })
    }

    /// Receives the next event, or `None` once the engine has exited and
    /// every buffered event has been delivered.
    pub async fn recv(&mut self) -> Option<SupervisorEvent> {
        self.events.recv().await
    }

    /// Kills the engine child process. Idempotent: subsequent calls are
    /// no-ops. Events already in flight may still be delivered, but no new
    /// frames will be produced once the process dies.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }
}

/// A consumer may either `recv()` in a loop or drive the supervisor as a
/// `Stream`, yielding the raw [`SupervisorEvent`] rather than a single
/// pre-serialised event type.
impl Stream for FlowSupervisor {
    type Item = SupervisorEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_recv(cx)
    }
}

/// Reads raw stdout bytes, reassembles lines, and forwards every line that
/// parses as a known [`ProgressEvent`] shape.
async fn read_frames<R: tokio::io::AsyncRead + Unpin>(
    mut reader: R,
    tx: mpsc::UnboundedSender<SupervisorEvent>,
) {
    let mut reassembler = LineReassembler::new();
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                for line in reassembler.push(&buf[..n]) {
                    forward_line(&line, &tx);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "error reading engine stdout");
                break;
            }
        }
    }
    if let Some(tail) = reassembler.finish() {
        forward_line(&tail, &tx);
    }
}

fn forward_line(line: &str, tx: &mpsc::UnboundedSender<SupervisorEvent>) {
    match serde_json::from_str::<ProgressEvent>(line) {
        Ok(event) => {
            let _ = tx.send(SupervisorEvent::Frame(event));
        }
        Err(_) => match serde_json::from_str::<serde_json::Value>(line) {
            Ok(value) => {
                tracing::warn!(r#type = ?value.get("type"), "dropping frame of unknown shape");
            }
            Err(_) => {
                tracing::warn!(line = %line, "dropping unparseable engine stdout line");
            }
        },
    }
}

/// Reads stderr line-by-line (no JSON framing expected there — it's
/// reserved for diagnostics intended for a human reader) and surfaces each
/// line as an `error` event.
async fn read_diagnostics<R: tokio::io::AsyncRead + Unpin>(
    mut reader: R,
    tx: mpsc::UnboundedSender<SupervisorEvent>,
) {
    let mut reassembler = LineReassembler::new();
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                for line in reassembler.push(&buf[..n]) {
                    let _ = tx.send(SupervisorEvent::Error(line));
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "error reading engine stderr");
                break;
            }
        }
    }
    if let Some(tail) = reassembler.finish() {
        let _ = tx.send(SupervisorEvent::Error(tail));
    }
}

/// Owns the child process: waits for it to exit (or kills it on
/// cancellation), waits for both reader tasks to finish flushing their
/// buffered lines, then emits the terminal `close` event.
async fn drive_child(
    mut child: Child,
    mut cancel_rx: oneshot::Receiver<()>,
    stdout_task: tokio::task::JoinHandle<()>,
    stderr_task: tokio::task::JoinHandle<()>,
    tx: mpsc::UnboundedSender<SupervisorEvent>,
) {
    let exit_status = tokio::select! {
        biased;
        _ = &mut cancel_rx => {
            tracing::debug!("cancellation requested, killing engine subprocess");
            let _ = child.start_kill();
            child.wait().await
        }
        status = child.wait() => status,
    };

    let _ = stdout_task.await;
    let _ = stderr_task.await;

    let exit_code = match exit_status {
        Ok(status) => status.code(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to wait on engine subprocess");
            None
        }
    };

    let _ = tx.send(SupervisorEvent::Close(exit_code));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn spawning_a_missing_binary_is_a_spawn_error() {
        let spec = EngineSpawnSpec {
            program: "definitely-not-a-real-binary-xyz".to_string(),
            ..Default::default()
        };
        let result = FlowSupervisor::spawn(spec);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn read_frames_forwards_a_valid_frame_and_drops_an_unknown_one() {
        let (mut writer, reader) = tokio::io::duplex(256);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let reader_task = tokio::spawn(read_frames(reader, tx));

        writer
            .write_all(b"{\"type\":\"flow:start\",\"flowName\":\"smoke\",\"stepTotal\":1}\n")
            .await
            .unwrap();
        writer.write_all(b"{\"type\":\"nonsense\"}\n").await.unwrap();
        drop(writer);
        reader_task.await.unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            SupervisorEvent::Frame(ProgressEvent::FlowStart { flow_name, step_total })
                if flow_name == "smoke" && *step_total == 1
        ));
    }

    #[tokio::test]
    async fn cancelling_kills_the_child_and_still_emits_close() {
        let spec = EngineSpawnSpec { program: "sleep".to_string(), args: vec!["30".to_string()], ..Default::default() };
        let mut supervisor = FlowSupervisor::spawn(spec).expect("sleep should exist");
        supervisor.cancel();

        let mut saw_close = false;
        while let Some(event) = supervisor.recv().await {
            if matches!(event, SupervisorEvent::Close(_)) {
                saw_close = true;
            }
        }
        assert!(saw_close);
    }

    #[tokio::test]
    async fn can_be_driven_as_a_stream_instead_of_recv() {
        use futures_util::StreamExt;

        let spec = EngineSpawnSpec { program: "true".to_string(), ..Default::default() };
        let mut supervisor = FlowSupervisor::spawn(spec).expect("true should exist");

        let mut saw_close = false;
        while let Some(event) = supervisor.next().await {
            if matches!(event, SupervisorEvent::Close(_)) {
                saw_close = true;
            }
        }
        assert!(saw_close);
    }
}
