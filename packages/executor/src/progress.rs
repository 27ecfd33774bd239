//! Progress emitter. One JSON object per stdout line, never split across
//! writes, never interleaved with diagnostic output. Also defines the
//! optional progress callback the executor invokes before and after
//! dispatching each step.

use std::time::Duration;

use enbu_flow_types::flow::{StepResult, StepStatus};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// One of the four lifecycle frames written to the engine's stdout. Also
/// `Deserialize` so a supervising process can type-check frames read back
/// off that same stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ProgressEvent {
    #[serde(rename = "flow:start")]
    FlowStart { flow_name: String, step_total: usize },
    #[serde(rename = "step:start")]
    StepStart { step_index: usize, step_total: usize },
    #[serde(rename = "step:complete")]
    StepComplete {
        step_index: usize,
        step_total: usize,
        status: StepStatus,
        #[serde(with = "duration_ms")]
        duration: Duration,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    #[serde(rename = "flow:complete")]
    FlowComplete {
        flow_name: String,
        status: StepStatus,
        #[serde(with = "duration_ms")]
        duration: Duration,
    },
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u128(d.as_millis())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}

impl ProgressEvent {
    pub fn step_complete(total: usize, result: &StepResult) -> Self {
        ProgressEvent::StepComplete {
            step_index: result.index,
            step_total: total,
            status: result.status,
            duration: result.duration,
            error: result.error.as_ref().map(|e| e.to_string()),
        }
    }
}

/// Writes line-delimited JSON frames to an async sink (stdout in
/// production, an in-memory buffer in tests). Never shares the sink with
/// diagnostics: `tracing` output goes to stderr.
pub struct ProgressEmitter<W> {
    sink: W,
}

impl<W: AsyncWrite + Unpin> ProgressEmitter<W> {
    pub fn new(sink: W) -> Self {
        ProgressEmitter { sink }
    }

    pub async fn emit(&mut self, event: &ProgressEvent) -> std::io::Result<()> {
        let mut line = serde_json::to_string(event).expect("ProgressEvent always serialises");
        line.push('\n');
        self.sink.write_all(line.as_bytes()).await?;
        self.sink.flush().await
    }
}

/// The payload handed to a user-supplied progress callback.
#[derive(Debug, Clone)]
pub enum StepProgress<'a> {
    Started { step_index: usize, step_total: usize },
    Completed { step_index: usize, step_total: usize, step_result: &'a StepResult },
}

/// A progress callback invoked before and after each step dispatch. The
/// executor awaits its completion before moving to the next step, giving a
/// slow consumer a natural backpressure hook.
#[async_trait::async_trait]
pub trait ProgressCallback: Send + Sync {
    async fn on_progress(&self, progress: StepProgress<'_>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use enbu_flow_types::command::{Command, CommandKind};
    use enbu_flow_types::flow::ScreenshotResult;

    #[tokio::test]
    async fn emits_one_complete_json_line_per_event() {
        let mut buf = Vec::new();
        let mut emitter = ProgressEmitter::new(&mut buf);
        emitter
            .emit(&ProgressEvent::FlowStart { flow_name: "smoke".to_string(), step_total: 3 })
            .await
            .unwrap();
        emitter.emit(&ProgressEvent::StepStart { step_index: 0, step_total: 3 }).await.unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(serde_json::from_str::<serde_json::Value>(lines[0]).is_ok());
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(lines[0]).unwrap()["type"],
            "flow:start"
        );
    }

    #[test]
    fn step_complete_carries_the_step_error_message() {
        let result = StepResult {
            index: 1,
            command: Command::new(CommandKind::Wait {
                condition: enbu_flow_types::command::WaitFor::Ms(10),
            }),
            status: StepStatus::Failed,
            duration: Duration::from_millis(42),
            stdout: None,
            error: Some(enbu_flow_types::FlowError::AssertionFailed { message: "nope".to_string() }),
            screenshot: Some(ScreenshotResult::Disabled),
        };
        let event = ProgressEvent::step_complete(3, &result);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["error"], "assertion failed: nope");
    }
}
