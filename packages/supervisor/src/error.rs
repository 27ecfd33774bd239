use std::fmt;

/// Errors raised by the supervisor itself, as distinct from anything the
/// engine it supervises reports over the progress protocol (those arrive
/// as [`crate::SupervisorEvent::Error`] instead of a `Result::Err`).
#[derive(Debug)]
pub enum SupervisorError {
    Spawn(String),
    Wait(String),
}

impl fmt::Display for SupervisorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorError::Spawn(msg) => write!(f, "failed to spawn engine process: {}", msg),
            SupervisorError::Wait(msg) => write!(f, "failed to wait on engine process: {}", msg),
        }
    }
}

impl std::error::Error for SupervisorError {}
