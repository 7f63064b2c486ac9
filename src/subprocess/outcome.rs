use serde::Serialize;
use std::fmt;

use super::error::ProcessError;
use super::runner::{ExitStatus, ProcessOutput};

/// Result of invoking one external command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum CommandOutcome {
    Success,
    NonZeroExit(i32),
    Signalled(i32),
    TimedOut,
    /// The command never ran: missing binary or spawn error
    LaunchFailed(String),
    /// The background task driving the command panicked or was cancelled
    TaskFailed(String),
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Success)
    }

    pub fn from_result(result: Result<ProcessOutput, ProcessError>) -> Self {
        match result {
            Ok(output) => Self::from(&output.status),
            Err(ProcessError::Timeout(_)) => CommandOutcome::TimedOut,
            Err(e) => CommandOutcome::LaunchFailed(e.to_string()),
        }
    }
}

impl From<&ExitStatus> for CommandOutcome {
    fn from(status: &ExitStatus) -> Self {
        match status {
            ExitStatus::Success => CommandOutcome::Success,
            ExitStatus::Error(code) => CommandOutcome::NonZeroExit(*code),
            ExitStatus::Signal(sig) => CommandOutcome::Signalled(*sig),
        }
    }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutcome::Success => write!(f, "ok"),
            CommandOutcome::NonZeroExit(code) => write!(f, "exited with code {}", code),
            CommandOutcome::Signalled(sig) => write!(f, "terminated by signal {}", sig),
            CommandOutcome::TimedOut => write!(f, "timed out"),
            CommandOutcome::LaunchFailed(reason) => write!(f, "failed to launch: {}", reason),
            CommandOutcome::TaskFailed(reason) => write!(f, "archive task failed: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn output(status: ExitStatus) -> ProcessOutput {
        ProcessOutput {
            status,
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_from_result() {
        assert_eq!(
            CommandOutcome::from_result(Ok(output(ExitStatus::Success))),
            CommandOutcome::Success
        );
        assert_eq!(
            CommandOutcome::from_result(Ok(output(ExitStatus::Error(2)))),
            CommandOutcome::NonZeroExit(2)
        );
        assert_eq!(
            CommandOutcome::from_result(Err(ProcessError::Timeout(Duration::from_secs(1)))),
            CommandOutcome::TimedOut
        );
        assert!(matches!(
            CommandOutcome::from_result(Err(ProcessError::CommandNotFound("zip".into()))),
            CommandOutcome::LaunchFailed(reason) if reason.contains("zip")
        ));
    }

    #[test]
    fn test_serializes_with_status_tag() {
        let json = serde_json::to_value(CommandOutcome::NonZeroExit(3)).unwrap();
        assert_eq!(json, serde_json::json!({"status": "non_zero_exit", "detail": 3}));
        let json = serde_json::to_value(CommandOutcome::Success).unwrap();
        assert_eq!(json, serde_json::json!({"status": "success"}));
        let json = serde_json::to_value(CommandOutcome::TaskFailed("panicked".into())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "task_failed", "detail": "panicked"})
        );
    }
}
