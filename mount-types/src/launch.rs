use serde::{Deserialize, Serialize};

/// Lifecycle of one launch. Terminal after the first transition out of `Launching`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum LaunchState {
    #[default]
    Idle,
    Launching,
    Succeeded,
    Failed(String),
}

impl LaunchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LaunchState::Succeeded | LaunchState::Failed(_))
    }

    pub fn is_running(&self) -> bool {
        matches!(self, LaunchState::Launching)
    }

    /// Moves `Idle` to `Launching`; any other state is left alone.
    pub fn begin(&mut self) -> bool {
        if *self == LaunchState::Idle {
            *self = LaunchState::Launching;
            true
        } else {
            false
        }
    }

    /// Settles a running launch. Returns false if it was not running.
    pub fn finish(&mut self, result: Result<(), String>) -> bool {
        if !self.is_running() {
            return false;
        }
        *self = match result {
            Ok(()) => LaunchState::Succeeded,
            Err(message) => LaunchState::Failed(message),
        };
        true
    }
}

/// Exit status and captured standard error of a finished tool run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchResult {
    /// Negative values carry the terminating signal number.
    pub exit_code: i32,
    pub stderr_text: String,
}

impl LaunchResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// What the launcher hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    Completed(LaunchResult),
    Detached { pid: u32 },
}

/// Output of a streamed launch, in the order it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchEvent {
    Stdout(String),
    Stderr(String),
    Exited(i32),
    /// The process could not be awaited; no `Exited` follows.
    Failed(String),
}
