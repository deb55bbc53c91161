// SPDX-License-Identifier: GPL-3.0-only

//! App-level state types.

use crate::config::Config;
use crate::fl;
use crate::ui::app::message::{Message, StartFailure};
use crate::ui::form::FormState;
use cosmic::ApplicationExt;
use cosmic::app::{Core, Task};
use mount_sys::{MountError, StreamingLaunch, ToolCli};
use mount_types::{LaunchEvent, LaunchState, TOOL_NAME};

/// The context page to display in the context drawer.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ContextPage {
    #[default]
    Help,
    About,
    Settings,
}

/// Which of the two window pages is visible.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Page {
    #[default]
    Config,
    Execution,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolMissing {
    pub tool: String,
    pub hint: String,
}

impl ToolMissing {
    pub fn from_error(error: &MountError) -> Option<Self> {
        match error {
            MountError::ToolNotFound { tool, hint } => Some(Self {
                tool: tool.clone(),
                hint: hint.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ShowDialog {
    ToolNotFound(ToolMissing),
}

/// Tool run shown on the execution page.
#[derive(Debug, Default)]
pub struct Execution {
    pub state: LaunchState,
    /// Present while the tool runs; drives the output subscription.
    pub launch: Option<StreamingLaunch>,
    pub log: String,
    pub return_code: Option<i32>,
}

impl Execution {
    /// Takes over a running launch with an empty log.
    pub fn start(&mut self, launch: StreamingLaunch) {
        self.state.begin();
        self.launch = Some(launch);
        self.log.clear();
    }

    /// Records one piece of output or the end of the run.
    ///
    /// Returns true once the tool exited successfully.
    pub fn record(&mut self, event: LaunchEvent) -> bool {
        match event {
            LaunchEvent::Stdout(text) | LaunchEvent::Stderr(text) => {
                self.log.push_str(&text);
                false
            }
            LaunchEvent::Exited(code) => {
                self.launch = None;
                self.return_code = Some(code);
                if code == 0 {
                    self.state.finish(Ok(()));
                    return true;
                }

                tracing::warn!(code, "{} exited", TOOL_NAME);
                let message = fl!("tool-exited", tool = TOOL_NAME, code = code);
                self.push_line(&message);
                self.state.finish(Err(message));
                false
            }
            LaunchEvent::Failed(message) => {
                self.launch = None;
                // The exit status is unknown; Close must not report success.
                self.return_code = Some(1);
                tracing::error!(%message, "lost track of {}", TOOL_NAME);
                self.push_line(&message);
                self.state.finish(Err(message));
                false
            }
        }
    }

    pub fn push_line(&mut self, line: &str) {
        if !self.log.is_empty() && !self.log.ends_with('\n') {
            self.log.push('\n');
        }
        self.log.push_str(line);
        self.log.push('\n');
    }

    /// Code the application leaves with: the tool's, or 0 if it never ran.
    pub fn exit_code(&self) -> i32 {
        self.return_code.unwrap_or(0)
    }
}

/// A launch started before the window existed.
#[derive(Debug, Clone)]
pub struct StartedLaunch {
    pub launch: StreamingLaunch,
    /// Events already received, replayed into the log on startup.
    pub early_events: Vec<LaunchEvent>,
}

/// Data the window is started with.
#[derive(Debug, Clone)]
pub struct Flags {
    /// Forwarded tool arguments, stored defaults included; they prefill the form.
    pub args: Vec<String>,
    pub tool: Result<ToolCli, ToolMissing>,
    pub require_mount_point: bool,
    pub started: Option<StartedLaunch>,
    /// Why an automatic mount did not start.
    pub rejection: Option<StartFailure>,
}

/// The application model stores app-specific state used to describe its interface and
/// drive its logic.
pub struct AppModel {
    /// Application state which is managed by the COSMIC runtime.
    pub(crate) core: Core,
    /// Display a context drawer with the designated page if defined.
    pub(crate) context_page: ContextPage,
    // Configuration data that persists between application runs.
    pub(crate) config: Config,
    pub(crate) page: Page,
    pub(crate) dialog: Option<ShowDialog>,

    pub(crate) tool: Result<ToolCli, ToolMissing>,
    pub(crate) require_mount_point: bool,
    pub(crate) form: FormState,

    pub(crate) execution: Execution,

    /// Cached `--help` and attribution output of the tool.
    pub(crate) help_text: Option<String>,
    pub(crate) attributions: Option<String>,
}

impl AppModel {
    /// Updates the header and window titles.
    pub fn update_title(&mut self) -> Task<Message> {
        let mut window_title = fl!("app-title");

        if self.page == Page::Execution {
            window_title.push_str(" - ");
            window_title.push_str(TOOL_NAME);
        }

        if let Some(id) = self.core.main_window_id() {
            self.set_window_title(window_title, id)
        } else {
            Task::none()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    fn running() -> Execution {
        let (_tx, rx) = unbounded_channel();
        let mut execution = Execution::default();
        execution.start(StreamingLaunch::new(4242, rx));
        execution
    }

    #[test]
    fn lost_process_exits_with_failure() {
        let mut execution = running();
        assert!(!execution.record(LaunchEvent::Stderr("reading archive\n".into())));
        assert!(!execution.record(LaunchEvent::Failed("wait failed".into())));

        assert!(execution.launch.is_none());
        assert_eq!(execution.exit_code(), 1);
        assert_eq!(execution.state, LaunchState::Failed("wait failed".into()));
        assert_eq!(execution.log, "reading archive\nwait failed\n");
    }

    #[test]
    fn exit_code_follows_the_tool() {
        let mut execution = running();
        assert!(!execution.record(LaunchEvent::Exited(2)));
        assert_eq!(execution.exit_code(), 2);
        assert!(matches!(execution.state, LaunchState::Failed(_)));

        let mut execution = running();
        assert!(execution.record(LaunchEvent::Exited(0)));
        assert_eq!(execution.state, LaunchState::Succeeded);

        assert_eq!(Execution::default().exit_code(), 0);
    }
}
