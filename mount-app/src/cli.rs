// SPDX-License-Identifier: GPL-3.0-only

//! Command line of the front-end and the paths that run without the form.

use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use clap::Parser;
use mount_sys::extension::FORCE_ENV;
use mount_sys::{MountError, OptionCollector, StreamingLaunch, ToolCli};
use mount_types::{LaunchEvent, LaunchMode, LaunchOutcome, TOOL_NAME};
use tracing::{info, warn};

use crate::ui::app::message::StartFailure;
use crate::ui::app::state::{StartedLaunch, ToolMissing};

/// Older integrations still set this one.
pub const LEGACY_FORCE_ENV: &str = "RATARMOUNT_UI_FORCE";

/// How long an automatic mount may run before the window is shown.
const SHOW_WINDOW_AFTER: Duration = Duration::from_secs(1);

/// Mount archives with ratarmount.
///
/// Arguments after the options are ratarmount arguments and prefill the window.
#[derive(Parser, Debug, Clone)]
#[command(name = "cosmic-ext-archive-mount", version, about)]
pub struct Cli {
    /// Mount right away; the window only opens if mounting is slow or fails
    #[arg(long)]
    pub mount_now: bool,

    /// Reject requests without an explicit mount point
    #[arg(long)]
    pub require_mount_point: bool,

    /// Command used instead of ratarmount from PATH, e.g. "python3 -m ratarmount"
    #[arg(long, value_name = "COMMAND")]
    pub tool: Option<String>,

    /// Print the argument list as a JSON array and exit
    #[arg(long)]
    pub print_command: bool,

    /// Mount without any window and exit with the tool's code
    #[arg(long)]
    pub no_window: bool,

    /// With --no-window, return as soon as the tool started
    #[arg(long, requires = "no_window")]
    pub detach: bool,

    /// Arguments forwarded to ratarmount
    #[arg(
        value_name = "RATARMOUNT_ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,
}

impl Cli {
    pub fn collector(&self) -> OptionCollector {
        OptionCollector::new().require_mount_point(self.require_mount_point)
    }

    /// Checks the forwarded arguments the way the Mount button does.
    ///
    /// The arguments are launched as given; the collected request only decides
    /// whether they may be.
    pub fn validate(&self, mode: LaunchMode) -> mount_sys::Result<()> {
        self.collector().collect_args(&self.args, mode).map(|_| ())
    }

    pub fn force_requested(&self) -> bool {
        self.mount_now || force_env_set(|key| std::env::var(key).ok())
    }
}

pub fn force_env_set(lookup: impl Fn(&str) -> Option<String>) -> bool {
    [FORCE_ENV, LEGACY_FORCE_ENV]
        .into_iter()
        .any(|key| lookup(key).as_deref() == Some("yes"))
}

/// The tool from `--tool`, or from PATH. A missing tool is not fatal for the window.
pub fn resolve_tool(command: Option<&str>) -> anyhow::Result<Result<ToolCli, ToolMissing>> {
    let Some(command) = command else {
        return Ok(ToolCli::new().map_err(|e| {
            ToolMissing::from_error(&e).unwrap_or_else(|| ToolMissing {
                tool: TOOL_NAME.to_string(),
                hint: e.to_string(),
            })
        }));
    };

    let mut words = shlex::split(command).ok_or_else(|| anyhow!("--tool has unbalanced quotes"))?;
    if words.is_empty() {
        bail!("--tool is empty");
    }
    let program = words.remove(0);
    Ok(Ok(ToolCli::with_command(program, words)))
}

pub fn print_command(cli: &Cli) -> anyhow::Result<()> {
    cli.validate(LaunchMode::Foreground)?;
    let json = serde_json::to_string(&cli.args).context("encode arguments")?;
    println!("{json}");
    Ok(())
}

/// Runs the tool without a window and returns the exit code to leave with.
pub fn run_without_window(cli: &Cli, tool: Result<ToolCli, ToolMissing>) -> anyhow::Result<i32> {
    let mode = if cli.detach {
        LaunchMode::Background
    } else {
        LaunchMode::Foreground
    };
    cli.validate(mode)?;
    let tool = tool.map_err(|missing| anyhow!("{} not found: {}", missing.tool, missing.hint))?;

    match tool.launch_args(&cli.args, mode) {
        Ok(LaunchOutcome::Completed(result)) => Ok(result.exit_code),
        Ok(LaunchOutcome::Detached { pid }) => {
            info!(pid, "{} keeps running in the background", TOOL_NAME);
            Ok(0)
        }
        Err(MountError::MountFailed { exit_code, stderr }) => {
            eprint!("{stderr}");
            Ok(exit_code)
        }
        Err(e) => Err(e.into()),
    }
}

/// Result of an automatic mount attempt made before the window exists.
#[derive(Debug)]
pub enum QuickMount {
    Mounted,
    /// Still running or failed; the window takes over.
    Pending(StartedLaunch),
}

/// Starts the tool and waits up to [`SHOW_WINDOW_AFTER`] for it to finish.
///
/// Must run inside the tokio runtime that keeps driving the launch afterwards.
pub async fn mount_now(
    cli: &Cli,
    tool: &Result<ToolCli, ToolMissing>,
) -> Result<QuickMount, StartFailure> {
    cli.validate(LaunchMode::Foreground)
        .map_err(StartFailure::from)?;
    let tool = tool
        .as_ref()
        .map_err(|missing| StartFailure::ToolNotFound(missing.clone()))?;

    let launch = tool
        .spawn_streaming(&cli.args)
        .map_err(StartFailure::from)?;
    let Some(mut events) = launch.take_events() else {
        return Err(StartFailure::Other("launch events unavailable".to_string()));
    };

    let mut early_events = Vec::new();
    let deadline = tokio::time::sleep(SHOW_WINDOW_AFTER);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            event = events.recv() => match event {
                Some(LaunchEvent::Exited(0)) => return Ok(QuickMount::Mounted),
                Some(event) => {
                    let finished = matches!(event, LaunchEvent::Exited(_) | LaunchEvent::Failed(_));
                    early_events.push(event);
                    if finished {
                        warn!("{} failed during automatic mount", TOOL_NAME);
                        break;
                    }
                }
                None => break,
            },
        }
    }

    Ok(QuickMount::Pending(StartedLaunch {
        launch: StreamingLaunch::new(launch.pid(), events),
        early_events,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cosmic-ext-archive-mount").chain(args.iter().copied()))
            .expect("valid command line")
    }

    #[test]
    fn forwards_tool_arguments_verbatim() {
        let cli = parse(&["--mount-now", "a.zip", "-r", "--password", "x", "/mnt/a"]);
        assert!(cli.mount_now);
        assert_eq!(cli.args, vec!["a.zip", "-r", "--password", "x", "/mnt/a"]);

        let cli = parse(&["--", "--recursive", "a.zip"]);
        assert_eq!(cli.args, vec!["--recursive", "a.zip"]);
    }

    #[test]
    fn detach_needs_no_window() {
        let args = ["cosmic-ext-archive-mount", "--detach", "a.zip"];
        assert!(Cli::try_parse_from(args).is_err());
        let cli = parse(&["--no-window", "--detach", "a.zip"]);
        assert!(cli.no_window && cli.detach);
    }

    #[test]
    fn force_env_needs_yes() {
        assert!(force_env_set(|key| (key == FORCE_ENV).then(|| "yes".to_string())));
        assert!(force_env_set(|key| (key == LEGACY_FORCE_ENV).then(|| "yes".to_string())));
        assert!(!force_env_set(|_| Some("no".to_string())));
        assert!(!force_env_set(|_| None));
    }

    #[test]
    fn tool_override_is_shell_split() {
        let tool = resolve_tool(Some("python3 -m 'ratarmount'"))
            .expect("valid")
            .expect("explicit command");
        assert_eq!(tool.program(), std::path::Path::new("python3"));

        assert!(resolve_tool(Some("'broken")).is_err());
        assert!(resolve_tool(Some("   ")).is_err());
    }

    fn shell_tool(script: &str) -> Result<ToolCli, ToolMissing> {
        Ok(ToolCli::with_command("/bin/sh", ["-c", script, TOOL_NAME]))
    }

    #[tokio::test]
    async fn quick_success_needs_no_window() {
        let cli = parse(&["a.zip"]);
        let outcome = mount_now(&cli, &shell_tool("exit 0")).await.expect("starts");
        assert!(matches!(outcome, QuickMount::Mounted));
    }

    #[tokio::test]
    async fn failure_hands_output_to_window() {
        let cli = parse(&["a.zip"]);
        let outcome = mount_now(&cli, &shell_tool("echo broken >&2; exit 2"))
            .await
            .expect("starts");

        let QuickMount::Pending(started) = outcome else {
            panic!("failure must open the window");
        };
        assert!(started.early_events.contains(&LaunchEvent::Stderr("broken\n".into())));
        assert_eq!(started.early_events.last(), Some(&LaunchEvent::Exited(2)));
    }

    #[tokio::test]
    async fn slow_tool_hands_over_running_launch() {
        let cli = parse(&["a.zip"]);
        let outcome = mount_now(&cli, &shell_tool("sleep 5")).await.expect("starts");

        let QuickMount::Pending(started) = outcome else {
            panic!("slow mount must open the window");
        };
        assert!(started.early_events.is_empty());
        assert!(started.launch.take_events().is_some());
        mount_sys::interrupt(started.launch.pid()).expect("signal delivered");
    }

    #[tokio::test]
    async fn missing_source_is_rejected_before_starting() {
        let cli = parse(&[]);
        let result = mount_now(&cli, &shell_tool("exit 0")).await;
        assert!(matches!(result, Err(StartFailure::Other(_))));

        let missing = Err(ToolMissing {
            tool: TOOL_NAME.to_string(),
            hint: "install it".to_string(),
        });
        let result = mount_now(&parse(&["a.zip"]), &missing).await;
        assert!(matches!(result, Err(StartFailure::ToolNotFound(_))));
    }

    #[test]
    fn no_window_forwards_arguments_as_given() {
        let cli = parse(&["--no-window", "a.zip", "/nonexistent/mnt", "-o", "allow_other"]);
        let tool = shell_tool(r#"[ "$*" = "a.zip /nonexistent/mnt -o allow_other" ] || exit 7"#);
        assert_eq!(run_without_window(&cli, tool).expect("runs"), 0);
    }

    #[tokio::test]
    async fn automatic_mount_forwards_arguments_as_given() {
        let cli = parse(&["a.zip", "--index-file", "idx.sqlite", "/nonexistent/mnt"]);
        let tool = shell_tool(
            r#"[ "$*" = "a.zip --index-file idx.sqlite /nonexistent/mnt" ] || { echo "$*" >&2; exit 7; }"#,
        );
        let outcome = mount_now(&cli, &tool).await.expect("starts");
        assert!(matches!(outcome, QuickMount::Mounted));
    }

    #[tokio::test]
    async fn daemonizing_tool_still_mounts_quickly() {
        let cli = parse(&["a.zip"]);
        let outcome = mount_now(&cli, &shell_tool("sleep 5 & exit 0"))
            .await
            .expect("starts");
        assert!(matches!(outcome, QuickMount::Mounted));
    }
}
