// SPDX-License-Identifier: GPL-3.0-only

//! Launching the external mounting tool
//!
//! Three ways to run it:
//! - foreground: wait for exit, fail with the captured standard error
//! - background: spawn and hand the child to a reaper thread
//! - streaming: spawn on tokio and forward output chunks as [`LaunchEvent`]s

use std::fmt;
use std::io::{Read, Write};
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::sync::{Arc, Mutex, mpsc};
use std::time::{Duration, Instant};

use mount_types::{
    LaunchEvent, LaunchMode, LaunchOutcome, LaunchResult, LaunchState, MountRequest, TOOL_NAME,
};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, info, warn};
use which::which;

use crate::command::build_args;
use crate::error::{MountError, Result};

/// How long output pipes are drained after the tool exited. A daemon the tool
/// started may hold them open indefinitely.
const DRAIN_AFTER_EXIT: Duration = Duration::from_millis(500);

const INSTALL_HINT: &str =
    "install it (for example with `pipx install ratarmount`) and make sure it is on PATH";

/// Wrapper around the mounting tool's command line
#[derive(Clone)]
pub struct ToolCli {
    program: PathBuf,
    /// Arguments placed before the built ones, e.g. `-m ratarmount` for `python3`.
    leading_args: Vec<String>,
}

impl ToolCli {
    /// Locates the tool on PATH.
    pub fn new() -> Result<Self> {
        let program = Self::find_binary()?;
        info!("Found {} at {:?}", TOOL_NAME, program);
        Ok(Self::with_command(program, Vec::<String>::new()))
    }

    pub fn find_binary() -> Result<PathBuf> {
        which(TOOL_NAME).map_err(|_| MountError::ToolNotFound {
            tool: TOOL_NAME.to_string(),
            hint: INSTALL_HINT.to_string(),
        })
    }

    /// Uses an explicit program instead of searching PATH.
    pub fn with_command<I, S>(program: impl Into<PathBuf>, leading_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            leading_args: leading_args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, args: &[String]) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.leading_args).args(args).stdin(Stdio::null());
        command
    }

    fn spawn_error(&self, error: std::io::Error) -> MountError {
        if error.kind() == std::io::ErrorKind::NotFound {
            MountError::ToolNotFound {
                tool: self.program.display().to_string(),
                hint: INSTALL_HINT.to_string(),
            }
        } else {
            MountError::Io(error)
        }
    }

    /// Runs one request. Foreground requests block until the tool exits.
    pub fn launch(&self, request: &MountRequest) -> Result<LaunchOutcome> {
        self.launch_args(&build_args(request), request.mode())
    }

    /// Runs the tool with an argument list exactly as given.
    ///
    /// Forwarded command lines go through here so that options the form
    /// does not know keep their position and their values.
    pub fn launch_args(&self, args: &[String], mode: LaunchMode) -> Result<LaunchOutcome> {
        let mut state = LaunchState::Idle;
        state.begin();
        debug!("Launch state {:?}: {:?} {:?}", state, self.program, args);

        let result = match mode {
            LaunchMode::Foreground => self.run_foreground(args).map(LaunchOutcome::Completed),
            LaunchMode::Background => self
                .spawn_detached(args)
                .map(|pid| LaunchOutcome::Detached { pid }),
        };

        state.finish(result.as_ref().map(|_| ()).map_err(ToString::to_string));
        match &state {
            LaunchState::Failed(message) => warn!("{} failed: {}", TOOL_NAME, message),
            _ => info!("{} launched: {:?}", TOOL_NAME, state),
        }
        result
    }

    /// Waits for the tool and captures its output.
    pub fn run_foreground(&self, args: &[String]) -> Result<LaunchResult> {
        let child = self
            .command(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let output = ChildGuard::new(child).wait_with_output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.is_empty() {
            debug!("{} output: {}", TOOL_NAME, stdout.trim_end());
        }

        let result = LaunchResult {
            exit_code: exit_code(output.status),
            stderr_text: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success() {
            warn!("{} exited with {}: {}", TOOL_NAME, result.exit_code, result.stderr_text.trim_end());
            return Err(MountError::MountFailed {
                exit_code: result.exit_code,
                stderr: result.stderr_text,
            });
        }

        Ok(result)
    }

    /// Starts the tool and returns its pid without waiting.
    pub fn spawn_detached(&self, args: &[String]) -> Result<u32> {
        let child = self
            .command(args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        Ok(ChildGuard::new(child).detach())
    }

    /// Starts the tool with piped output and forwards it as events.
    ///
    /// Must be called from within a tokio runtime. `Exited` is always the last
    /// event. It is sent once the tool exited and its output was drained for at
    /// most [`DRAIN_AFTER_EXIT`].
    pub fn spawn_streaming(&self, args: &[String]) -> Result<StreamingLaunch> {
        let mut child = tokio::process::Command::from(self.command(args))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let pid = child.id().unwrap_or_default();
        info!("Started {} with pid {}", TOOL_NAME, pid);

        let (tx, rx) = unbounded_channel();
        let sink = EventSink::new(tx);
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        tokio::spawn(async move {
            let readers: Vec<_> = [
                stdout.map(|s| tokio::spawn(forward(s, OutputStream::Stdout, sink.clone()))),
                stderr.map(|s| tokio::spawn(forward(s, OutputStream::Stderr, sink.clone()))),
            ]
            .into_iter()
            .flatten()
            .collect();

            let event = match child.wait().await {
                Ok(status) => LaunchEvent::Exited(exit_code(status)),
                Err(e) => {
                    warn!("Failed to wait for {}: {}", TOOL_NAME, e);
                    LaunchEvent::Failed(e.to_string())
                }
            };

            let drained = async {
                for reader in readers {
                    let _ = reader.await;
                }
            };
            if tokio::time::timeout(DRAIN_AFTER_EXIT, drained).await.is_err() {
                debug!("Output of {} still open after exit", TOOL_NAME);
            }
            sink.close_with(event);
        });

        Ok(StreamingLaunch::new(pid, rx))
    }

    /// Standard output of a one-off informational call, or a description of the failure.
    pub fn tool_output(&self, args: &[&str]) -> String {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let rendered = format!("{} {}", self.program.display(), args.join(" "));

        match self.command(&args).output() {
            Ok(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).into_owned()
            }
            Ok(output) => format!(
                "Failed to run {}: exit code {}\n{}",
                rendered,
                exit_code(output.status),
                String::from_utf8_lossy(&output.stderr)
            ),
            Err(e) => format!("Failed to run {}: {}", rendered, e),
        }
    }

    pub fn help_text(&self) -> String {
        self.tool_output(&["--help"])
    }

    pub fn oss_attributions(&self) -> String {
        self.tool_output(&["--oss-attributions-short"])
    }
}

impl fmt::Debug for ToolCli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolCli")
            .field("program", &self.program)
            .field("leading_args", &self.leading_args)
            .finish()
    }
}

/// Exit code, or the negated signal number for a killed process.
fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .unwrap_or_else(|| -status.signal().unwrap_or_default())
}

/// Sole owner of a spawned child.
///
/// Dropping the guard without waiting or detaching kills the child.
struct ChildGuard {
    child: Option<Child>,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    /// Waits for the child itself, then collects what its pipes delivered
    /// within [`DRAIN_AFTER_EXIT`].
    fn wait_with_output(mut self) -> std::io::Result<Output> {
        let Some(child) = self.child.as_mut() else {
            return Err(std::io::Error::other("child already released"));
        };
        let stdout = child.stdout.take().map(PipeDrain::spawn);
        let stderr = child.stderr.take().map(PipeDrain::spawn);
        let status = child.wait()?;
        self.child = None;

        let deadline = Instant::now() + DRAIN_AFTER_EXIT;
        let collect = |pipe: Option<PipeDrain>| pipe.map(|p| p.collect(deadline)).unwrap_or_default();
        Ok(Output {
            status,
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }

    /// Hands the child to a reaper thread and returns its pid.
    fn detach(mut self) -> u32 {
        let Some(mut child) = self.child.take() else {
            return 0;
        };
        let pid = child.id();
        std::thread::spawn(move || match child.wait() {
            Ok(status) => debug!("Detached {} ({}) exited: {}", TOOL_NAME, pid, status),
            Err(e) => warn!("Failed to reap detached {} ({}): {}", TOOL_NAME, pid, e),
        });
        pid
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take()
            && let Ok(None) = child.try_wait()
        {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Reads a pipe to the end on its own thread.
///
/// The thread outlives [`PipeDrain::collect`] when the pipe stays open, so
/// writers never block on a full pipe.
struct PipeDrain {
    buffer: Arc<Mutex<Vec<u8>>>,
    done: mpsc::Receiver<()>,
}

impl PipeDrain {
    fn spawn<R: Read + Send + 'static>(mut pipe: R) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, done) = mpsc::channel();
        let shared = Arc::clone(&buffer);
        std::thread::spawn(move || {
            let mut chunk = [0u8; 4096];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        if let Ok(mut buffer) = shared.lock() {
                            buffer.extend_from_slice(&chunk[..n]);
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                    Err(e) => {
                        debug!("Stopped reading output: {}", e);
                        break;
                    }
                }
            }
            let _ = done_tx.send(());
        });
        Self { buffer, done }
    }

    /// Output so far, after waiting for end of file until `deadline`.
    fn collect(self, deadline: Instant) -> Vec<u8> {
        let _ = self
            .done
            .recv_timeout(deadline.saturating_duration_since(Instant::now()));
        self.buffer
            .lock()
            .map(|mut buffer| std::mem::take(&mut *buffer))
            .unwrap_or_default()
    }
}

/// Event sender shared by the output readers. Closing it with the exit event
/// keeps that event last even if a reader is still draining.
#[derive(Clone)]
struct EventSink(Arc<Mutex<Option<UnboundedSender<LaunchEvent>>>>);

impl EventSink {
    fn new(tx: UnboundedSender<LaunchEvent>) -> Self {
        Self(Arc::new(Mutex::new(Some(tx))))
    }

    fn send(&self, event: LaunchEvent) {
        if let Ok(guard) = self.0.lock()
            && let Some(tx) = guard.as_ref()
        {
            let _ = tx.send(event);
        }
    }

    fn close_with(&self, event: LaunchEvent) {
        if let Ok(mut guard) = self.0.lock()
            && let Some(tx) = guard.take()
        {
            let _ = tx.send(event);
        }
    }
}

/// Decodes a byte stream chunk by chunk without splitting characters.
#[derive(Debug, Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let tail = self.pending.split_off(self.pending.len() - incomplete_tail(&self.pending));
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending = tail;
        text
    }

    fn finish(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text
    }
}

/// Length of a truncated multi-byte sequence at the end of `bytes`.
fn incomplete_tail(bytes: &[u8]) -> usize {
    let start = bytes.len().saturating_sub(3);
    (start..bytes.len())
        .rev()
        .find(|&i| {
            matches!(std::str::from_utf8(&bytes[i..]),
                Err(e) if e.valid_up_to() == 0 && e.error_len().is_none())
        })
        .map_or(0, |i| bytes.len() - i)
}

#[derive(Debug, Clone, Copy)]
enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    fn event(self, text: String) -> LaunchEvent {
        match self {
            OutputStream::Stdout => LaunchEvent::Stdout(text),
            OutputStream::Stderr => LaunchEvent::Stderr(text),
        }
    }

    fn echo(self, text: &str) {
        let _ = match self {
            OutputStream::Stdout => {
                let mut out = std::io::stdout().lock();
                out.write_all(text.as_bytes()).and_then(|_| out.flush())
            }
            OutputStream::Stderr => {
                let mut err = std::io::stderr().lock();
                err.write_all(text.as_bytes()).and_then(|_| err.flush())
            }
        };
    }
}

async fn forward<R>(mut reader: R, stream: OutputStream, sink: EventSink)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; 4096];
    let mut decoder = Utf8Decoder::default();
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            // Keep draining after the receiver is gone so the child never blocks on a full pipe.
            Ok(n) => emit(stream, &sink, decoder.decode(&buf[..n])),
            Err(e) => {
                debug!("Stopped reading {:?}: {}", stream, e);
                break;
            }
        }
    }
    emit(stream, &sink, decoder.finish());
}

fn emit(stream: OutputStream, sink: &EventSink, text: String) {
    if text.is_empty() {
        return;
    }
    stream.echo(&text);
    sink.send(stream.event(text));
}

/// A running streamed launch. Clones share one event receiver, taken once.
#[derive(Clone)]
pub struct StreamingLaunch {
    pid: u32,
    events: Arc<Mutex<Option<UnboundedReceiver<LaunchEvent>>>>,
}

impl StreamingLaunch {
    pub fn new(pid: u32, events: UnboundedReceiver<LaunchEvent>) -> Self {
        Self {
            pid,
            events: Arc::new(Mutex::new(Some(events))),
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn take_events(&self) -> Option<UnboundedReceiver<LaunchEvent>> {
        self.events.lock().ok().and_then(|mut events| events.take())
    }
}

impl fmt::Debug for StreamingLaunch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingLaunch")
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

impl PartialEq for StreamingLaunch {
    fn eq(&self, other: &Self) -> bool {
        self.pid == other.pid && Arc::ptr_eq(&self.events, &other.events)
    }
}

/// Asks a running tool to stop, like Ctrl+C would. A process that is already gone is fine.
pub fn interrupt(pid: u32) -> Result<()> {
    let raw = i32::try_from(pid).unwrap_or_default();
    if raw <= 1 {
        return Err(MountError::InvalidInput(format!(
            "refusing to signal process {pid}"
        )));
    }

    match kill(Pid::from_raw(raw), Signal::SIGINT) {
        Ok(()) => {
            info!("Sent SIGINT to {}", pid);
            Ok(())
        }
        Err(nix::Error::ESRCH) => {
            debug!("Process {} already exited", pid);
            Ok(())
        }
        Err(e) => Err(MountError::Io(e.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell_tool(script: &str) -> ToolCli {
        ToolCli::with_command("/bin/sh", ["-c", script, TOOL_NAME])
    }

    fn request(mode: LaunchMode) -> MountRequest {
        MountRequest::new(
            vec!["archive.tar".into()],
            Some("/tmp/never-mounted".into()),
            Vec::new(),
            mode,
        )
    }

    #[test]
    fn foreground_failure_carries_stderr() {
        let tool = shell_tool("echo 'bad archive' >&2; exit 1");
        let err = tool
            .launch(&request(LaunchMode::Foreground))
            .expect_err("tool exits with 1");

        match err {
            MountError::MountFailed { exit_code, stderr } => {
                assert_eq!(exit_code, 1);
                assert_eq!(stderr.trim_end(), "bad archive");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn foreground_receives_built_arguments() {
        let tool = shell_tool(r#"[ "$1" = archive.tar ] && [ "$2" = /tmp/never-mounted ]"#);
        let outcome = tool
            .launch(&request(LaunchMode::Foreground))
            .expect("arguments match");
        assert!(matches!(outcome, LaunchOutcome::Completed(result) if result.success()));
    }

    #[test]
    fn background_returns_without_waiting() {
        let tool = shell_tool("sleep 5");
        let started = Instant::now();
        let outcome = tool
            .launch(&request(LaunchMode::Background))
            .expect("spawns");

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(matches!(outcome, LaunchOutcome::Detached { pid } if pid > 0));
    }

    #[test]
    fn missing_program_is_tool_not_found() {
        let tool = ToolCli::with_command("/nonexistent/bin/ratarmount", Vec::<String>::new());
        let err = tool
            .launch(&request(LaunchMode::Foreground))
            .expect_err("nothing to run");
        assert!(matches!(err, MountError::ToolNotFound { .. }));
    }

    #[test]
    fn tool_output_reports_failures() {
        assert_eq!(shell_tool("echo usage").help_text(), "usage\n");
        assert!(shell_tool("exit 2").help_text().starts_with("Failed to run"));
    }

    #[test]
    fn refuses_to_signal_init() {
        assert!(matches!(interrupt(1), Err(MountError::InvalidInput(_))));
        assert!(matches!(interrupt(0), Err(MountError::InvalidInput(_))));
    }

    async fn drain(launch: &StreamingLaunch) -> Vec<LaunchEvent> {
        let mut events = launch.take_events().expect("first take");
        let mut collected = Vec::new();
        while let Some(event) = events.recv().await {
            collected.push(event);
        }
        collected
    }

    #[tokio::test]
    async fn streaming_ends_with_exit_code() {
        let tool = shell_tool("echo hello; echo oops >&2; exit 3");
        let launch = tool.spawn_streaming(&[]).expect("spawns");
        let events = drain(&launch).await;

        assert_eq!(events.last(), Some(&LaunchEvent::Exited(3)));
        let stdout: String = events
            .iter()
            .filter_map(|e| match e {
                LaunchEvent::Stdout(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(stdout, "hello\n");
        assert!(events.contains(&LaunchEvent::Stderr("oops\n".into())));
        assert!(launch.take_events().is_none());
    }

    #[tokio::test]
    async fn interrupt_stops_streamed_tool() {
        let tool = shell_tool("exec sleep 30");
        let launch = tool.spawn_streaming(&[]).expect("spawns");
        interrupt(launch.pid()).expect("signal delivered");

        let events = tokio::time::timeout(Duration::from_secs(10), drain(&launch))
            .await
            .expect("tool stops");
        assert_eq!(events.last(), Some(&LaunchEvent::Exited(-(Signal::SIGINT as i32))));
    }

    #[test]
    fn arguments_are_passed_in_the_given_order() {
        let tool = shell_tool(
            r#"[ "$*" = "a.zip /mnt/x -o allow_other --index-file idx.sqlite" ]"#,
        );
        let args: Vec<String> = ["a.zip", "/mnt/x", "-o", "allow_other", "--index-file", "idx.sqlite"]
            .map(String::from)
            .to_vec();
        let outcome = tool
            .launch_args(&args, LaunchMode::Foreground)
            .expect("order kept");
        assert!(matches!(outcome, LaunchOutcome::Completed(result) if result.success()));
    }

    #[test]
    fn foreground_returns_when_tool_exits() {
        let tool = shell_tool("echo done; sleep 5 & exit 0");
        let started = Instant::now();
        let result = tool.run_foreground(&[]).expect("exits with 0");

        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(result.success());
    }

    #[tokio::test]
    async fn exit_is_reported_while_a_daemon_holds_the_output() {
        let tool = shell_tool("echo started; sleep 5 & exit 0");
        let launch = tool.spawn_streaming(&[]).expect("spawns");
        let started = Instant::now();

        let events = tokio::time::timeout(Duration::from_secs(3), drain(&launch))
            .await
            .expect("exit does not wait for the daemon");
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(events.last(), Some(&LaunchEvent::Exited(0)));
        assert!(events.contains(&LaunchEvent::Stdout("started\n".into())));
    }

    #[test]
    fn characters_split_across_reads_survive() {
        let bytes = "é€ ok".as_bytes();
        let mut decoder = Utf8Decoder::default();

        let mut text = decoder.decode(&bytes[..1]);
        assert_eq!(text, "");
        text.push_str(&decoder.decode(&bytes[1..3]));
        text.push_str(&decoder.decode(&bytes[3..]));
        text.push_str(&decoder.finish());
        assert_eq!(text, "é€ ok");
    }

    #[test]
    fn invalid_bytes_are_replaced_not_held_back() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{fffd}b");
        assert_eq!(decoder.decode(&[0xe2, 0x82]), "");
        assert_eq!(decoder.finish(), "\u{fffd}");
    }
}
