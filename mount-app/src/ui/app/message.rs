// SPDX-License-Identifier: GPL-3.0-only

use crate::config::Config;
use crate::ui::app::state::{ContextPage, ToolMissing};
use mount_sys::{MountError, StreamingLaunch};
use mount_types::LaunchEvent;

/// Which path field a file chooser fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPickerKind {
    Source(usize),
    MountPoint,
    WriteOverlay,
}

/// Why the tool could not be started.
#[derive(Debug, Clone)]
pub enum StartFailure {
    ToolNotFound(ToolMissing),
    Other(String),
}

impl From<MountError> for StartFailure {
    fn from(error: MountError) -> Self {
        match ToolMissing::from_error(&error) {
            Some(missing) => StartFailure::ToolNotFound(missing),
            None => StartFailure::Other(error.to_string()),
        }
    }
}

/// Messages emitted by the application and its widgets.
#[derive(Debug, Clone)]
pub enum Message {
    OpenRepositoryUrl,
    LaunchUrl(String),
    ToggleContextPage(ContextPage),
    ToolTextLoaded(ContextPage, String),
    UpdateConfig(Config),
    CloseDialog,
    None,

    // Configuration page
    SourceChanged(usize, String),
    RemoveSource(usize),
    MoveSourceUp(usize),
    MoveSourceDown(usize),
    MountPointChanged(String),
    PasswordChanged(String),
    RecursiveToggled(bool),
    RecursionDepthChanged(String),
    LazyToggled(bool),
    StripTarExtensionToggled(bool),
    WriteOverlayChanged(String),
    UnionMountToggled(bool),
    ToggleAdvanced,
    PreviewChanged(String),
    OpenPathPicker(PathPickerKind),
    PathPicked(PathPickerKind, Option<String>),
    Mount,
    Cancel,

    // Execution page
    Launched(Result<StreamingLaunch, StartFailure>),
    Launch(LaunchEvent),
    Abort,
    Close,

    // Settings
    LogLevelChanged(usize),
    ToggleLogToDisk(bool),
    ToggleDefaultUnionMount(bool),
    ToggleDefaultRecursive(bool),
}
