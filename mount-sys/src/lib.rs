// SPDX-License-Identifier: GPL-3.0-only

//! System side of the archive mount front-end
//!
//! This crate turns user settings into a running `ratarmount` process:
//! - Option collection and validation
//! - Argument list construction and parsing
//! - Process launching, streaming and interruption
//! - The file-manager context-menu provider

pub mod collector;
pub mod command;
pub mod error;
pub mod extension;
pub mod launcher;
pub mod mounts;
pub mod validate;

pub use collector::{MountProbe, OptionCollector};
pub use command::{build_args, form_args, parse_args, parse_preview, render_preview, split_preview};
pub use error::{MountError, Result};
pub use extension::{ArchiveMenuProvider, FileManagerHost, FrontendLauncher, MenuItem, ScriptHost};
pub use launcher::{StreamingLaunch, ToolCli, interrupt};
pub use mounts::ProcMounts;
