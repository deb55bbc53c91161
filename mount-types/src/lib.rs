// SPDX-License-Identifier: GPL-3.0-only

//! Canonical data model for COSMIC Ext Archive Mount
//!
//! These types are shared by the whole stack:
//!
//! - **mount-sys**: collects a [`MountForm`] into a [`MountRequest`], turns it into
//!   an argument list and launches the external tool
//! - **mount-app**: edits a [`MountForm`] and renders [`LaunchEvent`]s

pub mod archive;
pub mod form;
pub mod launch;
pub mod request;

pub use archive::{SUPPORTED_EXTENSIONS, is_archive, is_archive_path};
pub use form::{MAX_RECURSION_DEPTH, MountForm};
pub use launch::{LaunchEvent, LaunchOutcome, LaunchResult, LaunchState};
pub use request::{LaunchMode, MountOption, MountRequest};

/// Executable name of the external mounting tool.
pub const TOOL_NAME: &str = "ratarmount";
