// SPDX-License-Identifier: GPL-3.0-only

//! Inline field checks for the form.
//!
//! These only decide whether a field is highlighted; the tool has the final say.

use std::path::Path;

use nix::unistd::{AccessFlags, access};

fn is_writable_dir(path: &Path) -> bool {
    path.is_dir() && access(path, AccessFlags::W_OK).is_ok()
}

/// A source entry is flagged when it is filled in but is not an existing file.
pub fn source_error(path: &str) -> Option<String> {
    if path.is_empty() || Path::new(path).is_file() {
        None
    } else {
        Some(format!("{path} is not an existing file"))
    }
}

/// The closest existing ancestor of the mount point must be a writable directory.
pub fn mount_point_error(mount_point: &str) -> Option<String> {
    if mount_point.is_empty() {
        return None;
    }

    let mut candidate = Some(Path::new(mount_point));
    while let Some(path) = candidate {
        if path.as_os_str().is_empty() {
            // Relative path with no existing ancestor; resolved against the cwd.
            return None;
        }
        if path.exists() {
            return if is_writable_dir(path) {
                None
            } else {
                Some(format!("{} is not a writable folder", path.display()))
            };
        }
        candidate = path.parent();
    }

    None
}

pub fn write_overlay_error(overlay: &str) -> Option<String> {
    if overlay.is_empty() || is_writable_dir(Path::new(overlay)) {
        None
    } else {
        Some(format!("{overlay} is not a writable folder"))
    }
}
