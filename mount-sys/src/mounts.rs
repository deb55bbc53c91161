// SPDX-License-Identifier: GPL-3.0-only

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::collector::MountProbe;

const MOUNTINFO_PATH: &str = "/proc/self/mountinfo";

/// Mount table of the current mount namespace.
#[derive(Debug, Clone, Default)]
pub struct ProcMounts;

impl MountProbe for ProcMounts {
    fn is_mounted(&self, path: &Path) -> bool {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        match fs::read_to_string(MOUNTINFO_PATH) {
            Ok(table) => mount_points(&table).contains(&canonical),
            Err(e) => {
                debug!("Cannot read {}: {}; assuming not mounted", MOUNTINFO_PATH, e);
                false
            }
        }
    }
}

/// Mount points listed in a mountinfo table. Malformed lines are skipped.
pub fn mount_points(input: &str) -> BTreeSet<PathBuf> {
    input
        .lines()
        .filter_map(|line| line.split_whitespace().nth(4))
        .map(|field| PathBuf::from(unescape_mount_field(field)))
        .collect()
}

/// Decodes the `\ooo` octal escapes the kernel uses for whitespace in paths.
fn unescape_mount_field(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut output = Vec::with_capacity(bytes.len());
    let mut index = 0;

    while index < bytes.len() {
        if bytes[index] == b'\\'
            && index + 3 < bytes.len()
            && bytes[index + 1..index + 4].iter().all(|b| (b'0'..=b'7').contains(b))
        {
            let octal = &value[index + 1..index + 4];
            if let Ok(num) = u8::from_str_radix(octal, 8) {
                output.push(num);
                index += 4;
                continue;
            }
        }

        output.push(bytes[index]);
        index += 1;
    }

    String::from_utf8_lossy(&output).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "36 25 8:2 / / rw,relatime - ext4 /dev/nvme0n1p2 rw\n\
        37 25 0:5 / /proc rw,nosuid - proc proc rw\n\
        90 36 0:61 / /home/user/My\\040Archive rw,nosuid - fuse.ratarmount ratarmount rw\n\
        garbage\n";

    #[test]
    fn lists_mount_points_with_escapes() {
        let mounts = mount_points(SAMPLE);
        assert!(mounts.contains(Path::new("/")));
        assert!(mounts.contains(Path::new("/proc")));
        assert!(mounts.contains(Path::new("/home/user/My Archive")));
        assert_eq!(mounts.len(), 3);
    }

    #[test]
    fn leaves_incomplete_escapes_alone() {
        assert_eq!(unescape_mount_field("/a\\04"), "/a\\04");
        assert_eq!(unescape_mount_field("/tab\\011end"), "/tab\tend");
    }

    #[test]
    fn root_is_mounted() {
        assert!(ProcMounts.is_mounted(Path::new("/")) || !Path::new(MOUNTINFO_PATH).exists());
    }
}
