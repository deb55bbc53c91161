// SPDX-License-Identifier: GPL-3.0-only

//! File-manager context menu integration
//!
//! The host file manager is reached only through [`FileManagerHost`], so the
//! same provider works for any host that can list the selection and attach a
//! menu entry.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use mount_types::is_archive_path;
use tracing::{debug, info, warn};

use crate::error::{MountError, Result};

/// Environment variable telling the front-end to mount without asking.
pub const FORCE_ENV: &str = "ARCHIVE_MOUNT_FORCE";

pub const MOUNT_ITEM: &str = "ArchiveMount::Mount";
pub const MOUNT_ADVANCED_ITEM: &str = "ArchiveMount::MountAdvanced";

/// Emblem shown on recognised archives.
pub const ARCHIVE_EMBLEM: &str = "package";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub name: String,
    pub label: String,
    pub tip: String,
}

impl MenuItem {
    fn new(name: &str, label: &str, tip: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            tip: tip.to_string(),
        }
    }
}

/// Called with the host's selection when a menu item is activated.
pub type MenuHandler = Box<dyn Fn(&[PathBuf]) -> Result<()> + Send>;

/// What the provider needs from a file manager.
pub trait FileManagerHost {
    fn selected_paths(&self) -> Vec<PathBuf>;
    fn register_menu_item(&mut self, item: MenuItem, handler: MenuHandler);
}

/// Starts the front-end for a set of files.
#[derive(Debug, Clone)]
pub struct FrontendLauncher {
    program: PathBuf,
}

impl FrontendLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Command for the given files; `force` mounts straight away.
    ///
    /// Runs in the folder of the last file so relative mount points land next to it.
    pub fn command(&self, files: &[PathBuf], force: bool) -> Command {
        let mut command = Command::new(&self.program);
        command.args(files).stdin(Stdio::null());
        if force {
            command.env(FORCE_ENV, "yes");
        }
        if let Some(parent) = files.last().and_then(|file| file.parent())
            && !parent.as_os_str().is_empty()
        {
            command.current_dir(parent);
        }
        command
    }

    pub fn launch(&self, files: &[PathBuf], force: bool) -> Result<()> {
        let mut child = self.command(files, force).spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MountError::ToolNotFound {
                    tool: self.program.display().to_string(),
                    hint: "reinstall the archive mount front-end".to_string(),
                }
            } else {
                MountError::Io(e)
            }
        })?;

        let pid = child.id();
        info!("Started front-end ({}) for {} file(s)", pid, files.len());
        std::thread::spawn(move || {
            if let Err(e) = child.wait() {
                warn!("Failed to reap front-end {}: {}", pid, e);
            }
        });
        Ok(())
    }
}

/// Registers the mount entries for archive selections.
#[derive(Debug, Clone)]
pub struct ArchiveMenuProvider {
    frontend: FrontendLauncher,
}

impl ArchiveMenuProvider {
    pub fn new(frontend: FrontendLauncher) -> Self {
        Self { frontend }
    }

    /// Adds "Mount" and "Mount Advanced" when the selection holds an archive.
    ///
    /// Returns the number of items registered.
    pub fn register(&self, host: &mut dyn FileManagerHost) -> usize {
        let archives = archives_in(&host.selected_paths());
        if archives.is_empty() {
            debug!("Selection holds no archives; no menu items");
            return 0;
        }

        let quick = self.frontend.clone();
        host.register_menu_item(
            MenuItem::new(MOUNT_ITEM, "Mount", "Mount selected archives with ratarmount"),
            Box::new(move |selection| quick.launch(&archives_in(selection), true)),
        );

        let advanced = self.frontend.clone();
        host.register_menu_item(
            MenuItem::new(
                MOUNT_ADVANCED_ITEM,
                "Mount Advanced",
                "Open the mount window with the selected archives",
            ),
            Box::new(move |selection| advanced.launch(&archives_in(selection), false)),
        );

        2
    }
}

pub fn archives_in(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .filter(|path| is_archive_path(path))
        .cloned()
        .collect()
}

pub fn emblem_for(path: &Path) -> Option<&'static str> {
    is_archive_path(path).then_some(ARCHIVE_EMBLEM)
}

/// Host for script-style integrations: the selection arrives through
/// `NAUTILUS_SCRIPT_SELECTED_FILE_PATHS` or as command-line arguments.
pub struct ScriptHost {
    selection: Vec<PathBuf>,
    items: Vec<(MenuItem, MenuHandler)>,
}

pub const NAUTILUS_SELECTION_ENV: &str = "NAUTILUS_SCRIPT_SELECTED_FILE_PATHS";

impl ScriptHost {
    pub fn new(selection: Vec<PathBuf>) -> Self {
        Self {
            selection,
            items: Vec::new(),
        }
    }

    /// Arguments win over the environment when both are present.
    pub fn from_env(args: Vec<PathBuf>) -> Self {
        if !args.is_empty() {
            return Self::new(args);
        }

        let selection = std::env::var(NAUTILUS_SELECTION_ENV)
            .map(|value| parse_selection(&value))
            .unwrap_or_default();
        Self::new(selection)
    }

    pub fn items(&self) -> impl Iterator<Item = &MenuItem> {
        self.items.iter().map(|(item, _)| item)
    }

    /// Runs the handler registered under `name` with the current selection.
    pub fn activate(&self, name: &str) -> Result<()> {
        let (_, handler) = self
            .items
            .iter()
            .find(|(item, _)| item.name == name)
            .ok_or_else(|| {
                MountError::InvalidInput(format!("no menu item {name} for this selection"))
            })?;
        handler(&self.selection)
    }
}

impl FileManagerHost for ScriptHost {
    fn selected_paths(&self) -> Vec<PathBuf> {
        self.selection.clone()
    }

    fn register_menu_item(&mut self, item: MenuItem, handler: MenuHandler) {
        debug!("Registered menu item {}", item.name);
        self.items.push((item, handler));
    }
}

/// Newline-separated selection, as the script environment provides it.
pub fn parse_selection(value: &str) -> Vec<PathBuf> {
    value
        .lines()
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn no_archives_no_items() {
        let mut host = ScriptHost::new(paths(&["/home/u/notes.txt", "/home/u/Pictures"]));
        let provider = ArchiveMenuProvider::new(FrontendLauncher::new("/bin/true"));

        assert_eq!(provider.register(&mut host), 0);
        assert_eq!(host.items().count(), 0);
        assert!(host.activate(MOUNT_ITEM).is_err());
    }

    #[test]
    fn archives_get_both_items() {
        let dir = tempfile::tempdir().expect("tempdir");
        let archive = dir.path().join("a.zip");
        let mut host = ScriptHost::new(vec![archive, dir.path().join("readme.md")]);
        let provider = ArchiveMenuProvider::new(FrontendLauncher::new("/bin/true"));

        assert_eq!(provider.register(&mut host), 2);
        let names: Vec<&str> = host.items().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec![MOUNT_ITEM, MOUNT_ADVANCED_ITEM]);
        assert!(host.activate(MOUNT_ADVANCED_ITEM).is_ok());
    }

    #[test]
    fn forced_command_sets_env_and_directory() {
        let launcher = FrontendLauncher::new("cosmic-ext-archive-mount");
        let files = paths(&["/data/one.tar", "/srv/two.iso"]);
        let command = launcher.command(&files, true);

        let args: Vec<&OsStr> = command.get_args().collect();
        assert_eq!(args, vec![OsStr::new("/data/one.tar"), OsStr::new("/srv/two.iso")]);
        assert_eq!(command.get_current_dir(), Some(Path::new("/srv")));
        assert!(
            command
                .get_envs()
                .any(|(key, value)| key == FORCE_ENV && value == Some(OsStr::new("yes")))
        );

        let command = launcher.command(&files, false);
        assert_eq!(command.get_envs().count(), 0);
    }

    #[test]
    fn selection_env_is_newline_separated() {
        assert_eq!(
            parse_selection("/a/x.zip\n/b/y.tar\n"),
            paths(&["/a/x.zip", "/b/y.tar"])
        );
    }

    #[test]
    fn only_archives_get_an_emblem() {
        assert_eq!(emblem_for(Path::new("/a/b.deb")), Some(ARCHIVE_EMBLEM));
        assert_eq!(emblem_for(Path::new("/a/b.txt")), None);
    }
}
