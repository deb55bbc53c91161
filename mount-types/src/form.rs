use serde::{Deserialize, Serialize};

/// Upper bound offered by the depth selector; the tool itself has none.
pub const MAX_RECURSION_DEPTH: u32 = 100;

/// Editable mount settings, as shown in the window or parsed from arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountForm {
    pub sources: Vec<String>,
    pub mount_point: String,
    pub password: String,
    pub recursive: bool,
    /// 0 means unlimited.
    pub recursion_depth: u32,
    pub lazy: bool,
    pub strip_recursive_tar_extension: bool,
    pub write_overlay: String,
    pub union_mount: bool,
    /// Arguments the form has no field for, kept in their original order.
    pub extra_args: Vec<String>,
}

impl Default for MountForm {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            mount_point: String::new(),
            password: String::new(),
            recursive: false,
            recursion_depth: 0,
            lazy: false,
            strip_recursive_tar_extension: false,
            write_overlay: String::new(),
            union_mount: true,
            extra_args: Vec::new(),
        }
    }
}

impl MountForm {
    /// Sources with blank entries removed.
    pub fn non_empty_sources(&self) -> impl Iterator<Item = &str> {
        self.sources
            .iter()
            .map(String::as_str)
            .filter(|source| !source.is_empty())
    }

    /// Recursion sub-options only take effect while `recursive` is set.
    pub fn recursion_options_enabled(&self) -> bool {
        self.recursive
    }
}
