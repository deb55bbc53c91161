use serde::{Deserialize, Serialize};

/// Whether the launcher waits for the tool to exit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchMode {
    /// Wait for the tool and capture its standard error.
    #[default]
    Foreground,
    /// Spawn the tool and return immediately.
    Background,
}

/// A single option handed to the mounting tool.
///
/// Known options carry a fixed flag; `Passthrough` holds an argument that is
/// forwarded verbatim after the known options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum MountOption {
    Password(String),
    Recursive,
    RecursionDepth(u32),
    Lazy,
    StripRecursiveTarExtension,
    WriteOverlay(String),
    DisableUnionMount,
    Passthrough(String),
}

impl MountOption {
    pub fn flag(&self) -> &str {
        match self {
            MountOption::Password(_) => "--password",
            MountOption::Recursive => "--recursive",
            MountOption::RecursionDepth(_) => "--recursion-depth",
            MountOption::Lazy => "--lazy",
            MountOption::StripRecursiveTarExtension => "--strip-recursive-tar-extension",
            MountOption::WriteOverlay(_) => "--write-overlay",
            MountOption::DisableUnionMount => "--disable-union-mount",
            MountOption::Passthrough(arg) => arg,
        }
    }

    pub fn value(&self) -> Option<String> {
        match self {
            MountOption::Password(value) | MountOption::WriteOverlay(value) => Some(value.clone()),
            MountOption::RecursionDepth(depth) => Some(depth.to_string()),
            _ => None,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, MountOption::Passthrough(_))
    }
}

/// A validated mount request.
///
/// Built by the option collector; fields are read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountRequest {
    sources: Vec<String>,
    mount_point: Option<String>,
    options: Vec<MountOption>,
    mode: LaunchMode,
}

impl MountRequest {
    pub fn new(
        sources: Vec<String>,
        mount_point: Option<String>,
        options: Vec<MountOption>,
        mode: LaunchMode,
    ) -> Self {
        Self {
            sources,
            mount_point,
            options,
            mode,
        }
    }

    /// The first source; the request is never built without one.
    pub fn source_path(&self) -> &str {
        self.sources.first().map(String::as_str).unwrap_or_default()
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn mount_point(&self) -> Option<&str> {
        self.mount_point.as_deref()
    }

    pub fn options(&self) -> &[MountOption] {
        &self.options
    }

    pub fn mode(&self) -> LaunchMode {
        self.mode
    }

    pub fn with_mode(mut self, mode: LaunchMode) -> Self {
        self.mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_options_map_to_fixed_flags() {
        assert_eq!(MountOption::Lazy.flag(), "--lazy");
        assert_eq!(MountOption::RecursionDepth(3).flag(), "--recursion-depth");
        assert_eq!(MountOption::RecursionDepth(3).value().as_deref(), Some("3"));
        assert_eq!(
            MountOption::Password("hunter2".into()).value().as_deref(),
            Some("hunter2")
        );
        assert_eq!(MountOption::DisableUnionMount.value(), None);
    }

    #[test]
    fn passthrough_flag_is_verbatim() {
        let option = MountOption::Passthrough("--index-minimum-file-count=100".into());
        assert_eq!(option.flag(), "--index-minimum-file-count=100");
        assert!(option.is_passthrough());
        assert!(!MountOption::Recursive.is_passthrough());
    }

    #[test]
    fn request_serializes_with_tagged_options() {
        let request = MountRequest::new(
            vec!["a.zip".into()],
            Some("mnt".into()),
            vec![MountOption::RecursionDepth(2)],
            LaunchMode::Background,
        );
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["mode"], "background");
        assert_eq!(json["options"][0]["kind"], "recursion-depth");
        assert_eq!(json["options"][0]["value"], 2);
    }
}
