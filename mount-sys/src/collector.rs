// SPDX-License-Identifier: GPL-3.0-only

//! Option collection: form or argument list in, validated [`MountRequest`] out.

use std::path::Path;

use mount_types::{LaunchMode, MountForm, MountRequest};
use tracing::debug;

use crate::command::{form_options, parse_args};
use crate::error::{MountError, Result};
use crate::mounts::ProcMounts;

/// Answers whether a path is already a mount point.
pub trait MountProbe {
    fn is_mounted(&self, path: &Path) -> bool;
}

/// Builds mount requests from user input.
#[derive(Debug, Clone, Default)]
pub struct OptionCollector<P = ProcMounts> {
    probe: P,
    require_mount_point: bool,
}

impl OptionCollector<ProcMounts> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: MountProbe> OptionCollector<P> {
    pub fn with_probe(probe: P) -> Self {
        Self {
            probe,
            require_mount_point: false,
        }
    }

    /// Rejects requests without a mount point instead of letting the tool pick one.
    pub fn require_mount_point(mut self, require: bool) -> Self {
        self.require_mount_point = require;
        self
    }

    pub fn collect(&self, form: &MountForm, mode: LaunchMode) -> Result<MountRequest> {
        let source_path = form.sources.first().map(String::as_str).unwrap_or_default();
        if source_path.is_empty() {
            return Err(MountError::InvalidInput(
                "at least one archive to mount is required".to_string(),
            ));
        }

        let sources: Vec<String> = form.non_empty_sources().map(str::to_string).collect();

        let mount_point = (!form.mount_point.is_empty()).then(|| form.mount_point.clone());
        match mount_point.as_deref() {
            None if self.require_mount_point => {
                return Err(MountError::InvalidInput(
                    "a mount point is required".to_string(),
                ));
            }
            Some(path) if self.probe.is_mounted(Path::new(path)) => {
                return Err(MountError::InvalidInput(format!(
                    "{path} is already mounted"
                )));
            }
            _ => {}
        }

        let request = MountRequest::new(sources, mount_point, form_options(form), mode);
        debug!(
            "Collected request for {} source(s), mode {:?}",
            request.sources().len(),
            request.mode()
        );
        Ok(request)
    }

    /// Collects straight from a forwarded argument list.
    ///
    /// The request is for validation and logging. Forwarded arguments are
    /// launched as given, not rebuilt from the request.
    pub fn collect_args<S: AsRef<str>>(&self, args: &[S], mode: LaunchMode) -> Result<MountRequest> {
        self.collect(&parse_args(args), mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::build_args;
    use mount_types::MountOption;
    use std::path::PathBuf;

    struct FakeMounts(Vec<PathBuf>);

    impl MountProbe for FakeMounts {
        fn is_mounted(&self, path: &Path) -> bool {
            self.0.iter().any(|p| p == path)
        }
    }

    fn collector() -> OptionCollector<FakeMounts> {
        OptionCollector::with_probe(FakeMounts(vec![PathBuf::from("/mnt/busy")]))
    }

    fn form(sources: &[&str], mount_point: &str) -> MountForm {
        MountForm {
            sources: sources.iter().map(|s| s.to_string()).collect(),
            mount_point: mount_point.to_string(),
            ..MountForm::default()
        }
    }

    #[test]
    fn empty_source_is_rejected_regardless_of_other_fields() {
        let mut input = form(&["", "b.zip"], "/mnt/free");
        input.recursive = true;
        input.password = "pw".into();
        input.extra_args = vec!["-f".into()];

        let err = collector()
            .collect(&input, LaunchMode::Foreground)
            .expect_err("must fail");
        assert!(matches!(err, MountError::InvalidInput(_)));

        let err = collector()
            .collect(&MountForm::default(), LaunchMode::Background)
            .expect_err("must fail");
        assert!(matches!(err, MountError::InvalidInput(_)));
    }

    #[test]
    fn strict_mode_needs_mount_point() {
        let strict = collector().require_mount_point(true);
        assert!(matches!(
            strict.collect(&form(&["a.zip"], ""), LaunchMode::Foreground),
            Err(MountError::InvalidInput(_))
        ));

        let relaxed = collector();
        let request = relaxed
            .collect(&form(&["a.zip"], ""), LaunchMode::Foreground)
            .expect("relaxed mode allows a derived mount point");
        assert_eq!(request.mount_point(), None);
    }

    #[test]
    fn mounted_target_is_rejected() {
        let result = collector().collect(&form(&["a.zip"], "/mnt/busy"), LaunchMode::Foreground);
        assert!(matches!(result, Err(MountError::InvalidInput(msg)) if msg.contains("/mnt/busy")));
    }

    #[test]
    fn blank_trailing_rows_are_dropped() {
        let request = collector()
            .collect(&form(&["a.zip", "", "b.tar"], "/mnt/free"), LaunchMode::Foreground)
            .expect("valid");
        assert_eq!(request.sources(), ["a.zip", "b.tar"]);
        assert_eq!(request.source_path(), "a.zip");
    }

    #[test]
    fn build_then_parse_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = dir.path().join("first.tar.gz");
        let second = dir.path().join("second.zip");
        std::fs::write(&first, b"").expect("write");
        std::fs::write(&second, b"").expect("write");

        let input = MountForm {
            sources: vec![
                first.to_string_lossy().to_string(),
                second.to_string_lossy().to_string(),
            ],
            mount_point: dir.path().join("mnt").to_string_lossy().to_string(),
            password: "pass word".into(),
            recursive: true,
            recursion_depth: 2,
            lazy: true,
            strip_recursive_tar_extension: false,
            write_overlay: dir.path().to_string_lossy().to_string(),
            union_mount: false,
            extra_args: vec!["--index-folders".into(), "/var/cache/ratarmount".into(), "-f".into()],
        };

        let request = collector()
            .collect(&input, LaunchMode::Foreground)
            .expect("valid");
        let args = build_args(&request);
        let reparsed = collector()
            .collect_args(&args, LaunchMode::Foreground)
            .expect("valid");

        assert_eq!(reparsed, request);
        assert_eq!(parse_args(&args), input);
        assert!(request.options().contains(&MountOption::DisableUnionMount));
    }
}
