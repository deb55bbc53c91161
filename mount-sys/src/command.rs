// SPDX-License-Identifier: GPL-3.0-only

//! Argument lists for the mounting tool
//!
//! `build_args` is the only place that decides argument order. `parse_args`
//! reads an argument list back into a [`MountForm`] so that a hand-edited
//! command line and the form stay in sync.

use std::path::Path;

use mount_types::{LaunchMode, MountForm, MountOption, MountRequest, TOOL_NAME};

/// Tool options that take a value and have no form field. The value stays with
/// its flag instead of being read as a source or mount point.
const VALUE_OPTIONS: &[&str] = &[
    "-o",
    "--fuse",
    "-P",
    "--parallelization",
    "-e",
    "--encoding",
    "-d",
    "--debug",
    "--index-file",
    "--index-folders",
    "--password-file",
    "--prefix",
    "--log-file",
    "--use-backend",
    "--gzip-seek-point-spacing",
];

/// Builds the argument list (without the program name) for a request.
///
/// Known options come first in request order, then pass-through arguments
/// verbatim, then the sources, and the mount point last.
pub fn build_args(request: &MountRequest) -> Vec<String> {
    let mut args = Vec::new();

    for option in request.options().iter().filter(|o| !o.is_passthrough()) {
        args.push(option.flag().to_string());
        if let Some(value) = option.value() {
            args.push(value);
        }
    }

    args.extend(
        request
            .options()
            .iter()
            .filter(|o| o.is_passthrough())
            .map(|o| o.flag().to_string()),
    );

    args.extend(request.sources().iter().cloned());

    if let Some(mount_point) = request.mount_point() {
        args.push(mount_point.to_string());
    }

    args
}

/// Options implied by a form, in the order the builder emits them.
pub fn form_options(form: &MountForm) -> Vec<MountOption> {
    let mut options = Vec::new();

    if !form.password.is_empty() {
        options.push(MountOption::Password(form.password.clone()));
    }

    if form.recursive {
        options.push(MountOption::Recursive);
        if form.recursion_depth > 0 {
            options.push(MountOption::RecursionDepth(form.recursion_depth));
        }
        if form.lazy {
            options.push(MountOption::Lazy);
        }
        if form.strip_recursive_tar_extension {
            options.push(MountOption::StripRecursiveTarExtension);
        }
    }

    if !form.write_overlay.is_empty() {
        options.push(MountOption::WriteOverlay(form.write_overlay.clone()));
    }

    if !form.union_mount {
        options.push(MountOption::DisableUnionMount);
    }

    options.extend(form.extra_args.iter().cloned().map(MountOption::Passthrough));
    options
}

/// Arguments for a form as it stands, without validation.
///
/// Used for the live preview, where an incomplete form is normal.
pub fn form_args(form: &MountForm) -> Vec<String> {
    let request = MountRequest::new(
        form.non_empty_sources().map(str::to_string).collect(),
        (!form.mount_point.is_empty()).then(|| form.mount_point.clone()),
        form_options(form),
        LaunchMode::Foreground,
    );
    build_args(&request)
}

/// Parses an argument list (without the program name) into a form.
///
/// With two or more positional arguments the last one is the mount point,
/// unless it names an existing non-directory, in which case every positional
/// argument is a source.
pub fn parse_args<S: AsRef<str>>(args: &[S]) -> MountForm {
    let mut form = MountForm::default();
    let mut positional = Vec::new();

    let mut iter = args.iter().map(AsRef::as_ref);
    while let Some(arg) = iter.next() {
        match arg {
            "-r" | "--recursive" => form.recursive = true,
            "-l" | "--lazy" => form.lazy = true,
            "-s" | "--strip-recursive-tar-extension" => form.strip_recursive_tar_extension = true,
            "--disable-union-mount" => form.union_mount = false,
            "--recursion-depth" => match iter.next() {
                Some(value) => match value.parse::<u32>() {
                    Ok(depth) => form.recursion_depth = depth,
                    Err(_) => {
                        form.extra_args.push(arg.to_string());
                        form.extra_args.push(value.to_string());
                    }
                },
                None => form.extra_args.push(arg.to_string()),
            },
            "--write-overlay" => match iter.next() {
                Some(value) => form.write_overlay = value.to_string(),
                None => form.extra_args.push(arg.to_string()),
            },
            "--password" => match iter.next() {
                Some(value) => form.password = value.to_string(),
                None => form.extra_args.push(arg.to_string()),
            },
            _ if VALUE_OPTIONS.contains(&arg) => {
                form.extra_args.push(arg.to_string());
                form.extra_args.extend(iter.next().map(str::to_string));
            }
            _ if arg.starts_with('-') => form.extra_args.push(arg.to_string()),
            _ => positional.push(arg.to_string()),
        }
    }

    if positional.len() >= 2 {
        let last = Path::new(&positional[positional.len() - 1]);
        let is_existing_file = last.exists() && !last.is_dir();
        if !is_existing_file {
            form.mount_point = positional.pop().unwrap_or_default();
        }
    }
    form.sources = positional;

    form
}

/// Shell-quoted command line, suitable for display and editing.
pub fn render_preview(args: &[String]) -> String {
    let words = std::iter::once(TOOL_NAME).chain(args.iter().map(String::as_str));
    shlex::try_join(words).unwrap_or_else(|_| {
        // Only reachable with interior NUL bytes, which no path can contain.
        std::iter::once(TOOL_NAME.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    })
}

/// Splits an edited command line into arguments, dropping a leading tool name.
///
/// Returns `None` while the text has unbalanced quotes.
pub fn split_preview(text: &str) -> Option<Vec<String>> {
    let mut args = shlex::split(text)?;
    if args.first().map(String::as_str) == Some(TOOL_NAME) {
        args.remove(0);
    }
    Some(args)
}

pub fn parse_preview(text: &str) -> Option<MountForm> {
    split_preview(text).map(|args| parse_args(&args))
}
