// SPDX-License-Identifier: GPL-3.0-only

//! Editable form state behind the configuration page.
//!
//! The form and the command preview describe the same argument list. Editing
//! either side rewrites the other, except that a preview with unbalanced quotes
//! is left alone until it parses again.

use mount_sys::command::{form_args, parse_args, parse_preview, render_preview, split_preview};
use mount_sys::validate::{mount_point_error, source_error, write_overlay_error};
use mount_sys::{MountProbe, OptionCollector};
use mount_types::{LaunchMode, MAX_RECURSION_DEPTH, MountForm};

use crate::fl;

#[derive(Debug, Clone, Default)]
pub struct FieldErrors {
    pub sources: Vec<Option<String>>,
    pub mount_point: Option<String>,
    pub write_overlay: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FormState {
    /// Source rows include the trailing empty row.
    pub form: MountForm,
    pub depth_input: String,
    pub preview: String,
    pub show_advanced: bool,
    pub field_errors: FieldErrors,
    /// Rejection from the last mount attempt.
    pub error: Option<String>,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new(MountForm::default())
    }
}

impl FormState {
    pub fn new(form: MountForm) -> Self {
        let show_advanced = has_advanced_settings(&form);
        let mut state = Self {
            depth_input: depth_text(form.recursion_depth),
            form,
            preview: String::new(),
            show_advanced,
            field_errors: FieldErrors::default(),
            error: None,
        };
        state.refresh();
        state
    }

    /// Starts from a forwarded argument list, shown in the preview as given.
    pub fn from_args(args: &[String]) -> Self {
        let mut state = Self::new(parse_args(args));
        state.preview = render_preview(args);
        state
    }

    /// Applies a change to the form and re-renders the preview.
    pub fn edit(&mut self, change: impl FnOnce(&mut MountForm)) {
        change(&mut self.form);
        self.refresh();
    }

    pub fn set_source(&mut self, index: usize, value: String) {
        self.edit(|form| {
            if let Some(row) = form.sources.get_mut(index) {
                *row = value;
            }
        });
    }

    pub fn remove_source(&mut self, index: usize) {
        self.edit(|form| {
            if index < form.sources.len() {
                form.sources.remove(index);
            }
        });
    }

    /// Swaps a filled row with its predecessor. The trailing empty row never moves.
    pub fn move_source_up(&mut self, index: usize) {
        if index == 0 || index + 1 >= self.form.sources.len() {
            return;
        }
        self.edit(|form| form.sources.swap(index - 1, index));
    }

    pub fn move_source_down(&mut self, index: usize) {
        if index + 2 >= self.form.sources.len() {
            return;
        }
        self.edit(|form| form.sources.swap(index, index + 1));
    }

    /// Accepts digits only; the depth is clamped to [`MAX_RECURSION_DEPTH`].
    pub fn set_depth_input(&mut self, text: String) {
        if !text.chars().all(|c| c.is_ascii_digit()) {
            return;
        }
        let depth = if text.is_empty() {
            0
        } else {
            text.parse::<u32>()
                .unwrap_or(MAX_RECURSION_DEPTH)
                .min(MAX_RECURSION_DEPTH)
        };
        self.depth_input = if depth.to_string() == text || text.is_empty() {
            text
        } else {
            depth.to_string()
        };
        self.edit(|form| form.recursion_depth = depth);
    }

    /// Takes an edited command line. The form follows once the text parses.
    pub fn set_preview(&mut self, text: String) {
        if let Some(mut form) = parse_preview(&text) {
            ensure_trailing_row(&mut form.sources);
            self.depth_input = depth_text(form.recursion_depth);
            self.form = form;
            self.validate_fields();
        }
        self.preview = text;
    }

    /// Arguments as they will be passed to the tool, or `None` while the
    /// preview has unbalanced quotes.
    pub fn args(&self) -> Option<Vec<String>> {
        split_preview(&self.preview)
    }

    /// The preview's arguments once they pass validation, unchanged.
    pub fn checked_args<P: MountProbe>(
        &self,
        collector: &OptionCollector<P>,
    ) -> Result<Vec<String>, String> {
        let args = self.args().ok_or_else(|| fl!("unbalanced-quote"))?;
        collector
            .collect_args(&args, LaunchMode::Foreground)
            .map_err(|e| e.to_string())?;
        Ok(args)
    }

    fn refresh(&mut self) {
        ensure_trailing_row(&mut self.form.sources);
        self.preview = render_preview(&form_args(&self.form));
        self.validate_fields();
    }

    fn validate_fields(&mut self) {
        self.field_errors = FieldErrors {
            sources: self.form.sources.iter().map(|s| source_error(s)).collect(),
            mount_point: mount_point_error(&self.form.mount_point),
            write_overlay: write_overlay_error(&self.form.write_overlay),
        };
    }
}

/// Drops surplus blank rows at the end and keeps exactly one empty row last.
pub fn ensure_trailing_row(sources: &mut Vec<String>) {
    while sources.len() >= 2 && sources.iter().rev().take(2).all(String::is_empty) {
        sources.pop();
    }
    if sources.last().is_none_or(|last| !last.is_empty()) {
        sources.push(String::new());
    }
}

fn has_advanced_settings(form: &MountForm) -> bool {
    !form.password.is_empty()
        || form.recursive
        || !form.write_overlay.is_empty()
        || !form.union_mount
}

fn depth_text(depth: u32) -> String {
    if depth == 0 {
        String::new()
    } else {
        depth.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_sources(sources: &[&str]) -> FormState {
        FormState::new(MountForm {
            sources: sources.iter().map(|s| s.to_string()).collect(),
            ..MountForm::default()
        })
    }

    #[test]
    fn always_one_empty_row_last() {
        let mut state = FormState::default();
        assert_eq!(state.form.sources, vec![""]);

        state.set_source(0, "a.zip".into());
        assert_eq!(state.form.sources, vec!["a.zip", ""]);

        state.set_source(1, "b.tar".into());
        assert_eq!(state.form.sources, vec!["a.zip", "b.tar", ""]);

        state.set_source(1, String::new());
        assert_eq!(state.form.sources, vec!["a.zip", ""]);

        state.remove_source(0);
        assert_eq!(state.form.sources, vec![""]);
    }

    #[test]
    fn moving_rows_skips_the_empty_row() {
        let mut state = with_sources(&["a", "b", "c"]);
        state.move_source_up(2);
        assert_eq!(state.form.sources, vec!["a", "c", "b", ""]);

        state.move_source_down(2);
        assert_eq!(state.form.sources, vec!["a", "c", "b", ""]);
        state.move_source_up(3);
        assert_eq!(state.form.sources, vec!["a", "c", "b", ""]);

        state.move_source_down(0);
        assert_eq!(state.form.sources, vec!["c", "a", "b", ""]);
        assert!(state.preview.ends_with("c a b"));
    }

    #[test]
    fn form_edits_rewrite_preview() {
        let mut state = with_sources(&["my archive.tar"]);
        state.edit(|form| {
            form.recursive = true;
            form.mount_point = "/mnt/x".into();
        });
        assert_eq!(state.preview, "ratarmount --recursive 'my archive.tar' /mnt/x");
    }

    #[test]
    fn preview_edits_rewrite_form() {
        let mut state = FormState::default();
        state.set_preview("ratarmount -l --password pw a.zip /mnt/a".into());
        assert_eq!(state.form.password, "pw");
        assert!(state.form.lazy);
        assert_eq!(state.form.sources, vec!["a.zip", ""]);
        assert_eq!(state.form.mount_point, "/mnt/a");

        state.set_preview("ratarmount 'unfinished".into());
        assert_eq!(state.preview, "ratarmount 'unfinished");
        assert_eq!(state.form.mount_point, "/mnt/a");
        assert_eq!(state.args(), None);
    }

    #[test]
    fn depth_input_is_clamped_and_numeric() {
        let mut state = FormState::default();
        state.set_depth_input("12".into());
        assert_eq!(state.form.recursion_depth, 12);

        state.set_depth_input("12x".into());
        assert_eq!(state.depth_input, "12");

        state.set_depth_input("5000".into());
        assert_eq!(state.form.recursion_depth, MAX_RECURSION_DEPTH);
        assert_eq!(state.depth_input, MAX_RECURSION_DEPTH.to_string());

        state.set_depth_input(String::new());
        assert_eq!(state.form.recursion_depth, 0);
    }

    struct BusyMounts;

    impl MountProbe for BusyMounts {
        fn is_mounted(&self, path: &std::path::Path) -> bool {
            path == std::path::Path::new("/mnt/busy")
        }
    }

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn forwarded_arguments_are_previewed_as_given() {
        let forwarded = strings(&["a.zip", "/mnt/x", "-o", "allow_other"]);
        let state = FormState::from_args(&forwarded);

        assert_eq!(state.preview, "ratarmount a.zip /mnt/x -o allow_other");
        assert_eq!(state.args(), Some(forwarded));
        assert_eq!(state.form.mount_point, "/mnt/x");
    }

    #[test]
    fn mount_runs_the_preview_unchanged() {
        let collector = OptionCollector::with_probe(BusyMounts);
        let mut state = FormState::default();
        state.set_preview("ratarmount a.zip --index-file idx.sqlite /mnt/x".into());

        assert_eq!(
            state.checked_args(&collector),
            Ok(strings(&["a.zip", "--index-file", "idx.sqlite", "/mnt/x"]))
        );

        state.set_preview("ratarmount a.zip /mnt/busy".into());
        let err = state.checked_args(&collector).expect_err("target is mounted");
        assert!(err.contains("/mnt/busy"));

        state.set_preview("ratarmount 'a.zip".into());
        assert!(state.checked_args(&collector).is_err());
    }

    #[test]
    fn advanced_section_opens_for_advanced_arguments() {
        assert!(!FormState::default().show_advanced);
        let state = FormState::new(MountForm {
            password: "x".into(),
            ..MountForm::default()
        });
        assert!(state.show_advanced);
    }
}
