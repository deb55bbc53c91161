// SPDX-License-Identifier: GPL-3.0-only

use super::APP_ID;
use super::message::{Message, PathPickerKind, StartFailure};
use super::state::{AppModel, ContextPage, Page, ShowDialog};
use crate::app::{REPOSITORY, exit_with};
use crate::config::LoggingLevel;
use crate::fl;
use crate::logging;
use cosmic::app::Task;
use cosmic::dialog::file_chooser;
use mount_sys::{OptionCollector, interrupt};
use mount_types::{LaunchEvent, LaunchState, TOOL_NAME};

/// Handles messages emitted by the application and its widgets.
pub(crate) fn update(app: &mut AppModel, message: Message) -> Task<Message> {
    match message {
        Message::OpenRepositoryUrl => {
            _ = open::that_detached(REPOSITORY);
        }
        Message::LaunchUrl(url) => match open::that_detached(&url) {
            Ok(()) => {}
            Err(err) => {
                tracing::warn!(?url, %err, "failed to open url");
            }
        },
        Message::ToggleContextPage(context_page) => {
            if app.context_page == context_page {
                // Close the context drawer if the toggled context page is the same.
                app.core.window.show_context = !app.core.window.show_context;
            } else {
                // Open the context drawer to display the requested context page.
                app.context_page = context_page;
                app.core.window.show_context = true;
            }
            if app.core.window.show_context {
                return load_tool_text(app, context_page);
            }
        }
        Message::ToolTextLoaded(page, text) => match page {
            ContextPage::Help => app.help_text = Some(text),
            ContextPage::About => app.attributions = Some(text),
            ContextPage::Settings => {}
        },
        Message::UpdateConfig(config) => {
            logging::set_log_level(config.log_level);
            logging::set_log_to_disk(config.log_to_disk);
            app.config = config;
        }
        Message::CloseDialog => {
            app.dialog = None;
        }
        Message::None => {}

        Message::SourceChanged(index, value) => app.form.set_source(index, value),
        Message::RemoveSource(index) => app.form.remove_source(index),
        Message::MoveSourceUp(index) => app.form.move_source_up(index),
        Message::MoveSourceDown(index) => app.form.move_source_down(index),
        Message::MountPointChanged(value) => app.form.edit(|form| form.mount_point = value),
        Message::PasswordChanged(value) => app.form.edit(|form| form.password = value),
        Message::RecursiveToggled(value) => app.form.edit(|form| form.recursive = value),
        Message::RecursionDepthChanged(text) => app.form.set_depth_input(text),
        Message::LazyToggled(value) => app.form.edit(|form| form.lazy = value),
        Message::StripTarExtensionToggled(value) => {
            app.form.edit(|form| form.strip_recursive_tar_extension = value)
        }
        Message::WriteOverlayChanged(value) => app.form.edit(|form| form.write_overlay = value),
        Message::UnionMountToggled(value) => app.form.edit(|form| form.union_mount = value),
        Message::ToggleAdvanced => app.form.show_advanced = !app.form.show_advanced,
        Message::PreviewChanged(text) => app.form.set_preview(text),
        Message::OpenPathPicker(kind) => return open_path_picker(kind),
        Message::PathPicked(kind, path) => {
            if let Some(path) = path {
                match kind {
                    PathPickerKind::Source(index) => app.form.set_source(index, path),
                    PathPickerKind::MountPoint => app.form.edit(|form| form.mount_point = path),
                    PathPickerKind::WriteOverlay => {
                        app.form.edit(|form| form.write_overlay = path)
                    }
                }
            }
        }
        Message::Mount => {
            if app.page == Page::Config && app.dialog.is_none() {
                return start_mount(app);
            }
        }
        Message::Cancel => {
            if app.execution.launch.is_some() {
                // Escape while the tool runs stops it instead of orphaning it.
                abort(app);
            } else if app.dialog.is_some() {
                app.dialog = None;
            } else {
                exit_with(app.execution.exit_code());
            }
        }

        Message::Launched(Ok(launch)) => {
            tracing::info!(pid = launch.pid(), "{} started", TOOL_NAME);
            app.page = Page::Execution;
            app.execution.start(launch);
            return app.update_title();
        }
        Message::Launched(Err(failure)) => {
            // Nothing ran, so the form stays usable for another attempt.
            app.execution.state = LaunchState::Idle;
            match failure {
                StartFailure::ToolNotFound(missing) => {
                    app.dialog = Some(ShowDialog::ToolNotFound(missing));
                }
                StartFailure::Other(message) => {
                    tracing::error!(%message, "failed to start {}", TOOL_NAME);
                    app.form.error = Some(message);
                }
            }
        }
        Message::Launch(event) => apply_launch_event(app, event),
        Message::Abort => abort(app),
        Message::Close => exit_with(app.execution.exit_code()),

        Message::LogLevelChanged(index) => {
            let level = LoggingLevel::from_index(index);
            app.config.log_level = level;
            app.config.save(APP_ID);
            logging::set_log_level(level);
        }
        Message::ToggleLogToDisk(log_to_disk) => {
            app.config.log_to_disk = log_to_disk;
            app.config.save(APP_ID);
            logging::set_log_to_disk(log_to_disk);
        }
        Message::ToggleDefaultUnionMount(value) => {
            app.config.default_union_mount = value;
            app.config.save(APP_ID);
        }
        Message::ToggleDefaultRecursive(value) => {
            app.config.default_recursive = value;
            app.config.save(APP_ID);
        }
    }

    Task::none()
}

/// Validates the command line and starts the tool with streamed output.
fn start_mount(app: &mut AppModel) -> Task<Message> {
    if app.execution.state != LaunchState::Idle {
        return Task::none();
    }

    let collector = OptionCollector::new().require_mount_point(app.require_mount_point);
    let args = match app.form.checked_args(&collector) {
        Ok(args) => args,
        Err(message) => {
            tracing::info!(%message, "mount request rejected");
            app.form.error = Some(message);
            return Task::none();
        }
    };

    let tool = match &app.tool {
        Ok(tool) => tool.clone(),
        Err(missing) => {
            app.dialog = Some(ShowDialog::ToolNotFound(missing.clone()));
            return Task::none();
        }
    };

    app.form.error = None;
    app.execution.state.begin();
    tracing::debug!(?args, "starting {}", TOOL_NAME);

    Task::perform(
        async move { tool.spawn_streaming(&args).map_err(StartFailure::from) },
        |result| Message::Launched(result).into(),
    )
}

/// Records one piece of tool output or its exit.
///
/// A successful exit ends the application with code 0; any other exit keeps
/// the window open with the log.
pub(crate) fn apply_launch_event(app: &mut AppModel, event: LaunchEvent) {
    if app.execution.record(event) {
        exit_with(0);
    }
}

fn abort(app: &mut AppModel) {
    let Some(pid) = app.execution.launch.as_ref().map(|launch| launch.pid()) else {
        return;
    };
    if let Err(e) = interrupt(pid) {
        tracing::warn!(%e, pid, "failed to interrupt {}", TOOL_NAME);
        app.execution
            .push_line(&fl!("tool-stop-failed", tool = TOOL_NAME, error = e.to_string()));
    }
}

fn load_tool_text(app: &AppModel, page: ContextPage) -> Task<Message> {
    let loaded = match page {
        ContextPage::Help => app.help_text.is_some(),
        ContextPage::About => app.attributions.is_some(),
        ContextPage::Settings => true,
    };
    if loaded {
        return Task::none();
    }

    let tool = match &app.tool {
        Ok(tool) => tool.clone(),
        Err(missing) => {
            let text = fl!(
                "tool-missing-text",
                tool = missing.tool.as_str(),
                hint = missing.hint.as_str()
            );
            return Task::done(Message::ToolTextLoaded(page, text).into());
        }
    };

    Task::perform(
        async move {
            let text = tokio::task::spawn_blocking(move || match page {
                ContextPage::About => tool.oss_attributions(),
                _ => tool.help_text(),
            })
            .await
            .unwrap_or_else(|e| fl!("tool-run-failed", tool = TOOL_NAME, error = e.to_string()));
            Message::ToolTextLoaded(page, text)
        },
        |msg| msg.into(),
    )
}

fn open_path_picker(kind: PathPickerKind) -> Task<Message> {
    let title = match kind {
        PathPickerKind::Source(_) => fl!("select-archive"),
        PathPickerKind::MountPoint => fl!("select-mount-point"),
        PathPickerKind::WriteOverlay => fl!("select-write-overlay"),
    };

    Task::perform(
        async move {
            let dialog = file_chooser::open::Dialog::new().title(title);
            let response = match kind {
                PathPickerKind::Source(_) => dialog.open_file().await,
                PathPickerKind::MountPoint | PathPickerKind::WriteOverlay => {
                    dialog.open_folder().await
                }
            };
            let path = match response {
                Ok(response) => response
                    .url()
                    .to_file_path()
                    .ok()
                    .map(|path| path.to_string_lossy().to_string()),
                Err(file_chooser::Error::Cancelled) => None,
                Err(err) => {
                    tracing::warn!(?err, "file dialog failed");
                    None
                }
            };
            Message::PathPicked(kind, path)
        },
        |msg| msg.into(),
    )
}
