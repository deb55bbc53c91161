// SPDX-License-Identifier: GPL-3.0-only

//! Configuration page: sources, mount point, advanced options and the command line.

use cosmic::iced::{Alignment, Length};
use cosmic::widget::{self, button, icon, text_input};
use cosmic::{Element, cosmic_theme, theme};

use crate::app::Message;
use crate::fl;
use crate::ui::app::message::PathPickerKind;
use crate::ui::form::FormState;

pub fn config_page(state: &FormState) -> Element<'_, Message> {
    let cosmic_theme::Spacing {
        space_xxs,
        space_s,
        space_m,
        ..
    } = theme::active().cosmic().spacing;

    let mut content = widget::column()
        .push(widget::text::title4(fl!("archives")))
        .push(source_rows(state))
        .push(widget::text::title4(fl!("mount-point")))
        .push(path_row(
            fl!("mount-point-placeholder"),
            &state.form.mount_point,
            Message::MountPointChanged,
            PathPickerKind::MountPoint,
        ))
        .push(error_caption(state.field_errors.mount_point.as_deref()))
        .push(
            widget::button::standard(if state.show_advanced {
                fl!("hide-advanced")
            } else {
                fl!("show-advanced")
            })
            .on_press(Message::ToggleAdvanced),
        )
        .spacing(space_s);

    if state.show_advanced {
        content = content.push(advanced_section(state));
    }

    content = content
        .push(
            text_input("ratarmount", state.preview.as_str())
                .label(fl!("command"))
                .on_input(Message::PreviewChanged),
        )
        .push(error_caption(state.error.as_deref()));

    let buttons = widget::row::with_capacity(3)
        .push(widget::Space::new(Length::Fill, 0))
        .push(button::standard(fl!("cancel")).on_press(Message::Cancel))
        .push(button::suggested(fl!("mount")).on_press(Message::Mount))
        .spacing(space_xxs)
        .align_y(Alignment::Center);

    widget::column()
        .push(widget::scrollable(content).height(Length::Fill))
        .push(buttons)
        .spacing(space_m)
        .into()
}

fn source_rows(state: &FormState) -> Element<'_, Message> {
    let rows = &state.form.sources;
    let last = rows.len().saturating_sub(1);
    let mut column = widget::column().spacing(4);

    for (index, source) in rows.iter().enumerate() {
        let is_filled_row = index < last;
        let mut row = widget::row::with_capacity(5)
            .push(
                text_input(fl!("archive-to-mount"), source.as_str())
                    .on_input(move |value| Message::SourceChanged(index, value))
                    .width(Length::Fill),
            )
            .push(
                widget::button::icon(icon::from_name("document-open-symbolic"))
                    .on_press(Message::OpenPathPicker(PathPickerKind::Source(index))),
            )
            .spacing(4)
            .align_y(Alignment::Center);

        if is_filled_row {
            let mut up = widget::button::icon(icon::from_name("go-up-symbolic"));
            if index > 0 {
                up = up.on_press(Message::MoveSourceUp(index));
            }
            let mut down = widget::button::icon(icon::from_name("go-down-symbolic"));
            if index + 1 < last {
                down = down.on_press(Message::MoveSourceDown(index));
            }
            row = row
                .push(up)
                .push(down)
                .push(
                    widget::button::icon(icon::from_name("list-remove-symbolic"))
                        .on_press(Message::RemoveSource(index)),
                );
        }

        let error = state.field_errors.sources.get(index).and_then(Option::as_deref);
        column = column.push(row).push(error_caption(error));
    }

    column.into()
}

fn advanced_section(state: &FormState) -> Element<'_, Message> {
    let form = &state.form;
    let recursive = form.recursion_options_enabled();

    let mut depth = text_input(fl!("unlimited"), state.depth_input.as_str())
        .label(fl!("recursion-depth"))
        .width(Length::Fixed(160.0));
    if recursive {
        depth = depth.on_input(Message::RecursionDepthChanged);
    }

    let mut lazy = widget::checkbox(fl!("lazy-mount"), form.lazy);
    let mut strip = widget::checkbox(fl!("strip-tar-extension"), form.strip_recursive_tar_extension);
    if recursive {
        lazy = lazy.on_toggle(Message::LazyToggled);
        strip = strip.on_toggle(Message::StripTarExtensionToggled);
    }

    widget::column()
        .push(
            text_input::secure_input("", form.password.as_str(), None, true)
                .label(fl!("password"))
                .on_input(Message::PasswordChanged),
        )
        .push(widget::checkbox(fl!("recursive"), form.recursive).on_toggle(Message::RecursiveToggled))
        .push(depth)
        .push(lazy)
        .push(strip)
        .push(widget::text::caption(fl!("write-overlay")))
        .push(path_row(
            fl!("read-only-mount"),
            &form.write_overlay,
            Message::WriteOverlayChanged,
            PathPickerKind::WriteOverlay,
        ))
        .push(error_caption(state.field_errors.write_overlay.as_deref()))
        .push(
            widget::checkbox(fl!("union-mount"), form.union_mount)
                .on_toggle(Message::UnionMountToggled),
        )
        .spacing(8)
        .into()
}

fn path_row<'a>(
    placeholder: String,
    value: &'a str,
    on_input: fn(String) -> Message,
    kind: PathPickerKind,
) -> Element<'a, Message> {
    widget::row::with_capacity(2)
        .push(
            text_input(placeholder, value)
                .on_input(on_input)
                .width(Length::Fill),
        )
        .push(
            widget::button::icon(icon::from_name("folder-open-symbolic"))
                .on_press(Message::OpenPathPicker(kind)),
        )
        .spacing(4)
        .align_y(Alignment::Center)
        .into()
}

/// Inline problem text under a field; empty when there is nothing to report.
fn error_caption(error: Option<&str>) -> Element<'_, Message> {
    let Some(message) = error else {
        return widget::Space::new(0, 0).into();
    };

    widget::container(widget::text::caption(message.to_string()))
        .style(|theme| {
            let cosmic = theme.cosmic();
            widget::container::Style {
                text_color: Some(cosmic.warning_color().into()),
                ..Default::default()
            }
        })
        .into()
}
