// SPDX-License-Identifier: GPL-3.0-only

use cosmic::{Element, cosmic_theme, iced::Alignment, iced::Length, theme, widget};

use crate::app::Message;
use crate::config::{Config, LoggingLevel};
use crate::fl;

pub fn settings<'a>(config: &Config) -> Element<'a, Message> {
    let cosmic_theme::Spacing {
        space_s, space_m, ..
    } = theme::active().cosmic().spacing;

    let defaults_section = widget::container(
        widget::column()
            .push(widget::text::title4(fl!("new-mounts")))
            .push(
                widget::checkbox(fl!("union-mount-default"), config.default_union_mount)
                    .on_toggle(Message::ToggleDefaultUnionMount),
            )
            .push(
                widget::checkbox(fl!("recursive-default"), config.default_recursive)
                    .on_toggle(Message::ToggleDefaultRecursive),
            )
            .spacing(space_s)
            .align_x(Alignment::Start),
    )
    .width(Length::Fill);

    let logging_level_options: Vec<String> = LoggingLevel::NAMES
        .iter()
        .map(|name| name.to_string())
        .collect();

    let logging_level_dropdown = widget::dropdown(
        logging_level_options,
        Some(config.log_level.to_index()),
        Message::LogLevelChanged,
    )
    .width(cosmic::iced::Length::Shrink);

    let logging_section = widget::container(
        widget::column()
            .push(widget::text::title4(fl!("logging")))
            .push(widget::text::caption(fl!("log-level")))
            .push(logging_level_dropdown)
            .push(
                widget::checkbox(fl!("log-to-disk"), config.log_to_disk)
                    .on_toggle(Message::ToggleLogToDisk),
            )
            .spacing(space_s)
            .align_x(Alignment::Start),
    )
    .width(Length::Fill);

    widget::column()
        .push(defaults_section)
        .push(logging_section)
        .spacing(space_m)
        .width(Length::Fill)
        .into()
}
