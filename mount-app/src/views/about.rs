// SPDX-License-Identifier: GPL-3.0-only

use cosmic::iced::{Alignment, Length};
use cosmic::{Element, cosmic_theme, theme, widget};
use mount_types::TOOL_NAME;

use crate::app::{Message, REPOSITORY};
use crate::fl;

const TOOL_REPOSITORY: &str = "https://github.com/mxmlnkn/ratarmount";

/// The tool's own `--help`, loaded on first open.
pub fn help(text: Option<&str>) -> Element<'_, Message> {
    widget::text::body(text.map_or_else(|| fl!("loading"), str::to_string)).into()
}

pub fn about(attributions: Option<&str>) -> Element<'_, Message> {
    let cosmic_theme::Spacing {
        space_xxs,
        space_s,
        ..
    } = theme::active().cosmic().spacing;

    let hash = env!("VERGEN_GIT_SHA");
    let short_hash: String = hash.chars().take(7).collect();
    let date = env!("VERGEN_GIT_COMMIT_DATE");

    let commit_hash_link = widget::button::custom(widget::text::caption(short_hash))
        .class(cosmic::theme::Button::Link)
        .on_press(Message::LaunchUrl(format!("{REPOSITORY}/commits/{hash}")))
        .padding(0);

    let commit_info = widget::row::with_capacity(3)
        .push(widget::text::caption(format!(
            "{} ",
            fl!("version", version = env!("CARGO_PKG_VERSION"), date = date)
        )))
        .push(commit_hash_link)
        .push(widget::text::caption(")"))
        .spacing(0)
        .align_y(Alignment::Center);

    let links = widget::row::with_capacity(2)
        .push(widget::button::link(fl!("project-page")).on_press(Message::OpenRepositoryUrl))
        .push(
            widget::button::link(fl!("tool-project", tool = TOOL_NAME))
                .on_press(Message::LaunchUrl(TOOL_REPOSITORY.to_string())),
        )
        .spacing(space_s);

    widget::column()
        .push(widget::text::title3(fl!("app-title")))
        .push(widget::text::body(fl!("app-description", tool = TOOL_NAME)))
        .push(commit_info)
        .push(links)
        .push(widget::text::title4(fl!("attributions")))
        .push(widget::text::caption(attributions.map_or_else(|| fl!("loading"), str::to_string)))
        .spacing(space_xxs)
        .width(Length::Fill)
        .into()
}
