// SPDX-License-Identifier: GPL-3.0-only

use cosmic::iced::{Alignment, Length};
use cosmic::widget::{self, button};
use cosmic::{Element, cosmic_theme, theme};
use mount_types::{LaunchState, TOOL_NAME};

use crate::app::Message;
use crate::fl;
use crate::ui::app::state::Execution;

/// Streamed tool output with Abort while running and Close afterwards.
pub fn execution_page(execution: &Execution) -> Element<'_, Message> {
    let cosmic_theme::Spacing {
        space_xxs, space_m, ..
    } = theme::active().cosmic().spacing;

    let status = match &execution.state {
        LaunchState::Idle | LaunchState::Launching => fl!("running", tool = TOOL_NAME),
        LaunchState::Succeeded => fl!("mounted"),
        LaunchState::Failed(message) => message.clone(),
    };

    let output = widget::container(
        widget::scrollable(
            widget::container(widget::text::body(execution.log.as_str()))
                .padding(8)
                .width(Length::Fill),
        )
        .height(Length::Fill),
    )
    .class(cosmic::style::Container::Card)
    .height(Length::Fill);

    let mut abort = button::destructive(fl!("abort"));
    if execution.launch.is_some() {
        abort = abort.on_press(Message::Abort);
    }

    let buttons = widget::row::with_capacity(4)
        .push(widget::text::caption(status))
        .push(widget::Space::new(Length::Fill, 0))
        .push(abort)
        .push(button::standard(fl!("close")).on_press(Message::Close))
        .spacing(space_xxs)
        .align_y(Alignment::Center);

    widget::column()
        .push(widget::text::title4(fl!("output")))
        .push(output)
        .push(buttons)
        .spacing(space_m)
        .into()
}
