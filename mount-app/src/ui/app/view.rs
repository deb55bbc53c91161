// SPDX-License-Identifier: GPL-3.0-only

use super::message::Message;
use super::state::{AppModel, ContextPage, Page, ShowDialog};
use crate::fl;
use crate::views::{about, config_page, execution_page, help, settings};
use cosmic::Element;
use cosmic::app::context_drawer as cosmic_context_drawer;
use cosmic::widget::{self, button, icon};
use mount_types::TOOL_NAME;

/// Elements to pack at the end of the header bar.
pub(crate) fn header_end(_app: &AppModel) -> Vec<Element<'_, Message>> {
    vec![
        widget::button::icon(icon::from_name("help-browser-symbolic"))
            .on_press(Message::ToggleContextPage(ContextPage::Help))
            .into(),
        widget::button::icon(icon::from_name("help-about-symbolic"))
            .on_press(Message::ToggleContextPage(ContextPage::About))
            .into(),
        widget::button::icon(icon::from_name("preferences-system-symbolic"))
            .on_press(Message::ToggleContextPage(ContextPage::Settings))
            .into(),
    ]
}

pub(crate) fn dialog(app: &AppModel) -> Option<Element<'_, Message>> {
    match app.dialog.as_ref()? {
        ShowDialog::ToolNotFound(missing) => Some(
            widget::dialog()
                .title(fl!("tool-not-found", tool = TOOL_NAME))
                .body(fl!(
                    "tool-not-found-body",
                    program = missing.tool.as_str(),
                    hint = missing.hint.as_str()
                ))
                .primary_action(button::standard(fl!("ok")).on_press(Message::CloseDialog))
                .into(),
        ),
    }
}

/// Display a context drawer if the context page is requested.
pub(crate) fn context_drawer(
    app: &AppModel,
) -> Option<cosmic_context_drawer::ContextDrawer<'_, Message>> {
    if !app.core.window.show_context {
        return None;
    }

    Some(match app.context_page {
        ContextPage::Help => cosmic_context_drawer::context_drawer(
            help(app.help_text.as_deref()),
            Message::ToggleContextPage(ContextPage::Help),
        )
        .title(fl!("tool-help", tool = TOOL_NAME)),
        ContextPage::About => cosmic_context_drawer::context_drawer(
            about(app.attributions.as_deref()),
            Message::ToggleContextPage(ContextPage::About),
        )
        .title(fl!("about")),
        ContextPage::Settings => cosmic_context_drawer::context_drawer(
            settings(&app.config),
            Message::ToggleContextPage(ContextPage::Settings),
        )
        .title(fl!("settings")),
    })
}

/// Describes the interface based on the current state of the application model.
pub(crate) fn view(app: &AppModel) -> Element<'_, Message> {
    let content = match app.page {
        Page::Config => config_page(&app.form),
        Page::Execution => execution_page(&app.execution),
    };

    widget::container(content)
        .padding(16)
        .width(cosmic::iced::Length::Fill)
        .height(cosmic::iced::Length::Fill)
        .into()
}
