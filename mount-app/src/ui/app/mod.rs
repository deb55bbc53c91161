// SPDX-License-Identifier: GPL-3.0-only

pub(crate) mod message;
pub(crate) mod state;
pub(crate) mod subscriptions;
pub(crate) mod update;
pub(crate) mod view;

pub(crate) use message::Message;
pub(crate) use state::{AppModel, ContextPage, Page};

use message::StartFailure;
use state::{Execution, ShowDialog};

use crate::config::Config;
use crate::ui::form::FormState;
use cosmic::app::{Core, Task};
use cosmic::{Application, Element};

pub(crate) const APP_ID: &str = "com.cosmic.ext.ArchiveMount";

/// Create a COSMIC application from the app model.
impl Application for AppModel {
    /// The async executor that will be used to run your application's commands.
    type Executor = cosmic::executor::Default;

    /// Data that your application receives to its init method.
    type Flags = state::Flags;

    /// Messages which the application and its widgets will emit.
    type Message = Message;

    /// Unique identifier in RDNN (reverse domain name notation) format.
    const APP_ID: &'static str = APP_ID;

    fn core(&self) -> &Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut Core {
        &mut self.core
    }

    /// Initializes the application with any given flags and startup commands.
    fn init(core: Core, flags: Self::Flags) -> (Self, Task<Self::Message>) {
        let config = Config::load(Self::APP_ID);

        let mut app = AppModel {
            core,
            context_page: ContextPage::default(),
            config,
            page: Page::Config,
            dialog: None,
            tool: flags.tool,
            require_mount_point: flags.require_mount_point,
            form: FormState::from_args(&flags.args),
            execution: Execution::default(),
            help_text: None,
            attributions: None,
        };
        match flags.rejection {
            Some(StartFailure::ToolNotFound(missing)) => {
                app.dialog = Some(ShowDialog::ToolNotFound(missing));
            }
            Some(StartFailure::Other(message)) => app.form.error = Some(message),
            None => {}
        }

        if let Some(started) = flags.started {
            app.page = Page::Execution;
            app.execution.start(started.launch);
            for event in started.early_events {
                update::apply_launch_event(&mut app, event);
            }
        }

        // Create a startup command that sets the window title.
        let command = app.update_title();

        (app, command)
    }

    fn header_end(&self) -> Vec<Element<'_, Self::Message>> {
        view::header_end(self)
    }

    fn dialog(&self) -> Option<Element<'_, Self::Message>> {
        view::dialog(self)
    }

    /// Display a context drawer if the context page is requested.
    fn context_drawer(
        &self,
    ) -> Option<cosmic::app::context_drawer::ContextDrawer<'_, Self::Message>> {
        view::context_drawer(self)
    }

    /// Describes the interface based on the current state of the application model.
    fn view(&self) -> Element<'_, Self::Message> {
        view::view(self)
    }

    /// Register subscriptions for this application.
    fn subscription(&self) -> cosmic::iced::Subscription<Self::Message> {
        subscriptions::subscription(self)
    }

    /// Handles messages emitted by the application and its widgets.
    fn update(&mut self, message: Self::Message) -> Task<Self::Message> {
        update::update(self, message)
    }
}
