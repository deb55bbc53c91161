// SPDX-License-Identifier: GPL-3.0-only

use super::Message;
use crate::config::Config;
use cosmic::Application;
use cosmic::iced::Subscription;
use cosmic::iced::keyboard::key::Named;
use cosmic::iced::{Event, event, keyboard};
use futures_util::SinkExt;

use super::state::AppModel;

/// Subscription for the output of a running tool.
struct LaunchOutputSubscription;

/// Register subscriptions for this application.
///
/// Subscriptions are long-running async tasks running in the background which
/// emit messages to the application through a channel.
pub(crate) fn subscription(app: &AppModel) -> Subscription<Message> {
    let mut subs: Vec<Subscription<Message>> = vec![
        event::listen_with(|event, _, _| match event {
            Event::Keyboard(keyboard::Event::KeyPressed {
                key: keyboard::Key::Named(Named::Escape),
                ..
            }) => Some(Message::Cancel),
            Event::Keyboard(keyboard::Event::KeyPressed {
                key: keyboard::Key::Named(Named::Enter),
                ..
            }) => Some(Message::Mount),
            _ => None,
        }),
        // Watch for application configuration changes.
        app.core
            .watch_config::<Config>(<AppModel as Application>::APP_ID)
            .map(|update| Message::UpdateConfig(update.config)),
    ];

    // Forward tool output until the process exits; one subscription per pid.
    if let Some(ref launch) = app.execution.launch {
        let launch = launch.clone();
        subs.push(Subscription::run_with_id(
            (
                std::any::TypeId::of::<LaunchOutputSubscription>(),
                launch.pid(),
            ),
            cosmic::iced::stream::channel(64, move |mut output| {
                let launch = launch.clone();
                async move {
                    let Some(mut events) = launch.take_events() else {
                        tracing::debug!(pid = launch.pid(), "launch events already taken");
                        return;
                    };
                    while let Some(event) = events.recv().await {
                        if output.send(Message::Launch(event)).await.is_err() {
                            break;
                        }
                    }
                }
            }),
        ));
    }

    Subscription::batch(subs)
}
