// SPDX-License-Identifier: GPL-3.0-only

mod app;
mod cli;
mod config;
mod i18n;
mod logging;
mod ui;
mod views;

use clap::Parser;

use crate::app::{AppModel, Flags, exit_with};
use crate::cli::{Cli, QuickMount};
use crate::config::Config;
use crate::ui::app::APP_ID;

fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();

    let config = Config::load(APP_ID);
    logging::init(&config);

    let requested_languages = i18n_embed::DesktopLanguageRequester::requested_languages();
    i18n::init(&requested_languages);

    // The same command runs whichever way the mount is started.
    cli.args = config.apply_to_args(&cli.args);

    let tool = cli::resolve_tool(cli.tool.as_deref())?;

    if cli.print_command {
        return cli::print_command(&cli);
    }

    if cli.no_window {
        let code = cli::run_without_window(&cli, tool)?;
        exit_with(code);
    }

    // Outlives the window so a launch started here keeps streaming into it.
    let runtime = tokio::runtime::Runtime::new()?;

    let mut flags = Flags {
        args: cli.args.clone(),
        tool,
        require_mount_point: cli.require_mount_point,
        started: None,
        rejection: None,
    };

    if cli.force_requested() {
        match runtime.block_on(cli::mount_now(&cli, &flags.tool)) {
            Ok(QuickMount::Mounted) => exit_with(0),
            Ok(QuickMount::Pending(started)) => flags.started = Some(started),
            Err(failure) => {
                tracing::warn!(?failure, "automatic mount did not start");
                flags.rejection = Some(failure);
            }
        }
    }

    let settings = cosmic::app::Settings::default().size_limits(
        cosmic::iced::Limits::NONE
            .min_width(480.0)
            .min_height(360.0),
    );

    cosmic::app::run::<AppModel>(settings, flags)?;
    drop(runtime);
    Ok(())
}
