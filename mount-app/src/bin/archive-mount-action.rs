// SPDX-License-Identifier: GPL-3.0-only

//! Context-menu action for file managers
//!
//! Works as a Nautilus script (selection in the environment) and as a
//! desktop-entry action (selection as `%F` arguments).

use anyhow::Result;
use clap::Parser;
use mount_sys::extension::{MOUNT_ADVANCED_ITEM, MOUNT_ITEM};
use mount_sys::{ArchiveMenuProvider, FrontendLauncher, ScriptHost};
use std::path::PathBuf;

const FRONTEND: &str = "cosmic-ext-archive-mount";

/// Mount the selected archives
#[derive(Parser)]
#[command(name = "archive-mount-action")]
#[command(about = "Mount selected archives with ratarmount", long_about = None)]
struct Cli {
    /// Open the mount window instead of mounting right away
    #[arg(long)]
    advanced: bool,

    /// Selected files; falls back to NAUTILUS_SCRIPT_SELECTED_FILE_PATHS
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize tracing to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut host = ScriptHost::from_env(cli.files);
    let provider = ArchiveMenuProvider::new(FrontendLauncher::new(frontend_program()));
    if provider.register(&mut host) == 0 {
        tracing::info!("selection holds no archives; nothing to do");
        return Ok(());
    }

    let item = if cli.advanced {
        MOUNT_ADVANCED_ITEM
    } else {
        MOUNT_ITEM
    };
    host.activate(item)?;
    Ok(())
}

/// The front-end installed next to this binary, else the one on PATH.
fn frontend_program() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(FRONTEND)))
        .filter(|candidate| candidate.is_file())
        .or_else(|| which::which(FRONTEND).ok())
        .unwrap_or_else(|| PathBuf::from(FRONTEND))
}
