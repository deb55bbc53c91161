// SPDX-License-Identifier: GPL-3.0-only

pub const REPOSITORY: &str = env!("CARGO_PKG_REPOSITORY");

pub use crate::ui::app::message::Message;
pub use crate::ui::app::state::{AppModel, Flags};

/// Leaves the process with the given code, the tool's when there is one.
pub fn exit_with(code: i32) -> ! {
    tracing::info!(code, "exiting");
    std::process::exit(code)
}
