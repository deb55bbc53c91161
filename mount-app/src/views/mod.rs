// SPDX-License-Identifier: GPL-3.0-only

mod about;
mod config;
mod execution;
mod settings;

pub use about::{about, help};
pub use config::config_page;
pub use execution::execution_page;
pub use settings::settings;
