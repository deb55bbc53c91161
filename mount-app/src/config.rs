// SPDX-License-Identifier: GPL-3.0-only

use cosmic::cosmic_config::{self, CosmicConfigEntry, cosmic_config_derive::CosmicConfigEntry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
pub enum LoggingLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LoggingLevel {
    pub const NAMES: [&'static str; 5] = ["Error", "Warn", "Info", "Debug", "Trace"];

    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Error,
            1 => Self::Warn,
            2 => Self::Info,
            3 => Self::Debug,
            4 => Self::Trace,
            _ => Self::Info,
        }
    }

    pub fn to_index(self) -> usize {
        match self {
            Self::Error => 0,
            Self::Warn => 1,
            Self::Info => 2,
            Self::Debug => 3,
            Self::Trace => 4,
        }
    }

    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, CosmicConfigEntry, Eq, PartialEq)]
#[version = 1]
pub struct Config {
    pub log_to_disk: bool,
    pub log_level: LoggingLevel,
    /// Union mount unless the arguments disable it.
    pub default_union_mount: bool,
    /// Recursive mounting even when the arguments do not ask for it.
    pub default_recursive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_to_disk: true,
            log_level: LoggingLevel::Info,
            default_union_mount: true,
            default_recursive: false,
        }
    }
}

impl Config {
    pub fn load(app_id: &str) -> Self {
        cosmic_config::Config::new(app_id, Config::VERSION)
            .map(|context| match Self::get_entry(&context) {
                Ok(config) => config,
                Err((_errors, config)) => config,
            })
            .unwrap_or_default()
    }

    /// Adds the stored defaults to a forwarded argument list.
    ///
    /// Every start path goes through here, so the window, an automatic mount
    /// and `--no-window` all run the same command. Defaults go in front and the
    /// user's arguments keep their order; a flag already given is not repeated.
    pub fn apply_to_args(&self, args: &[String]) -> Vec<String> {
        let given = |flags: &[&str]| args.iter().any(|arg| flags.contains(&arg.as_str()));

        let mut defaults = Vec::new();
        if self.default_recursive && !given(&["-r", "--recursive"]) {
            defaults.push("--recursive".to_string());
        }
        if !self.default_union_mount && !given(&["--disable-union-mount"]) {
            defaults.push("--disable-union-mount".to_string());
        }

        defaults.into_iter().chain(args.iter().cloned()).collect()
    }

    /// Persists the current values; failures only cost the next start its settings.
    pub fn save(&self, app_id: &str) {
        match cosmic_config::Config::new(app_id, Config::VERSION) {
            Ok(helper) => {
                if let Err(e) = self.write_entry(&helper) {
                    tracing::warn!(?e, "failed to write config");
                }
            }
            Err(e) => tracing::warn!(?e, "failed to open config"),
        }
    }
}
