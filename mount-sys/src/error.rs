// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

/// Error types for collecting, building and launching a mount
#[derive(Error, Debug)]
pub enum MountError {
    /// Bad user input; shown next to the offending field.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{tool} not found: {hint}")]
    ToolNotFound { tool: String, hint: String },

    /// The tool ran and rejected the request.
    #[error("Mount failed with exit code {exit_code}: {stderr}")]
    MountFailed { exit_code: i32, stderr: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for mount operations
pub type Result<T> = std::result::Result<T, MountError>;
