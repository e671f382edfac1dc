//! Tool-level error taxonomy shared by every subcommand.
//!
//! Usage errors (bad arguments, wrong transport, payload limits) and
//! transport errors (I/O at the send/receive boundary) both terminate the
//! invoking command; `main` reports them through `anyhow`.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    /// Invalid or missing arguments, or a command used over the wrong transport.
    #[error("{0}")]
    Usage(String),

    #[error(
        "Cannot send {count} samples. The max number of accel samples that can be sent at a time is {max}."
    )]
    TooManySamples { count: usize, max: usize },

    /// I/O failure while talking to the emulator, carrying the underlying message.
    #[error("{0}")]
    Transport(String),

    #[error("browser: {0}")]
    Browser(String),
}

impl ToolError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_) | Self::TooManySamples { .. })
    }
}

impl From<io::Error> for ToolError {
    fn from(err: io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
