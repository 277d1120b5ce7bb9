//! Error types for ssh-relay.

use thiserror::Error;

/// Main error type for ssh-relay operations.
#[derive(Error, Debug)]
pub enum SshRelayError {
    /// The remote command could not begin executing on its channel.
    ///
    /// This is fatal for the execution attempt and is never retried or
    /// converted into a [`Response`](crate::Response).
    #[error("command \"{command}\" was unable to start")]
    CommandStart {
        /// The composed command line that failed to start.
        command: String,
        /// The transport's report of the failure.
        #[source]
        source: std::io::Error,
    },

    /// A command completed with an exit code other than the expected one.
    ///
    /// Raised by `execute_checked`; the `output` carries the command's
    /// combined stdout and stderr.
    #[error("command execution failed: {output}")]
    CommandFailed {
        /// Combined `stdout + "\n" + stderr` of the failed command.
        output: String,
    },

    /// No registered command matched an issued command (mock sessions only).
    ///
    /// Indicates a gap in test setup, never a real execution failure.
    #[error("no registered command matched \"{0}\"")]
    UndefinedCommand(String),

    /// Transport-level failure while connecting, streaming, or writing.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

/// Convenience Result type for ssh-relay operations.
pub type Result<T> = std::result::Result<T, SshRelayError>;
