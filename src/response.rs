//! Command outcome record.

use std::time::Duration;

/// Exit code reserved for the timeout sentinel response.
pub const TIMEOUT_EXIT_CODE: i32 = -255;

/// Outcome of one remote command execution.
///
/// `stdout` and `stderr` accumulate as channel data arrives and are never
/// unset, so streaming appends cannot fail. The exit code is absent until
/// the channel reports one (a channel torn down before the remote process
/// exits yields `None`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Accumulated standard output.
    pub stdout: String,
    /// Accumulated error output.
    pub stderr: String,
    /// Exit code reported by the remote process, if it exited normally.
    pub exit_code: Option<i32>,
    /// Signal number, if the remote process was killed by a signal.
    pub exit_signal: Option<i32>,
    /// The composed command line this response belongs to.
    pub command: String,
}

impl Response {
    /// Create an empty response for the given composed command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            exit_signal: None,
            command: command.into(),
        }
    }

    /// Create the sentinel response for a command that exceeded its
    /// allowed execution time.
    ///
    /// Carries [`TIMEOUT_EXIT_CODE`] and a fixed message naming the
    /// threshold; live and mock sessions produce the identical shape.
    pub fn timeout(command: impl Into<String>, allowed: Duration) -> Self {
        Self {
            stdout: String::new(),
            stderr: format!(
                "Command did not finish executing within the allowed {} seconds.",
                allowed.as_secs()
            ),
            exit_code: Some(TIMEOUT_EXIT_CODE),
            exit_signal: None,
            command: command.into(),
        }
    }

    /// Check if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Check if this is the timeout sentinel.
    pub fn is_timeout(&self) -> bool {
        self.exit_code == Some(TIMEOUT_EXIT_CODE)
    }

    /// Combined output: `stdout + "\n" + stderr`.
    pub fn output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}
