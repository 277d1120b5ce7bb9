//! Command composition and execution options.
//!
//! One or more shell commands are always collapsed into a single composed
//! line before dispatch. Chains are joined with `" && "` so a failing
//! command short-circuits the rest, and privileged execution prefixes every
//! individual command before joining.

use std::time::Duration;

/// Prefix applied to each command under privileged execution.
///
/// `--stdin` makes sudo read its password from standard input instead of a
/// terminal, so the session can supply it programmatically when prompted.
pub const SUDO_PREFIX: &str = "sudo --stdin";

/// Default allowed execution time for `execute_with_timeout`.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default expected exit code for the success-checked and checked modes.
pub const DEFAULT_SUCCESS_CODE: i32 = 0;

/// One or more shell commands executed as a single chained line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    commands: Vec<String>,
}

impl Command {
    /// Create a command from a single shell line.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            commands: vec![command.into()],
        }
    }

    /// Create a chain of commands, joined with `" && "` on composition.
    pub fn chain<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }

    /// Compose the single shell line used for dispatch and matching.
    ///
    /// With `sudo`, every individual command is prefixed before joining,
    /// so each link of the chain runs escalated.
    pub fn compose(&self, sudo: bool) -> String {
        let parts: Vec<String> = self
            .commands
            .iter()
            .map(|command| {
                if sudo {
                    format!("{} {}", SUDO_PREFIX, command)
                } else {
                    command.clone()
                }
            })
            .collect();
        parts.join(" && ")
    }
}

impl From<&str> for Command {
    fn from(command: &str) -> Self {
        Self::new(command)
    }
}

impl From<String> for Command {
    fn from(command: String) -> Self {
        Self::new(command)
    }
}

impl From<Vec<&str>> for Command {
    fn from(commands: Vec<&str>) -> Self {
        Self::chain(commands)
    }
}

impl From<Vec<String>> for Command {
    fn from(commands: Vec<String>) -> Self {
        Self::chain(commands)
    }
}

impl From<&[&str]> for Command {
    fn from(commands: &[&str]) -> Self {
        Self::chain(commands.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for Command {
    fn from(commands: [&str; N]) -> Self {
        Self::chain(commands)
    }
}

/// Privileged-execution request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sudo {
    /// Escalate, answering password prompts with the session's configured
    /// default credential.
    SessionPassword,
    /// Escalate, answering password prompts with this credential.
    Password(String),
}

/// Options for one execution call.
///
/// Every field is optional with an explicit default, replacing the
/// positional timeout/success-code arguments of earlier designs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Privileged-execution request, if any.
    pub sudo: Option<Sudo>,
    /// Allowed execution time for `execute_with_timeout`.
    pub timeout: Option<Duration>,
    /// Expected exit code for `execute_with_success` and `execute_checked`.
    pub success_code: Option<i32>,
}

impl ExecuteOptions {
    /// Create empty options: no escalation, default timeout, success code 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request privileged execution using the session's default credential.
    pub fn sudo(mut self) -> Self {
        self.sudo = Some(Sudo::SessionPassword);
        self
    }

    /// Request privileged execution with a per-call credential.
    pub fn sudo_password(mut self, password: impl Into<String>) -> Self {
        self.sudo = Some(Sudo::Password(password.into()));
        self
    }

    /// Set the allowed execution time.
    pub fn timeout(mut self, allowed: Duration) -> Self {
        self.timeout = Some(allowed);
        self
    }

    /// Set the expected exit code.
    pub fn success_code(mut self, code: i32) -> Self {
        self.success_code = Some(code);
        self
    }

    /// Whether privileged execution was requested.
    pub fn wants_sudo(&self) -> bool {
        self.sudo.is_some()
    }

    /// The per-call credential, if one was supplied.
    pub fn sudo_credential(&self) -> Option<&str> {
        match &self.sudo {
            Some(Sudo::Password(password)) => Some(password.as_str()),
            _ => None,
        }
    }

    /// The allowed execution time, defaulted.
    pub fn effective_timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }

    /// The expected exit code, defaulted.
    pub fn effective_success_code(&self) -> i32 {
        self.success_code.unwrap_or(DEFAULT_SUCCESS_CODE)
    }
}
