//! Live session driving a connected transport.
//!
//! One session owns one transport handle and executes one command at a
//! time; `execute` holds `&mut self` for its whole lifetime, so concurrent
//! use of a single session does not compile. Run one session per remote
//! host and execute them in parallel tasks when fan-out is needed.

use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::command::{Command, ExecuteOptions};
use crate::error::SshRelayError;
use crate::events::{self, Action, EventArgs, EventHub, Phase};
use crate::response::Response;
use crate::transport::{ChannelEvent, CommandChannel, FileSink, Transport};
use crate::Result;

/// Pattern announcing a password prompt on the error stream.
static SUDO_PROMPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[sudo\] password for").expect("valid prompt pattern"));

/// A command-execution session over a connected transport.
///
/// Offers four execution modes layered on one primitive:
/// [`execute`](Session::execute) (raw),
/// [`execute_with_timeout`](Session::execute_with_timeout) (deadline-bounded,
/// returns a sentinel [`Response`]),
/// [`execute_with_success`](Session::execute_with_success) (returns `None`
/// on unexpected exit codes), and
/// [`execute_checked`](Session::execute_checked) (errors on unexpected exit
/// codes). [`MockSession`](crate::MockSession) exposes the identical
/// surface without a network.
pub struct Session<T: Transport> {
    transport: T,
    sudo_password: Option<String>,
    hooks: EventHub,
}

impl<T: Transport> Session<T> {
    /// Wrap an already-connected transport handle.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            sudo_password: None,
            hooks: EventHub::new(),
        }
    }

    /// Establish a connection and wrap it.
    ///
    /// `before:connect` fires on the shared hub only, since no instance
    /// exists yet to carry callbacks; `after:connect` fires through the
    /// normal both-hub path.
    pub async fn connect(config: T::Config) -> Result<Self> {
        events::emit_shared(Phase::Before, Action::Connect, &EventArgs::None);
        let transport = T::connect(config).await?;
        let session = Self::new(transport);
        session.emit(Phase::After, Action::Connect, &EventArgs::None);
        Ok(session)
    }

    /// Set the default credential used to answer password prompts when a
    /// call requests escalation without its own credential.
    pub fn with_sudo_password(mut self, password: impl Into<String>) -> Self {
        self.sudo_password = Some(password.into());
        self
    }

    /// Replace the default escalation credential.
    pub fn set_sudo_password(&mut self, password: impl Into<String>) {
        self.sudo_password = Some(password.into());
    }

    /// The underlying transport handle.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Instance-scoped lifecycle callbacks.
    ///
    /// These fire alongside the process-wide hub (instance first); see
    /// [`events::shared_before`] and [`events::shared_after`] for the
    /// shared side.
    pub fn hooks_mut(&mut self) -> &mut EventHub {
        &mut self.hooks
    }

    /// Close the session.
    ///
    /// Transport close failures are logged and swallowed; `after:close`
    /// still fires so observers see the session as gone either way.
    pub async fn close(&mut self) {
        self.emit(Phase::Before, Action::Close, &EventArgs::None);
        if let Err(error) = self.transport.close().await {
            tracing::warn!(error = %error, "transport close failed");
        }
        self.emit(Phase::After, Action::Close, &EventArgs::None);
    }

    /// Execute a command (or `&&`-chain) and collect its full output.
    ///
    /// Blocks the calling task until the channel completes. Under
    /// escalation, password prompts on the error stream are answered with
    /// the per-call credential if given, else the session default.
    ///
    /// # Errors
    ///
    /// [`SshRelayError::CommandStart`] if the transport reports the command
    /// could not begin executing (fatal, never retried), or
    /// [`SshRelayError::Transport`] for stream failures mid-flight. In the
    /// latter case the channel is closed best-effort before the error
    /// propagates.
    pub async fn execute(
        &mut self,
        command: impl Into<Command>,
        options: &ExecuteOptions,
    ) -> Result<Response> {
        let composed = command.into().compose(options.wants_sudo());
        tracing::info!(command = %composed, "executing remote command");
        self.emit(
            Phase::Before,
            Action::Execute,
            &EventArgs::Command(&composed),
        );

        let mut channel = self
            .transport
            .open_command_channel(&composed)
            .await
            .map_err(|source| SshRelayError::CommandStart {
                command: composed.clone(),
                source,
            })?;

        match drain_channel(&mut channel, &composed, options, self.sudo_password.as_deref()).await
        {
            Ok(response) => {
                self.emit(
                    Phase::After,
                    Action::Execute,
                    &EventArgs::Response(&response),
                );
                Ok(response)
            }
            Err(error) => {
                if let Err(close_error) = channel.close().await {
                    tracing::warn!(error = %close_error, "channel close after failure also failed");
                }
                Err(error)
            }
        }
    }

    /// Execute with a deadline.
    ///
    /// Races [`execute`](Session::execute) against
    /// `options.effective_timeout()`. On expiry this returns (it does not
    /// raise) the timeout sentinel [`Response`] with exit code
    /// [`TIMEOUT_EXIT_CODE`](crate::TIMEOUT_EXIT_CODE) and the composed
    /// command recorded.
    ///
    /// Expiry abandons the wait locally: the in-flight execution future is
    /// dropped, which drops the channel. The remote process is NOT
    /// signalled and may run to completion unattended; transports are
    /// expected to tear down the channel on drop.
    pub async fn execute_with_timeout(
        &mut self,
        command: impl Into<Command>,
        options: &ExecuteOptions,
    ) -> Result<Response> {
        let command = command.into();
        let allowed = options.effective_timeout();
        match tokio::time::timeout(allowed, self.execute(command.clone(), options)).await {
            Ok(result) => result,
            Err(_) => {
                let composed = command.compose(options.wants_sudo());
                tracing::warn!(
                    command = %composed,
                    allowed_secs = allowed.as_secs(),
                    "command did not finish within the allowed time"
                );
                Ok(Response::timeout(composed, allowed))
            }
        }
    }

    /// Execute and check the exit code, returning `None` on mismatch.
    ///
    /// `Some(response)` when the exit code equals
    /// `options.effective_success_code()` (default 0), `None` otherwise.
    /// Callers inspect the return shape; nothing is raised for an
    /// unexpected exit code.
    pub async fn execute_with_success(
        &mut self,
        command: impl Into<Command>,
        options: &ExecuteOptions,
    ) -> Result<Option<Response>> {
        let response = self.execute(command, options).await?;
        if response.exit_code == Some(options.effective_success_code()) {
            Ok(Some(response))
        } else {
            Ok(None)
        }
    }

    /// Execute and check the exit code, erroring on mismatch.
    ///
    /// # Errors
    ///
    /// [`SshRelayError::CommandFailed`] carrying the combined
    /// `stdout + "\n" + stderr` when the exit code differs from
    /// `options.effective_success_code()`.
    pub async fn execute_checked(
        &mut self,
        command: impl Into<Command>,
        options: &ExecuteOptions,
    ) -> Result<Response> {
        let response = self.execute(command, options).await?;
        if response.exit_code == Some(options.effective_success_code()) {
            Ok(response)
        } else {
            Err(SshRelayError::CommandFailed {
                output: response.output(),
            })
        }
    }

    /// Upload bytes to a remote path, returning the byte count written.
    ///
    /// Without escalation the path is opened directly through the
    /// transport. With escalation the bytes are staged at a unique
    /// temporary path with an ordinary write, then moved into place with
    /// an escalated `mv`, so privileged placement needs no transport-level
    /// privileged file I/O. A failed move surfaces as
    /// [`SshRelayError::CommandFailed`].
    ///
    /// `write_data` hooks fire around the whole operation, not around the
    /// nested staging write; the escalated move fires its own `execute`
    /// hooks like any other command.
    pub async fn write_data(
        &mut self,
        path: &str,
        data: &[u8],
        options: &ExecuteOptions,
    ) -> Result<usize> {
        self.emit(
            Phase::Before,
            Action::WriteData,
            &EventArgs::Write {
                path,
                len: data.len(),
            },
        );

        let written = if options.wants_sudo() {
            self.staged_write(path, data, options).await?
        } else {
            self.direct_write(path, data).await?
        };

        self.emit(
            Phase::After,
            Action::WriteData,
            &EventArgs::Write {
                path,
                len: written,
            },
        );
        Ok(written)
    }

    async fn direct_write(&mut self, path: &str, data: &[u8]) -> Result<usize> {
        let mut file = self.transport.open_file_for_write(path).await?;
        file.write_all(data).await?;
        file.close().await?;
        Ok(data.len())
    }

    async fn staged_write(
        &mut self,
        path: &str,
        data: &[u8],
        options: &ExecuteOptions,
    ) -> Result<usize> {
        let staging = staging_path();
        self.direct_write(&staging, data).await?;

        let move_options = ExecuteOptions {
            sudo: options.sudo.clone(),
            ..ExecuteOptions::default()
        };
        self.execute_checked(
            Command::new(format!("mv {} {}", staging, path)),
            &move_options,
        )
        .await?;
        Ok(data.len())
    }

    /// Fire on the instance hub, then the shared hub.
    fn emit(&self, phase: Phase, action: Action, args: &EventArgs<'_>) {
        self.hooks.emit(phase, action, args);
        events::emit_shared(phase, action, args);
    }
}

/// Drain channel events into a response until the channel completes.
async fn drain_channel<C: CommandChannel>(
    channel: &mut C,
    command: &str,
    options: &ExecuteOptions,
    default_password: Option<&str>,
) -> Result<Response> {
    let mut response = Response::new(command);
    while let Some(event) = channel.next_event().await? {
        match event {
            ChannelEvent::Stdout(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                tracing::debug!("{}", text.trim_end());
                response.stdout.push_str(&text);
            }
            ChannelEvent::Stderr(bytes) => {
                // Carriage returns are stripped before accumulation; the
                // prompt check runs on the cleaned chunk.
                let text = String::from_utf8_lossy(&bytes).replace('\r', "");
                tracing::warn!("{}", text.trim_end());
                if SUDO_PROMPT.is_match(&text) {
                    let password = options
                        .sudo_credential()
                        .or(default_password)
                        .unwrap_or("");
                    channel.send_data(format!("{}\n", password).as_bytes()).await?;
                }
                response.stderr.push_str(&text);
            }
            ChannelEvent::ExitStatus(code) => {
                tracing::info!(exit_code = code, "remote command finished");
                response.exit_code = Some(code);
            }
            ChannelEvent::ExitSignal(signal) => {
                response.exit_signal = Some(signal);
            }
        }
    }
    Ok(response)
}

/// Unique temporary path for staging escalated uploads.
fn staging_path() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("/tmp/.staged-upload-{:x}", nanos)
}
