//! The mock session itself.

use crate::command::{Command, ExecuteOptions};
use crate::error::SshRelayError;
use crate::events::{self, Action, EventArgs, EventHub, Phase};
use crate::response::Response;
use crate::Result;

use super::command::{CommandMatcher, CommandStub, MatchGroups};

/// A deterministic, in-memory double of [`Session`](crate::Session).
///
/// Register stubs with [`register_command`](MockSession::register_command),
/// then hand the mock to code that executes commands. Every execution mode
/// behaves exactly as the live path would for the synthesized response,
/// including the timeout sentinel, and every composed command is appended
/// to [`executed_commands`](MockSession::executed_commands) for assertions.
///
/// # Example
///
/// ```
/// use ssh_relay::{ExecuteOptions, MockSession};
///
/// # tokio_test::block_on(async {
/// let mut session = MockSession::new();
/// session.register_command("hostname", |c| {
///     c.stdout("web-01\n");
/// });
///
/// let response = session.execute("hostname", &ExecuteOptions::new()).await.unwrap();
/// assert_eq!(response.stdout, "web-01\n");
/// assert_eq!(session.executed_commands(), ["hostname"]);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MockSession {
    stubs: Vec<(CommandMatcher, CommandStub)>,
    executed_commands: Vec<String>,
    written_data: Vec<(String, Vec<u8>)>,
    closed: bool,
    hooks: EventHub,
}

impl MockSession {
    /// Create an empty mock session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stub for commands matching `matcher`.
    ///
    /// The configurator runs against a mutable [`CommandStub`]. Stubs are
    /// tried in registration order and the first match wins regardless of
    /// specificity; re-registering an equal matcher replaces its stub in
    /// place without changing its position.
    pub fn register_command<M, F>(&mut self, matcher: M, configure: F)
    where
        M: Into<CommandMatcher>,
        F: FnOnce(&mut CommandStub),
    {
        let matcher = matcher.into();
        let mut stub = CommandStub::new();
        configure(&mut stub);

        if let Some(slot) = self
            .stubs
            .iter_mut()
            .find(|(existing, _)| existing.same_key(&matcher))
        {
            slot.1 = stub;
        } else {
            self.stubs.push((matcher, stub));
        }
    }

    /// Execute a command against the registered stubs.
    ///
    /// Composes the command exactly as the live path does (same chaining
    /// and sudo prefixing), records it, and synthesizes a [`Response`]
    /// from the matched stub's outcome producers.
    ///
    /// # Errors
    ///
    /// [`SshRelayError::UndefinedCommand`] when no stub matches: a
    /// test-setup gap, distinct from any real execution failure.
    pub async fn execute(
        &mut self,
        command: impl Into<Command>,
        options: &ExecuteOptions,
    ) -> Result<Response> {
        let composed = command.into().compose(options.wants_sudo());
        self.emit(
            Phase::Before,
            Action::Execute,
            &EventArgs::Command(&composed),
        );
        let (index, groups) = self.match_command(&composed)?;
        let response = self.synthesize(index, &groups, &composed);
        self.emit(
            Phase::After,
            Action::Execute,
            &EventArgs::Response(&response),
        );
        Ok(response)
    }

    /// Execute with a deadline, without real time passing.
    ///
    /// If the matched stub declares (via
    /// [`runs_for`](CommandStub::runs_for)) a running time longer than the
    /// allowed timeout, this synthesizes the same sentinel [`Response`] as
    /// the live path; otherwise the stub resolves normally.
    pub async fn execute_with_timeout(
        &mut self,
        command: impl Into<Command>,
        options: &ExecuteOptions,
    ) -> Result<Response> {
        let composed = command.into().compose(options.wants_sudo());
        let allowed = options.effective_timeout();
        self.emit(
            Phase::Before,
            Action::Execute,
            &EventArgs::Command(&composed),
        );
        let (index, groups) = self.match_command(&composed)?;

        if let Some(runtime) = self.stubs[index].1.declared_runtime() {
            if runtime > allowed {
                tracing::warn!(
                    command = %composed,
                    allowed_secs = allowed.as_secs(),
                    "stubbed command exceeds the allowed time"
                );
                // Mirrors the live path: the timeout sentinel returns
                // without an after-execute event.
                return Ok(Response::timeout(composed, allowed));
            }
        }

        let response = self.synthesize(index, &groups, &composed);
        self.emit(
            Phase::After,
            Action::Execute,
            &EventArgs::Response(&response),
        );
        Ok(response)
    }

    /// Execute and check the exit code, returning `None` on mismatch.
    ///
    /// Identical contract to the live variant.
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
    /// Identical contract to the live variant:
    /// [`SshRelayError::CommandFailed`] carries the combined output.
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

    /// Record an upload and return the byte count, matching the live
    /// success-path convention.
    ///
    /// Escalation is not simulated (there is no filesystem to stage
    /// against); assert on [`written_data`](MockSession::written_data)
    /// instead.
    pub async fn write_data(
        &mut self,
        path: &str,
        data: &[u8],
        _options: &ExecuteOptions,
    ) -> Result<usize> {
        self.emit(
            Phase::Before,
            Action::WriteData,
            &EventArgs::Write {
                path,
                len: data.len(),
            },
        );
        self.written_data.push((path.to_string(), data.to_vec()));
        self.emit(
            Phase::After,
            Action::WriteData,
            &EventArgs::Write {
                path,
                len: data.len(),
            },
        );
        Ok(data.len())
    }

    /// Mark the session closed.
    pub async fn close(&mut self) {
        self.emit(Phase::Before, Action::Close, &EventArgs::None);
        self.closed = true;
        self.emit(Phase::After, Action::Close, &EventArgs::None);
    }

    /// Whether [`close`](MockSession::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Every composed command executed so far, in order, one entry per
    /// execution-mode call.
    pub fn executed_commands(&self) -> &[String] {
        &self.executed_commands
    }

    /// Every `(path, bytes)` pair passed to
    /// [`write_data`](MockSession::write_data), in order.
    pub fn written_data(&self) -> &[(String, Vec<u8>)] {
        &self.written_data
    }

    /// Instance-scoped lifecycle callbacks, as on the live session.
    pub fn hooks_mut(&mut self) -> &mut EventHub {
        &mut self.hooks
    }

    /// Find the first stub matching the composed command, in registration
    /// order, and record the command in the execution log.
    fn match_command(&mut self, composed: &str) -> Result<(usize, MatchGroups)> {
        for (index, (matcher, _)) in self.stubs.iter().enumerate() {
            if let Some(groups) = matcher.matches(composed) {
                self.executed_commands.push(composed.to_string());
                return Ok((index, groups));
            }
        }
        Err(SshRelayError::UndefinedCommand(composed.to_string()))
    }

    fn synthesize(&self, index: usize, groups: &MatchGroups, composed: &str) -> Response {
        let stub = &self.stubs[index].1;
        let mut response = Response::new(composed);
        response.stdout = stub.resolve_stdout(groups);
        response.stderr = stub.resolve_stderr(groups);
        response.exit_code = Some(stub.resolve_exit_code(groups));
        response
    }

    fn emit(&self, phase: Phase, action: Action, args: &EventArgs<'_>) {
        self.hooks.emit(phase, action, args);
        events::emit_shared(phase, action, args);
    }
}
