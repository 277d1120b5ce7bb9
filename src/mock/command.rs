//! Stub registration: matchers, captured groups, and outcome producers.

use std::fmt;
use std::time::Duration;

use regex::Regex;

/// Identifies which registered stub an incoming composed command uses.
#[derive(Debug, Clone)]
pub enum CommandMatcher {
    /// Matches when the composed command equals this string exactly.
    Exact(String),
    /// Matches when this pattern is found in the composed command
    /// (unanchored search), capturing groups for derived outcomes.
    Pattern(Regex),
}

impl CommandMatcher {
    /// Match against a composed command, yielding captured groups on
    /// success.
    pub(crate) fn matches(&self, command: &str) -> Option<MatchGroups> {
        match self {
            CommandMatcher::Exact(exact) => {
                (exact == command).then(MatchGroups::empty)
            }
            CommandMatcher::Pattern(pattern) => pattern
                .captures(command)
                .map(|captures| MatchGroups::from_captures(&captures)),
        }
    }

    /// Whether two matchers identify the same registration slot.
    ///
    /// Patterns compare by source text, so re-registering the same
    /// pattern replaces the stub instead of shadowing it.
    pub(crate) fn same_key(&self, other: &CommandMatcher) -> bool {
        match (self, other) {
            (CommandMatcher::Exact(a), CommandMatcher::Exact(b)) => a == b,
            (CommandMatcher::Pattern(a), CommandMatcher::Pattern(b)) => {
                a.as_str() == b.as_str()
            }
            _ => false,
        }
    }
}

impl From<&str> for CommandMatcher {
    fn from(exact: &str) -> Self {
        CommandMatcher::Exact(exact.to_string())
    }
}

impl From<String> for CommandMatcher {
    fn from(exact: String) -> Self {
        CommandMatcher::Exact(exact)
    }
}

impl From<Regex> for CommandMatcher {
    fn from(pattern: Regex) -> Self {
        CommandMatcher::Pattern(pattern)
    }
}

/// Groups captured by a pattern matcher.
///
/// Index 0 is the full match; index 1 the first capture group, as in the
/// pattern. Exact matchers yield no groups.
#[derive(Debug, Clone, Default)]
pub struct MatchGroups(Vec<Option<String>>);

impl MatchGroups {
    pub(crate) fn empty() -> Self {
        Self(Vec::new())
    }

    pub(crate) fn from_captures(captures: &regex::Captures<'_>) -> Self {
        Self(
            captures
                .iter()
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect(),
        )
    }

    /// The group at `index`, if the pattern captured one there.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(|group| group.as_deref())
    }

    /// Number of groups, counting the full match.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no groups were captured (exact matchers).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A stub field: either a fixed value, or a function of the captured
/// groups evaluated fresh on every execution.
pub enum Outcome<T> {
    /// Passed through as-is.
    Literal(T),
    /// Re-evaluated per call with the matcher's captured groups.
    Derived(Box<dyn Fn(&MatchGroups) -> T + Send + Sync>),
}

impl<T: Clone> Outcome<T> {
    pub(crate) fn resolve(&self, groups: &MatchGroups) -> T {
        match self {
            Outcome::Literal(value) => value.clone(),
            Outcome::Derived(produce) => produce(groups),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Outcome::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// Canned outcome for a matched command.
///
/// Configured inside [`register_command`](crate::MockSession::register_command):
/// unset fields default to empty output and exit code 0.
#[derive(Debug, Default)]
pub struct CommandStub {
    stdout: Option<Outcome<String>>,
    stderr: Option<Outcome<String>>,
    exit_code: Option<Outcome<i32>>,
    runs_for: Option<Duration>,
}

impl CommandStub {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fixed stdout for every match.
    pub fn stdout(&mut self, value: impl Into<String>) -> &mut Self {
        self.stdout = Some(Outcome::Literal(value.into()));
        self
    }

    /// Stdout derived from the captured groups, per call.
    pub fn stdout_with<F>(&mut self, produce: F) -> &mut Self
    where
        F: Fn(&MatchGroups) -> String + Send + Sync + 'static,
    {
        self.stdout = Some(Outcome::Derived(Box::new(produce)));
        self
    }

    /// Fixed stderr for every match.
    pub fn stderr(&mut self, value: impl Into<String>) -> &mut Self {
        self.stderr = Some(Outcome::Literal(value.into()));
        self
    }

    /// Stderr derived from the captured groups, per call.
    pub fn stderr_with<F>(&mut self, produce: F) -> &mut Self
    where
        F: Fn(&MatchGroups) -> String + Send + Sync + 'static,
    {
        self.stderr = Some(Outcome::Derived(Box::new(produce)));
        self
    }

    /// Fixed exit code for every match.
    pub fn exit_code(&mut self, code: i32) -> &mut Self {
        self.exit_code = Some(Outcome::Literal(code));
        self
    }

    /// Exit code derived from the captured groups, per call.
    pub fn exit_code_with<F>(&mut self, produce: F) -> &mut Self
    where
        F: Fn(&MatchGroups) -> i32 + Send + Sync + 'static,
    {
        self.exit_code = Some(Outcome::Derived(Box::new(produce)));
        self
    }

    /// Declare how long this command takes to run.
    ///
    /// `execute_with_timeout` compares this against the allowed timeout
    /// and synthesizes the timeout sentinel when it is longer, mirroring
    /// live timeout behavior without real time passing.
    pub fn runs_for(&mut self, duration: Duration) -> &mut Self {
        self.runs_for = Some(duration);
        self
    }

    pub(crate) fn resolve_stdout(&self, groups: &MatchGroups) -> String {
        self.stdout
            .as_ref()
            .map(|outcome| outcome.resolve(groups))
            .unwrap_or_default()
    }

    pub(crate) fn resolve_stderr(&self, groups: &MatchGroups) -> String {
        self.stderr
            .as_ref()
            .map(|outcome| outcome.resolve(groups))
            .unwrap_or_default()
    }

    pub(crate) fn resolve_exit_code(&self, groups: &MatchGroups) -> i32 {
        self.exit_code
            .as_ref()
            .map(|outcome| outcome.resolve(groups))
            .unwrap_or(0)
    }

    pub(crate) fn declared_runtime(&self) -> Option<Duration> {
        self.runs_for
    }
}
