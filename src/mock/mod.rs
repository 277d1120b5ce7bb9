//! In-memory session double.
//!
//! [`MockSession`] exposes the same operation surface as the live
//! [`Session`](crate::Session) without a network: commands are registered
//! against a matcher (exact string or pattern) with a canned outcome, and
//! execution looks up the first registered match and synthesizes a
//! [`Response`](crate::Response). Issuing a command no stub matches is a
//! distinct error, so missing test setup is never mistaken for a real
//! execution failure.

mod command;
mod session;

pub use command::{CommandMatcher, CommandStub, MatchGroups, Outcome};
pub use session::MockSession;
