//! # ssh-relay
//!
//! Remote command execution over pluggable secure-shell transports.
//!
//! This crate runs shell commands on a remote host through an injected
//! [`Transport`] and captures their output as structured [`Response`]s.
//! The transport handles handshake, authentication, and the wire
//! protocol; this crate handles everything above it: command composition,
//! privilege escalation, streaming capture, execution modes, and
//! lifecycle events.
//!
//! ## Features
//!
//! - **Command chaining**: lists of commands collapse to one `&&`-joined
//!   line, so a failure short-circuits the rest
//! - **Privilege escalation**: per-command `sudo --stdin` prefixing with
//!   programmatic password injection when the remote prompts
//! - **Execution modes**: raw, deadline-bounded, success-checked, and
//!   error-raising, all layered on the same primitive
//! - **Deterministic testing**: [`MockSession`] reproduces the whole
//!   contract in memory against registered command stubs
//!
//! ## Quick Start
//!
//! ```
//! use ssh_relay::{ExecuteOptions, MockSession};
//!
//! # tokio_test::block_on(async {
//! let mut session = MockSession::new();
//! session.register_command("uptime", |c| {
//!     c.stdout("15:02:17 up 41 days\n");
//! });
//!
//! let response = session
//!     .execute("uptime", &ExecuteOptions::new())
//!     .await
//!     .unwrap();
//! assert!(response.success());
//! assert_eq!(response.stdout, "15:02:17 up 41 days\n");
//! # });
//! ```
//!
//! Live sessions work the same way, against a real transport:
//!
//! ```ignore
//! let mut session = Session::connect(config).await?.with_sudo_password("s3cret");
//! let response = session
//!     .execute(["apt update", "apt upgrade -y"], &ExecuteOptions::new().sudo())
//!     .await?;
//! ```

pub mod command;
pub mod error;
pub mod events;
pub mod logging;
pub mod mock;
pub mod response;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use command::{Command, ExecuteOptions, Sudo, DEFAULT_SUCCESS_CODE, DEFAULT_TIMEOUT, SUDO_PREFIX};
pub use error::{Result, SshRelayError};
pub use events::{Action, EventArgs, EventHub, Phase};
pub use mock::{CommandMatcher, CommandStub, MatchGroups, MockSession};
pub use response::{Response, TIMEOUT_EXIT_CODE};
pub use session::Session;
pub use transport::{ChannelEvent, CommandChannel, FileSink, Transport};
