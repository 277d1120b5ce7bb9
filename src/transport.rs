//! Transport abstraction layer.
//!
//! The session never speaks a wire protocol itself; it drives an injected
//! transport that already handles handshake, authentication, and channel
//! multiplexing. Implementations wrap a real secure-shell client; the test
//! suites use scripted in-memory transports.

use std::io;

/// Something observed on a command channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A chunk of standard output.
    Stdout(Vec<u8>),
    /// A chunk of extended (error) output.
    Stderr(Vec<u8>),
    /// Exit code reported when the remote process exited normally.
    ExitStatus(i32),
    /// Signal number reported when the remote process was killed.
    ExitSignal(i32),
}

/// A logical duplex stream carrying one remote command's input, output,
/// and status.
#[allow(async_fn_in_trait)]
pub trait CommandChannel: Send {
    /// Pull the next event from the channel.
    ///
    /// Returns `Ok(None)` once the channel has completed; no further
    /// events follow. This is the session's suspension point while a
    /// command runs.
    async fn next_event(&mut self) -> io::Result<Option<ChannelEvent>>;

    /// Write bytes into the remote process's standard input.
    async fn send_data(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Tear the channel down.
    ///
    /// Called best-effort on failure exit paths; implementations should
    /// also release resources on drop, since an abandoned timeout race
    /// drops the channel without closing it.
    async fn close(&mut self) -> io::Result<()>;
}

/// A remote file opened for writing.
#[allow(async_fn_in_trait)]
pub trait FileSink: Send {
    /// Write all bytes to the remote file.
    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Flush and close the remote file.
    async fn close(&mut self) -> io::Result<()>;
}

/// A connected secure-shell transport.
#[allow(async_fn_in_trait)]
pub trait Transport: Send {
    /// Endpoint and credentials needed to establish a connection.
    type Config: Send;
    /// Channel type produced for command execution.
    type Channel: CommandChannel;
    /// Handle type produced for remote file writes.
    type File: FileSink;

    /// Establish a connection.
    async fn connect(config: Self::Config) -> io::Result<Self>
    where
        Self: Sized;

    /// Open a channel and request execution of the composed command.
    ///
    /// An error here means the command could not begin executing; the
    /// session treats that as fatal for the attempt.
    async fn open_command_channel(&mut self, command: &str) -> io::Result<Self::Channel>;

    /// Open a remote path for writing.
    async fn open_file_for_write(&mut self, path: &str) -> io::Result<Self::File>;

    /// Close the connection.
    async fn close(&mut self) -> io::Result<()>;
}
