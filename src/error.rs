//! # Error Types
//!
//! Error handling for the session and framing core.
//!
//! This module defines all error variants that can occur while framing,
//! transforming, or dispatching packets, plus registry bookkeeping failures.
//!
//! ## Error Categories
//! - **Transport errors**: I/O failures on the underlying stream
//! - **Framing errors**: malformed or oversized length prefixes
//! - **Transform errors**: codec and cipher failures
//! - **Dispatch errors**: unknown packet ids, handler failures
//! - **Registry errors**: duplicate registrations, bad configuration
//!
//! Pipeline errors never cross the session boundary as `Err`: the session
//! contains them, logs them with [`SessionError::stage`], and reports only a
//! status (read) or a boolean (write) to its caller. Registry lookups for
//! absent entries return `None` rather than an error.

use std::io;
use thiserror::Error;

use crate::protocol::session::ConnectionId;

/// Primary error type for all session and registry operations.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("encryption failed")]
    EncryptionFailure,

    #[error("decryption failed")]
    DecryptionFailure,

    #[error("unknown packet id: {0}")]
    UnknownPacketId(u32),

    #[error("frame body of {0} bytes exceeds maximum")]
    OversizedFrame(usize),

    #[error("frame body too short to carry a packet id")]
    InvalidHeader,

    #[error("connection {0} is already registered")]
    DuplicateRegistration(ConnectionId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("handler error: {0}")]
    Handler(String),
}

impl SessionError {
    /// Name of the pipeline stage this error belongs to, for diagnostics.
    ///
    /// Contained failures are logged per-session tagged with this stage so
    /// the dispatch loop's operator can see exactly where a frame died.
    pub fn stage(&self) -> &'static str {
        match self {
            SessionError::Transport(_) => "transport",
            SessionError::Encode(_) => "encode",
            SessionError::Decode(_) => "decode",
            SessionError::EncryptionFailure => "encrypt",
            SessionError::DecryptionFailure => "decrypt",
            SessionError::UnknownPacketId(_) => "lookup",
            SessionError::OversizedFrame(_) | SessionError::InvalidHeader => "frame",
            SessionError::DuplicateRegistration(_) => "registry",
            SessionError::Config(_) => "config",
            SessionError::Handler(_) => "dispatch",
        }
    }
}

/// Type alias for Results using SessionError
pub type Result<T> = std::result::Result<T, SessionError>;
