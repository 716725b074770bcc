//! # packet-session
//!
//! Server-side session and framing core for a length-prefixed binary packet
//! protocol over stream sockets.
//!
//! The crate pairs a [`SessionRegistry`] (which sessions exist, keyed by
//! connection) with per-connection [`ClientSession`]s implementing the wire
//! framing: frame → id → decrypt → decode → dispatch on read, and
//! payload → encode → encrypt → frame → send on write. The cipher, value
//! codec, packet types, event delivery, and the readiness loop are all
//! collaborators behind narrow traits.
//!
//! ## Wire Format
//! ```text
//! Frame := LENGTH(4, BE) || PACKET_ID(4, BE) || CIPHERTEXT
//! CIPHERTEXT := encrypt(encode(payload_value))
//! ```
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use packet_session::config::SessionConfig;
//! use packet_session::core::serialization::RawCodec;
//! use packet_session::protocol::events::NullSink;
//! use packet_session::protocol::packet::PacketTable;
//! use packet_session::protocol::registry::SessionRegistry;
//! use packet_session::protocol::session::{ConnectionId, ProtocolStack};
//! use packet_session::utils::crypto::PlainCipher;
//! use tokio::net::TcpStream;
//!
//! # async fn accept_loop(stream: TcpStream) -> packet_session::error::Result<()> {
//! let stack = Arc::new(ProtocolStack::new(
//!     Box::new(RawCodec),
//!     Box::new(PlainCipher),
//!     Box::new(PacketTable::new()),
//! ));
//! let registry = SessionRegistry::new(stack, SessionConfig::default(), Box::new(NullSink));
//!
//! // The dispatch loop registers a connection on first sight...
//! let session = registry.register(ConnectionId(1), stream)?;
//! // ...and drives its read pipeline whenever the stream is readable.
//! let _status = session.lock().await.read().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod utils;

pub use crate::config::SessionConfig;
pub use crate::core::codec::FrameCodec;
pub use crate::core::frame::{Frame, FrameReader, PacketId};
pub use crate::core::serialization::{BincodeCodec, JsonCodec, RawCodec, WireCodec};
pub use crate::error::{Result, SessionError};
pub use crate::protocol::events::{ChannelSink, EventSink, NullSink, SessionEvent};
pub use crate::protocol::packet::{InboundPacket, OutboundPacket, PacketLookup, PacketTable};
pub use crate::protocol::registry::{SessionFactory, SessionRegistry};
pub use crate::protocol::session::{
    ClientSession, ConnectionId, ProtocolStack, ReadStatus, SessionId, SharedSession,
};
pub use crate::utils::crypto::{Cipher, PlainCipher, XChaChaCipher};
