//! # Client Session
//!
//! Per-connection state and the two packet pipelines.
//!
//! A [`ClientSession`] owns one transport stream. The external dispatch loop
//! calls [`ClientSession::read`] when the stream is readable: one transport
//! read is appended to the session's receive buffer, then every complete
//! frame is drained in arrival order through decrypt → decode → lookup →
//! handle. Short reads are normal: a partial length prefix or body simply
//! stays buffered for the next invocation.
//!
//! [`ClientSession::write`] runs the mirror pipeline (payload → encode →
//! encrypt → frame → send) with the same length/id header the read side
//! parses, so peers of this crate round-trip cleanly.
//!
//! Failures in either pipeline are contained here: logged with the session's
//! logical id and the failing stage, then reported as a [`ReadStatus`] or a
//! boolean, never as an `Err` to the dispatch loop.

use std::fmt;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, trace};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::core::frame::{self, Frame, FrameReader};
use crate::core::serialization::WireCodec;
use crate::error::{Result, SessionError};
use crate::protocol::packet::{OutboundPacket, PacketLookup};
use crate::utils::crypto::Cipher;

/// Process-unique logical identity of a session.
///
/// Assigned at creation, never reused, never derived from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque token the dispatch loop uses to key a live connection.
///
/// Typically a poll-registration token or file-descriptor number; the core
/// only compares and hashes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

impl From<u64> for ConnectionId {
    fn from(raw: u64) -> Self {
        ConnectionId(raw)
    }
}

/// The collaborator stack a session consults on every frame.
///
/// Shared between all sessions of a registry; the session holds no reference
/// back to the registry itself.
pub struct ProtocolStack<T, V> {
    pub codec: Box<dyn WireCodec<V>>,
    pub cipher: Box<dyn Cipher>,
    pub packets: Box<dyn PacketLookup<T, V>>,
}

impl<T, V> ProtocolStack<T, V> {
    pub fn new(
        codec: Box<dyn WireCodec<V>>,
        cipher: Box<dyn Cipher>,
        packets: Box<dyn PacketLookup<T, V>>,
    ) -> Self {
        Self {
            codec,
            cipher,
            packets,
        }
    }
}

/// A registry-held session, locked by whichever task currently drives it.
pub type SharedSession<T, V> = Arc<tokio::sync::Mutex<ClientSession<T, V>>>;

/// Outcome of one read invocation.
///
/// Pipeline failures never surface as `Err`; the dispatch loop observes them
/// here (and in the logs) and decides what to do with the connection.
#[derive(Debug)]
pub enum ReadStatus {
    /// No complete frame yet; partial data retained for the next call.
    Pending,
    /// Complete frames were drained; `failed` counts frames abandoned after
    /// a contained decrypt/decode/lookup/handler error.
    Dispatched { handled: usize, failed: usize },
    /// The transport signalled end-of-stream.
    Closed,
    /// Transport or framing failure; the stream can no longer be trusted.
    /// Frames dispatched earlier in the same invocation are still counted.
    Failed {
        error: SessionError,
        handled: usize,
        failed: usize,
    },
}

/// Server-side state for one connected peer.
pub struct ClientSession<T, V> {
    id: SessionId,
    conn: ConnectionId,
    transport: T,
    reader: FrameReader,
    stack: Arc<ProtocolStack<T, V>>,
    read_chunk: usize,
    max_frame_len: usize,
}

impl<T, V> fmt::Debug for ClientSession<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSession")
            .field("id", &self.id)
            .field("conn", &self.conn)
            .finish_non_exhaustive()
    }
}

impl<T, V> ClientSession<T, V> {
    pub fn new(
        conn: ConnectionId,
        transport: T,
        stack: Arc<ProtocolStack<T, V>>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            id: SessionId::new(),
            conn,
            transport,
            reader: FrameReader::new(config.read_buffer_capacity, config.max_frame_len),
            stack,
            read_chunk: config.read_chunk,
            max_frame_len: config.max_frame_len,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.conn
    }

    /// Bytes buffered towards an incomplete frame.
    pub fn buffered(&self) -> usize {
        self.reader.pending()
    }

    /// Give up the transport stream, e.g. for teardown by a collaborator.
    pub fn into_transport(self) -> T {
        self.transport
    }
}

impl<T, V> ClientSession<T, V>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
    V: Send,
{
    /// Run one invocation of the read pipeline.
    ///
    /// Performs a single transport read, then drains every frame that is now
    /// complete, dispatching each to its inbound packet in arrival order.
    /// Per-frame failures are logged and counted; the frame's declared bytes
    /// were already consumed exactly, so later frames are unaffected.
    pub async fn read(&mut self) -> ReadStatus {
        // read_buf reports 0 on a full buffer, so reserve before reading.
        self.reader.buffer_mut().reserve(self.read_chunk);
        let read_result = {
            let Self {
                transport, reader, ..
            } = self;
            transport.read_buf(reader.buffer_mut()).await
        };
        let n = match read_result {
            Ok(n) => n,
            Err(e) => {
                let err = SessionError::Transport(e);
                error!(session = %self.id, stage = err.stage(), error = %err, "read failed");
                return ReadStatus::Failed {
                    error: err,
                    handled: 0,
                    failed: 0,
                };
            }
        };

        if n == 0 {
            if self.reader.pending() > 0 {
                debug!(
                    session = %self.id,
                    buffered = self.reader.pending(),
                    "transport closed with a partial frame buffered"
                );
            }
            return ReadStatus::Closed;
        }
        trace!(session = %self.id, bytes = n, buffered = self.reader.pending(), "transport read");

        let mut handled = 0usize;
        let mut failed = 0usize;
        loop {
            match self.reader.try_next() {
                Ok(Some(frame)) => {
                    let packet_id = frame.packet_id;
                    match self.process_frame(frame).await {
                        Ok(()) => handled += 1,
                        Err(err) => {
                            error!(
                                session = %self.id,
                                packet = %packet_id,
                                stage = err.stage(),
                                error = %err,
                                "inbound frame abandoned"
                            );
                            failed += 1;
                        }
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    // The declared length itself is invalid; the stream
                    // offset can no longer be trusted.
                    error!(
                        session = %self.id,
                        stage = err.stage(),
                        error = %err,
                        handled,
                        failed,
                        "frame desynchronized"
                    );
                    return ReadStatus::Failed {
                        error: err,
                        handled,
                        failed,
                    };
                }
            }
        }

        if handled == 0 && failed == 0 {
            ReadStatus::Pending
        } else {
            ReadStatus::Dispatched { handled, failed }
        }
    }

    /// Decrypt, decode, resolve, and dispatch one complete frame.
    async fn process_frame(&mut self, frame: Frame) -> Result<()> {
        let stack = Arc::clone(&self.stack);
        let plaintext = stack.cipher.decrypt(&frame.payload)?;
        let value = stack.codec.decode(&plaintext)?;
        let packet = stack.packets.instance_for(frame.packet_id)?;
        packet.handle(self, value).await
    }

    /// Run the write pipeline for one outbound packet.
    ///
    /// Returns `false` on any failure; the error is logged with its stage
    /// and does not propagate.
    pub async fn write<P>(&mut self, packet: &P) -> bool
    where
        P: OutboundPacket<T, V> + ?Sized,
    {
        match self.write_frame(packet).await {
            Ok(()) => true,
            Err(err) => {
                error!(
                    session = %self.id,
                    packet = %packet.id(),
                    stage = err.stage(),
                    error = %err,
                    "write failed"
                );
                false
            }
        }
    }

    async fn write_frame<P>(&mut self, packet: &P) -> Result<()>
    where
        P: OutboundPacket<T, V> + ?Sized,
    {
        let stack = Arc::clone(&self.stack);
        let value = packet.payload(self)?;
        let encoded = stack.codec.encode(&value)?;
        let ciphertext = stack.cipher.encrypt(&encoded)?;
        // Same length/id header the read pipeline parses.
        let bytes = frame::encode_frame(packet.id(), &ciphertext, self.max_frame_len)?;
        self.transport.write_all(&bytes).await?;
        self.transport.flush().await?;
        trace!(session = %self.id, packet = %packet.id(), bytes = bytes.len(), "frame sent");
        Ok(())
    }
}
