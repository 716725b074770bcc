//! # Wire Framing
//!
//! Binary frame format and the accumulating reader that tolerates partial
//! delivery from non-blocking transports.
//!
//! ## Wire Format
//! ```text
//! Frame := LENGTH(4, big-endian) || BODY(LENGTH bytes)
//! BODY  := PACKET_ID(4, big-endian) || CIPHERTEXT
//! ```
//! `LENGTH` counts body bytes and must be at least [`PACKET_ID_LEN`]; a frame
//! is complete only once all declared body bytes are buffered. A short read
//! leaves the partial prefix or body in the buffer for the next invocation,
//! so the stream never desynchronizes.
//!
//! ## Security
//! - Declared lengths are validated against the configured maximum before any
//!   allocation happens.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;

use crate::error::{Result, SessionError};

/// Size of the big-endian length prefix.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Size of the big-endian packet id at the start of every frame body.
pub const PACKET_ID_LEN: usize = 4;

/// Stable wire identity of a packet type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PacketId(pub u32);

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PacketId {
    fn from(raw: u32) -> Self {
        PacketId(raw)
    }
}

/// One parsed unit of wire transfer: packet id plus still-encrypted payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Resolves the payload's logical type through the packet lookup.
    pub packet_id: PacketId,
    /// Ciphertext; meaningful only to cipher + codec + packet type.
    pub payload: Bytes,
}

/// Encode a complete frame: length prefix, packet id, ciphertext.
///
/// This is the exact inverse of what [`FrameReader::try_next`] parses, so
/// bytes produced here round-trip through a reading peer.
pub fn encode_frame(id: PacketId, ciphertext: &[u8], max_frame_len: usize) -> Result<Bytes> {
    let body_len = PACKET_ID_LEN + ciphertext.len();
    if body_len > max_frame_len {
        return Err(SessionError::OversizedFrame(body_len));
    }
    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_LEN + body_len);
    buf.put_u32(body_len as u32);
    buf.put_u32(id.0);
    buf.put_slice(ciphertext);
    Ok(buf.freeze())
}

/// Try to parse one frame out of `buf`, consuming it only when complete.
///
/// Shared by [`FrameReader`] and the tokio-util [`crate::core::codec::FrameCodec`].
pub(crate) fn parse_frame(buf: &mut BytesMut, max_frame_len: usize) -> Result<Option<Frame>> {
    if buf.len() < LENGTH_PREFIX_LEN {
        return Ok(None);
    }
    let declared = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if declared > max_frame_len {
        return Err(SessionError::OversizedFrame(declared));
    }
    if declared < PACKET_ID_LEN {
        return Err(SessionError::InvalidHeader);
    }
    if buf.len() < LENGTH_PREFIX_LEN + declared {
        // Partial body stays buffered until the transport delivers the rest.
        return Ok(None);
    }
    buf.advance(LENGTH_PREFIX_LEN);
    let mut body = buf.split_to(declared);
    let packet_id = PacketId(body.get_u32());
    Ok(Some(Frame {
        packet_id,
        payload: body.freeze(),
    }))
}

/// Accumulating receive buffer that yields frames only when complete.
///
/// The session appends whatever the transport delivered, then drains complete
/// frames with [`FrameReader::try_next`]. Sub-prefix reads (even a single
/// byte of the length field) are retained across invocations.
#[derive(Debug)]
pub struct FrameReader {
    buf: BytesMut,
    max_frame_len: usize,
}

impl FrameReader {
    pub fn new(capacity: usize, max_frame_len: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            max_frame_len,
        }
    }

    /// Direct access for `read_buf`-style appends from the transport.
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    /// Append raw bytes, e.g. from a test harness feeding chunks.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Bytes buffered but not yet consumed as a complete frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Extract the next complete frame, or `None` if more bytes are needed.
    ///
    /// Errors indicate a framing violation (oversized or undersized declared
    /// length); the stream offset cannot be trusted afterwards.
    pub fn try_next(&mut self) -> Result<Option<Frame>> {
        parse_frame(&mut self.buf, self.max_frame_len)
    }
}
