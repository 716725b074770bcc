//! Tokio codec over the wire framing, for callers that prefer to drive a
//! `Framed` stream directly instead of the session read loop. Both
//! directions delegate to the framing helpers in
//! [`frame`](crate::core::frame), so this codec and the session pipeline
//! produce and accept exactly the same byte streams.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::config::MAX_FRAME_LEN;
use crate::core::frame::{self, Frame};
use crate::error::{Result, SessionError};

/// Length-prefixed frame codec with a configurable body ceiling.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_frame_len: usize,
}

impl FrameCodec {
    pub fn new(max_frame_len: usize) -> Self {
        Self { max_frame_len }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(MAX_FRAME_LEN)
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = SessionError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        frame::parse_frame(src, self.max_frame_len)
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = SessionError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        let bytes = frame::encode_frame(item.packet_id, &item.payload, self.max_frame_len)?;
        dst.extend_from_slice(&bytes);
        Ok(())
    }
}
