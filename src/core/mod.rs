//! # Core Wire Components
//!
//! Low-level framing and payload serialization.
//!
//! ## Components
//! - **Frame**: length-prefixed binary format with partial-read buffering
//! - **Codec**: tokio codec exposing the same framing to `Framed` streams
//! - **Serialization**: the value/byte codec seam and its stock encodings
//!
//! ## Wire Format
//! ```text
//! [Length(4, BE)] [PacketId(4, BE)] [Ciphertext(N)]
//! ```
//!
//! ## Security
//! - Declared lengths validated before allocation
//! - Maximum frame body: 16MB (prevents memory exhaustion)

pub mod codec;
pub mod frame;
pub mod serialization;
