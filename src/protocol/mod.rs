//! # Session Protocol Layer
//!
//! The registry/session pairing and the contracts their collaborators
//! implement.
//!
//! ## Components
//! - **Session**: per-connection state and the read/write pipelines
//! - **Registry**: connection-keyed map of live sessions
//! - **Packet**: inbound/outbound packet contracts and the id lookup
//! - **Events**: fire-and-forget lifecycle notifications

pub mod events;
pub mod packet;
pub mod registry;
pub mod session;
