//! # Packet Contracts
//!
//! Direction-polymorphic packet traits and the id-to-type lookup.
//!
//! Inbound packets interpret a decoded payload value against a session;
//! outbound packets produce the value a session should send. Identity on the
//! wire is a stable [`PacketId`] resolved through a [`PacketLookup`], which
//! fails explicitly for unrecognized ids rather than guessing.
//!
//! [`PacketTable`] is the stock lookup: an id-to-constructor map producing a
//! fresh inbound instance per frame, substitutable in tests.

use async_trait::async_trait;
use std::collections::HashMap;

pub use crate::core::frame::PacketId;
use crate::error::{Result, SessionError};
use crate::protocol::session::ClientSession;

/// Contract for packets arriving from a peer.
///
/// `T` is the transport stream type, `V` the decoded payload value type.
/// The handler receives the originating session mutably and may reply
/// through its write pipeline.
#[async_trait]
pub trait InboundPacket<T, V>: Send + Sync {
    async fn handle(&self, session: &mut ClientSession<T, V>, value: V) -> Result<()>;
}

impl<T, V> std::fmt::Debug for dyn InboundPacket<T, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn InboundPacket")
    }
}

/// Contract for packets sent to a peer.
pub trait OutboundPacket<T, V>: Send + Sync {
    /// Wire identity prepended to the frame body.
    fn id(&self) -> PacketId;

    /// Produce the serializable payload value for this session.
    fn payload(&self, session: &ClientSession<T, V>) -> Result<V>;
}

/// Resolves a wire packet id to a fresh inbound packet instance.
pub trait PacketLookup<T, V>: Send + Sync {
    /// Fails with [`SessionError::UnknownPacketId`] for unrecognized ids.
    fn instance_for(&self, id: PacketId) -> Result<Box<dyn InboundPacket<T, V>>>;
}

type PacketCtor<T, V> = Box<dyn Fn() -> Box<dyn InboundPacket<T, V>> + Send + Sync>;

/// Id-to-constructor table producing fresh inbound packets per frame.
pub struct PacketTable<T, V> {
    ctors: HashMap<PacketId, PacketCtor<T, V>>,
}

impl<T, V> PacketTable<T, V> {
    pub fn new() -> Self {
        Self {
            ctors: HashMap::new(),
        }
    }

    /// Register a constructor for `id`, replacing any previous binding.
    pub fn register<P, F>(&mut self, id: impl Into<PacketId>, ctor: F)
    where
        P: InboundPacket<T, V> + 'static,
        F: Fn() -> P + Send + Sync + 'static,
    {
        self.ctors
            .insert(id.into(), Box::new(move || Box::new(ctor())));
    }

    pub fn contains(&self, id: PacketId) -> bool {
        self.ctors.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.ctors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ctors.is_empty()
    }
}

impl<T, V> Default for PacketTable<T, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, V> PacketLookup<T, V> for PacketTable<T, V> {
    fn instance_for(&self, id: PacketId) -> Result<Box<dyn InboundPacket<T, V>>> {
        self.ctors
            .get(&id)
            .map(|ctor| ctor())
            .ok_or(SessionError::UnknownPacketId(id.0))
    }
}
