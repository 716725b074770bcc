//! # Session Events
//!
//! Fire-and-forget notifications the registry publishes about session
//! lifecycle. The core never consumes a return value from the sink, so slow
//! or absent subscribers cannot stall registration.
//!
//! [`ChannelSink`] feeds a bounded tokio channel (events are dropped with a
//! warning when the subscriber lags); [`NullSink`] discards everything.

use std::fmt;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::protocol::session::{ConnectionId, SessionId, SharedSession};

/// Lifecycle notification carrying the affected session's identity.
pub enum SessionEvent<T, V> {
    /// A new session was created and registered.
    Connected {
        conn: ConnectionId,
        id: SessionId,
        session: SharedSession<T, V>,
    },
    /// A session was removed from the registry.
    Disconnected { conn: ConnectionId, id: SessionId },
}

impl<T, V> fmt::Debug for SessionEvent<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::Connected { conn, id, .. } => f
                .debug_struct("Connected")
                .field("conn", conn)
                .field("id", id)
                .finish(),
            SessionEvent::Disconnected { conn, id } => f
                .debug_struct("Disconnected")
                .field("conn", conn)
                .field("id", id)
                .finish(),
        }
    }
}

/// Receiver of session lifecycle events.
pub trait EventSink<T, V>: Send + Sync {
    fn publish(&self, event: SessionEvent<T, V>);
}

/// Sink that discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl<T, V> EventSink<T, V> for NullSink {
    fn publish(&self, _event: SessionEvent<T, V>) {}
}

/// Sink backed by a bounded tokio channel.
pub struct ChannelSink<T, V> {
    tx: mpsc::Sender<SessionEvent<T, V>>,
}

impl<T, V> ChannelSink<T, V> {
    /// Create a sink and the receiver a subscriber task should drain.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<SessionEvent<T, V>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl<T, V> EventSink<T, V> for ChannelSink<T, V>
where
    T: Send,
    V: Send,
{
    fn publish(&self, event: SessionEvent<T, V>) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("event channel full; dropping session event");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("event channel closed; dropping session event");
            }
        }
    }
}
