//! # Session Registry
//!
//! Single source of truth for which sessions exist and how to reach them.
//!
//! The registry owns a connection-keyed map of live sessions behind one
//! `parking_lot::RwLock`, so the dispatch loop and auxiliary threads (timers,
//! admin surfaces) can mutate and iterate it without observing corruption.
//! Sessions are created through an injectable [`SessionFactory`], which tests
//! substitute to produce instrumented sessions.
//!
//! Registration publishes [`SessionEvent::Connected`]; removal publishes
//! [`SessionEvent::Disconnected`]. Without [`SessionRegistry::unregister`]
//! the registry would leak one entry per disconnected peer, so teardown code
//! must call it even though teardown policy itself lives outside this core.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::protocol::events::{EventSink, SessionEvent};
use crate::protocol::session::{
    ClientSession, ConnectionId, ProtocolStack, SessionId, SharedSession,
};

/// Strategy producing the session for a newly seen connection.
pub type SessionFactory<T, V> =
    Box<dyn Fn(ConnectionId, T) -> ClientSession<T, V> + Send + Sync>;

struct SessionSlot<T, V> {
    id: SessionId,
    session: SharedSession<T, V>,
}

/// Connection-keyed set of live sessions.
pub struct SessionRegistry<T, V> {
    sessions: RwLock<HashMap<ConnectionId, SessionSlot<T, V>>>,
    factory: SessionFactory<T, V>,
    events: Box<dyn EventSink<T, V>>,
}

impl<T, V> SessionRegistry<T, V> {
    /// Registry with the default factory: sessions built over `stack` with
    /// `config`'s buffer sizing.
    pub fn new(
        stack: Arc<ProtocolStack<T, V>>,
        config: SessionConfig,
        events: Box<dyn EventSink<T, V>>,
    ) -> Self
    where
        T: 'static,
        V: 'static,
    {
        let factory: SessionFactory<T, V> = Box::new(move |conn, transport| {
            ClientSession::new(conn, transport, Arc::clone(&stack), &config)
        });
        Self::with_factory(factory, events)
    }

    /// Registry with a caller-supplied session factory.
    pub fn with_factory(factory: SessionFactory<T, V>, events: Box<dyn EventSink<T, V>>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            factory,
            events,
        }
    }

    /// Create a session for `conn`, insert it, and publish `Connected`.
    ///
    /// Fails with [`SessionError::DuplicateRegistration`] if `conn` is
    /// already present; an existing session is never silently replaced.
    pub fn register(&self, conn: ConnectionId, transport: T) -> Result<SharedSession<T, V>> {
        let (id, shared) = {
            let mut map = self.sessions.write();
            if map.contains_key(&conn) {
                return Err(SessionError::DuplicateRegistration(conn));
            }
            let session = (self.factory)(conn, transport);
            let id = session.id();
            let shared = Arc::new(Mutex::new(session));
            map.insert(
                conn,
                SessionSlot {
                    id,
                    session: Arc::clone(&shared),
                },
            );
            (id, shared)
        };
        // Publish only after the write guard is gone: the lock is not
        // reentrant, and a sink may consult the registry it serves.
        debug!(%conn, session = %id, "session registered");
        self.events.publish(SessionEvent::Connected {
            conn,
            id,
            session: Arc::clone(&shared),
        });
        Ok(shared)
    }

    /// Look up the session owning `conn`. Misses return `None`.
    pub fn get(&self, conn: ConnectionId) -> Option<SharedSession<T, V>> {
        self.sessions
            .read()
            .get(&conn)
            .map(|slot| Arc::clone(&slot.session))
    }

    /// Look up a session by logical id.
    ///
    /// Linear scan over all entries: O(n), acceptable for small peer counts.
    pub fn get_by_session(&self, id: SessionId) -> Option<SharedSession<T, V>> {
        self.sessions
            .read()
            .values()
            .find(|slot| slot.id == id)
            .map(|slot| Arc::clone(&slot.session))
    }

    /// Remove `conn`'s entry if present; returns whether anything was removed.
    ///
    /// Publishes `Disconnected` on removal. Never errors for a missing key.
    pub fn unregister(&self, conn: ConnectionId) -> bool {
        let removed = self.sessions.write().remove(&conn);
        match removed {
            Some(slot) => {
                debug!(%conn, session = %slot.id, "session unregistered");
                self.events
                    .publish(SessionEvent::Disconnected { conn, id: slot.id });
                true
            }
            None => false,
        }
    }

    /// Snapshot of all registered connection ids.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.sessions.read().keys().copied().collect()
    }

    /// Snapshot of all live sessions.
    pub fn sessions(&self) -> Vec<SharedSession<T, V>> {
        self.sessions
            .read()
            .values()
            .map(|slot| Arc::clone(&slot.session))
            .collect()
    }

    /// Snapshot of all (connection, session) pairs.
    pub fn entries(&self) -> Vec<(ConnectionId, SharedSession<T, V>)> {
        self.sessions
            .read()
            .iter()
            .map(|(conn, slot)| (*conn, Arc::clone(&slot.session)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
