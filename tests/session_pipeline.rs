#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! End-to-end exercises of the session read and write pipelines over
//! in-memory duplex streams: round-trips, partial delivery, unknown ids,
//! handler replies, and contained failures.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;

use packet_session::config::SessionConfig;
use packet_session::core::frame::{encode_frame, FrameReader, PacketId};
use packet_session::core::serialization::{BincodeCodec, RawCodec};
use packet_session::error::Result;
use packet_session::protocol::packet::{InboundPacket, OutboundPacket, PacketTable};
use packet_session::protocol::session::{ClientSession, ConnectionId, ProtocolStack};
use packet_session::utils::crypto::{PlainCipher, XChaChaCipher};
use packet_session::{ReadStatus, SessionError};

const ECHO_ID: u32 = 1;
const CHAT_ID: u32 = 2;

/// Inbound packet that forwards the decoded value to the test.
struct Recorder<V> {
    tx: mpsc::UnboundedSender<V>,
}

#[async_trait]
impl<V: Send + 'static> InboundPacket<DuplexStream, V> for Recorder<V> {
    async fn handle(
        &self,
        _session: &mut ClientSession<DuplexStream, V>,
        value: V,
    ) -> Result<()> {
        self.tx
            .send(value)
            .map_err(|_| SessionError::Handler("recorder channel closed".to_string()))
    }
}

/// Outbound packet carrying a fixed raw payload.
struct RawOut {
    id: u32,
    payload: Vec<u8>,
}

impl OutboundPacket<DuplexStream, Vec<u8>> for RawOut {
    fn id(&self) -> PacketId {
        PacketId(self.id)
    }

    fn payload(&self, _session: &ClientSession<DuplexStream, Vec<u8>>) -> Result<Vec<u8>> {
        Ok(self.payload.clone())
    }
}

/// Inbound packet that immediately writes the value back to the peer.
struct EchoBack;

#[async_trait]
impl InboundPacket<DuplexStream, Vec<u8>> for EchoBack {
    async fn handle(
        &self,
        session: &mut ClientSession<DuplexStream, Vec<u8>>,
        value: Vec<u8>,
    ) -> Result<()> {
        let reply = RawOut {
            id: ECHO_ID,
            payload: value,
        };
        session.write(&reply).await;
        Ok(())
    }
}

fn raw_stack(
    table: PacketTable<DuplexStream, Vec<u8>>,
) -> Arc<ProtocolStack<DuplexStream, Vec<u8>>> {
    Arc::new(ProtocolStack::new(
        Box::new(RawCodec),
        Box::new(PlainCipher),
        Box::new(table),
    ))
}

fn recording_stack() -> (
    Arc<ProtocolStack<DuplexStream, Vec<u8>>>,
    mpsc::UnboundedReceiver<Vec<u8>>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut table = PacketTable::new();
    table.register(ECHO_ID, move || Recorder { tx: tx.clone() });
    (raw_stack(table), rx)
}

fn session(
    transport: DuplexStream,
    stack: Arc<ProtocolStack<DuplexStream, Vec<u8>>>,
) -> ClientSession<DuplexStream, Vec<u8>> {
    ClientSession::new(ConnectionId(1), transport, stack, &SessionConfig::default())
}

#[tokio::test]
async fn write_pipeline_round_trips_into_read_pipeline() {
    // Writer session produces the bytes...
    let (writer_end, mut capture) = tokio::io::duplex(1024);
    let mut writer = session(writer_end, raw_stack(PacketTable::new()));
    let sent = writer
        .write(&RawOut {
            id: ECHO_ID,
            payload: b"ping".to_vec(),
        })
        .await;
    assert!(sent);

    let mut bytes = vec![0u8; 1024];
    let n = capture.read(&mut bytes).await.unwrap();

    // ...and a reading session dispatches them to packet ECHO_ID with the
    // original payload value.
    let (reader_end, mut feeder) = tokio::io::duplex(1024);
    let (stack, mut rx) = recording_stack();
    let mut reader = session(reader_end, stack);

    feeder.write_all(&bytes[..n]).await.unwrap();
    match reader.read().await {
        ReadStatus::Dispatched { handled, failed } => {
            assert_eq!((handled, failed), (1, 0));
        }
        other => panic!("unexpected status: {other:?}"),
    }
    assert_eq!(rx.recv().await.unwrap(), b"ping".to_vec());
}

#[tokio::test]
async fn partial_length_prefix_is_retained_across_invocations() {
    let (reader_end, mut feeder) = tokio::io::duplex(1024);
    let (stack, mut rx) = recording_stack();
    let mut reader = session(reader_end, stack);

    let bytes = encode_frame(PacketId(ECHO_ID), b"split", 1 << 20)
        .unwrap()
        .to_vec();

    // Two bytes of the length prefix alone must not desynchronize anything.
    feeder.write_all(&bytes[..2]).await.unwrap();
    assert!(matches!(reader.read().await, ReadStatus::Pending));
    assert_eq!(reader.buffered(), 2);

    // Remaining two prefix bytes: length known, body still missing.
    feeder.write_all(&bytes[2..4]).await.unwrap();
    assert!(matches!(reader.read().await, ReadStatus::Pending));

    // Body in two pieces; exactly one frame comes out at the end.
    feeder.write_all(&bytes[4..7]).await.unwrap();
    assert!(matches!(reader.read().await, ReadStatus::Pending));
    feeder.write_all(&bytes[7..]).await.unwrap();
    match reader.read().await {
        ReadStatus::Dispatched { handled, failed } => {
            assert_eq!((handled, failed), (1, 0));
        }
        other => panic!("unexpected status: {other:?}"),
    }
    assert_eq!(rx.recv().await.unwrap(), b"split".to_vec());
    assert_eq!(reader.buffered(), 0);
}

#[tokio::test]
async fn unknown_packet_id_aborts_without_desynchronizing() {
    let (reader_end, mut feeder) = tokio::io::duplex(1024);
    let (stack, mut rx) = recording_stack();
    let mut reader = session(reader_end, stack);

    // An unregistered id followed by a valid frame in the same chunk: the
    // unknown frame consumes exactly its declared bytes, the next parses.
    let mut bytes = encode_frame(PacketId(9999), b"junk", 1 << 20).unwrap().to_vec();
    bytes.extend_from_slice(&encode_frame(PacketId(ECHO_ID), b"good", 1 << 20).unwrap());
    feeder.write_all(&bytes).await.unwrap();

    match reader.read().await {
        ReadStatus::Dispatched { handled, failed } => {
            assert_eq!((handled, failed), (1, 1));
        }
        other => panic!("unexpected status: {other:?}"),
    }
    assert_eq!(rx.recv().await.unwrap(), b"good".to_vec());
}

#[tokio::test]
async fn oversized_declared_length_fails_the_read() {
    let config = SessionConfig {
        max_frame_len: 64,
        ..SessionConfig::default()
    };
    let (reader_end, mut feeder) = tokio::io::duplex(1024);
    let (stack, _rx) = recording_stack();
    let mut reader =
        ClientSession::new(ConnectionId(1), reader_end, stack, &config);

    feeder.write_all(&(1000u32).to_be_bytes()).await.unwrap();
    match reader.read().await {
        ReadStatus::Failed {
            error: SessionError::OversizedFrame(1000),
            handled: 0,
            failed: 0,
        } => {}
        other => panic!("unexpected status: {other:?}"),
    }
}

#[tokio::test]
async fn dispatch_counts_survive_a_late_framing_violation() {
    // One valid frame followed by a poisoned length prefix in the same
    // chunk: the status reports the failure without losing the count of
    // frames already dispatched.
    let config = SessionConfig {
        max_frame_len: 64,
        ..SessionConfig::default()
    };
    let (reader_end, mut feeder) = tokio::io::duplex(1024);
    let (stack, mut rx) = recording_stack();
    let mut reader = ClientSession::new(ConnectionId(1), reader_end, stack, &config);

    let mut bytes = encode_frame(PacketId(ECHO_ID), b"last words", 64)
        .unwrap()
        .to_vec();
    bytes.extend_from_slice(&(1000u32).to_be_bytes());
    feeder.write_all(&bytes).await.unwrap();

    match reader.read().await {
        ReadStatus::Failed {
            error: SessionError::OversizedFrame(1000),
            handled: 1,
            failed: 0,
        } => {}
        other => panic!("unexpected status: {other:?}"),
    }
    assert_eq!(rx.recv().await.unwrap(), b"last words".to_vec());
}

#[tokio::test]
async fn undecodable_payload_is_contained() {
    // A bincode codec expecting a struct, fed raw garbage: the frame is
    // abandoned, the session stays usable.
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Chat {
        text: String,
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<Chat>();
    let mut table = PacketTable::<DuplexStream, Chat>::new();
    table.register(CHAT_ID, move || Recorder { tx: tx.clone() });
    let stack = Arc::new(ProtocolStack::new(
        Box::new(BincodeCodec::<Chat>::default()),
        Box::new(PlainCipher),
        Box::new(table),
    ));

    let (reader_end, mut feeder) = tokio::io::duplex(1024);
    let mut reader =
        ClientSession::new(ConnectionId(1), reader_end, stack, &SessionConfig::default());

    let garbage = encode_frame(PacketId(CHAT_ID), &[0xFF; 3], 1 << 20).unwrap();
    feeder.write_all(&garbage).await.unwrap();
    match reader.read().await {
        ReadStatus::Dispatched { handled, failed } => {
            assert_eq!((handled, failed), (0, 1));
        }
        other => panic!("unexpected status: {other:?}"),
    }
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn handler_can_reply_through_the_write_pipeline() {
    let mut table = PacketTable::new();
    table.register(ECHO_ID, || EchoBack);
    let (session_end, mut peer) = tokio::io::duplex(1024);
    let mut echo = session(session_end, raw_stack(table));

    peer.write_all(&encode_frame(PacketId(ECHO_ID), b"marco", 1 << 20).unwrap())
        .await
        .unwrap();
    match echo.read().await {
        ReadStatus::Dispatched { handled, failed } => {
            assert_eq!((handled, failed), (1, 0));
        }
        other => panic!("unexpected status: {other:?}"),
    }

    // The reply arrives framed exactly like inbound traffic.
    let mut buf = vec![0u8; 1024];
    let n = peer.read(&mut buf).await.unwrap();
    let mut parser = FrameReader::new(64, 1 << 20);
    parser.extend(&buf[..n]);
    let frame = parser.try_next().unwrap().expect("framed reply");
    assert_eq!(frame.packet_id, PacketId(ECHO_ID));
    assert_eq!(&frame.payload[..], b"marco");
}

#[tokio::test]
async fn closed_transport_reports_closed() {
    let (reader_end, feeder) = tokio::io::duplex(64);
    let (stack, _rx) = recording_stack();
    let mut reader = session(reader_end, stack);

    drop(feeder);
    assert!(matches!(reader.read().await, ReadStatus::Closed));
}

#[tokio::test]
async fn write_failure_returns_false() {
    let (writer_end, peer) = tokio::io::duplex(64);
    let mut writer = session(writer_end, raw_stack(PacketTable::new()));

    drop(peer);
    let sent = writer
        .write(&RawOut {
            id: ECHO_ID,
            payload: b"nobody listening".to_vec(),
        })
        .await;
    assert!(!sent);
}

#[tokio::test]
async fn encrypted_bincode_round_trip() {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Chat {
        from: String,
        text: String,
    }

    struct ChatOut(Chat);

    impl OutboundPacket<DuplexStream, Chat> for ChatOut {
        fn id(&self) -> PacketId {
            PacketId(CHAT_ID)
        }

        fn payload(&self, _session: &ClientSession<DuplexStream, Chat>) -> Result<Chat> {
            Ok(self.0.clone())
        }
    }

    let key = [42u8; 32];
    let make_stack = |tx: Option<mpsc::UnboundedSender<Chat>>| {
        let mut table = PacketTable::<DuplexStream, Chat>::new();
        if let Some(tx) = tx {
            table.register(CHAT_ID, move || Recorder { tx: tx.clone() });
        }
        Arc::new(ProtocolStack::new(
            Box::new(BincodeCodec::<Chat>::default()),
            Box::new(XChaChaCipher::new(&key)),
            Box::new(table),
        ))
    };

    let message = Chat {
        from: "peer-7".to_string(),
        text: "over encrypted framing".to_string(),
    };

    // Write on one session, capture the ciphertext frames.
    let (writer_end, mut capture) = tokio::io::duplex(4096);
    let mut writer = ClientSession::new(
        ConnectionId(1),
        writer_end,
        make_stack(None),
        &SessionConfig::default(),
    );
    assert!(writer.write(&ChatOut(message.clone())).await);

    let mut bytes = vec![0u8; 4096];
    let n = capture.read(&mut bytes).await.unwrap();

    // Feed them into a session keyed the same way.
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (reader_end, mut feeder) = tokio::io::duplex(4096);
    let mut reader = ClientSession::new(
        ConnectionId(2),
        reader_end,
        make_stack(Some(tx)),
        &SessionConfig::default(),
    );
    feeder.write_all(&bytes[..n]).await.unwrap();
    match reader.read().await {
        ReadStatus::Dispatched { handled, failed } => {
            assert_eq!((handled, failed), (1, 0));
        }
        other => panic!("unexpected status: {other:?}"),
    }
    assert_eq!(rx.recv().await.unwrap(), message);
}
