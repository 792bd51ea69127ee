use std::time::Duration;

use voice_realtime_session::config::SessionConfig;
use voice_realtime_session::transport::{
    ClientMessage, LoopbackTransport, ServerMessage, TransportError, TransportEvent,
    TransportFrame, VoiceTransport,
};

fn session_config() -> SessionConfig {
    SessionConfig {
        voice: "aoede".to_string(),
        system_instruction: "Answer briefly.".to_string(),
        connect_timeout_ms: 1_000,
    }
}

#[tokio::test]
async fn connect_sends_the_setup_payload_first() {
    let transport = LoopbackTransport::new();
    let session = transport.connect(&session_config()).await.expect("connect");
    assert!(session.is_open());

    let mut peer = transport.take_peer().expect("peer");
    let text = peer.outbound_rx.recv().await.expect("setup text");
    match serde_json::from_str::<ClientMessage>(&text).expect("parse") {
        ClientMessage::Setup {
            voice,
            system_instruction,
            output_sample_rate_hz,
        } => {
            assert_eq!(voice, "aoede");
            assert_eq!(system_instruction, "Answer briefly.");
            assert_eq!(output_sample_rate_hz, 24_000);
        }
        other => panic!("unexpected first message {other:?}"),
    }
}

#[tokio::test]
async fn outbound_frames_keep_capture_order() {
    let transport = LoopbackTransport::new();
    let session = transport.connect(&session_config()).await.expect("connect");
    let mut peer = transport.take_peer().expect("peer");

    for tag in ["AAA", "BBB", "CCC"] {
        session
            .send(TransportFrame::pcm(tag.to_string(), 16_000))
            .expect("send");
    }

    for expected in ["AAA", "BBB", "CCC"] {
        match peer.next_audio().await.expect("audio") {
            ClientMessage::Audio { data, mime_type } => {
                assert_eq!(data, expected);
                assert_eq!(mime_type, "audio/pcm;rate=16000");
            }
            other => panic!("unexpected message {other:?}"),
        }
    }
}

#[tokio::test]
async fn send_after_close_is_not_connected() {
    let transport = LoopbackTransport::new();
    let session = transport.connect(&session_config()).await.expect("connect");

    session.close();
    session.close(); // 冪等

    let err = session
        .send(TransportFrame::pcm("data".to_string(), 16_000))
        .expect_err("send after close");
    assert!(matches!(err, TransportError::NotConnected));
}

#[tokio::test]
async fn inbound_audio_is_demultiplexed_and_unknown_kinds_ignored() {
    let transport = LoopbackTransport::new();
    let session = transport.connect(&session_config()).await.expect("connect");
    let mut events = session.take_events().expect("events");
    let peer = transport.take_peer().expect("peer");

    // 未知の種別と壊れたテキストは読み飛ばされる
    let _ = peer
        .inbound_tx
        .send(r#"{"type":"transcript","text":"hello"}"#.to_string())
        .await;
    let _ = peer.inbound_tx.send("not json at all".to_string()).await;
    peer.inject(&ServerMessage::Audio {
        data: "UENNMTY=".to_string(),
        mime_type: "audio/pcm;rate=24000".to_string(),
    })
    .await;

    match events.recv().await.expect("event") {
        TransportEvent::Audio(frame) => {
            assert_eq!(frame.data, "UENNMTY=");
            assert_eq!(frame.mime_type, "audio/pcm;rate=24000");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn remote_close_surfaces_as_a_terminal_event() {
    let transport = LoopbackTransport::new();
    let session = transport.connect(&session_config()).await.expect("connect");
    let mut events = session.take_events().expect("events");
    let peer = transport.take_peer().expect("peer");

    peer.inject(&ServerMessage::Closed {
        reason: Some("turn complete".to_string()),
    })
    .await;

    match events.recv().await.expect("event") {
        TransportEvent::Closed { reason } => {
            assert_eq!(reason.as_deref(), Some("turn complete"));
        }
        other => panic!("unexpected event {other:?}"),
    }
    // クローズ後はイベントが閉じる
    assert!(events.recv().await.is_none());
}

#[tokio::test]
async fn take_events_succeeds_only_once() {
    let transport = LoopbackTransport::new();
    let session = transport.connect(&session_config()).await.expect("connect");
    assert!(session.take_events().is_some());
    assert!(session.take_events().is_none());
}

#[tokio::test(start_paused = true)]
async fn handshake_failure_is_reported() {
    let transport = LoopbackTransport::new()
        .with_handshake_delay(Duration::from_millis(50))
        .with_failing_handshake();

    let err = transport
        .connect(&session_config())
        .await
        .expect_err("handshake should fail");
    assert!(matches!(err, TransportError::HandshakeFailed { .. }));
    assert!(transport.take_peer().is_none());
}
