//! プロセス内ループバックトランスポート
//!
//! 実ネットワークの代わりに mpsc で双方向チャネルを張る実装。テストとデモが
//! リモートサービス役（ピア）を演じるためのフックを提供します。
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::SessionConfig;

use super::error::TransportError;
use super::session::{TransportEvent, TransportSession};
use super::wire::{ClientMessage, ServerMessage, TransportFrame};
use super::VoiceTransport;

const CHANNEL_DEPTH: usize = 64;

/// ピア側（テスト/デモがリモートサービスを演じる側）のハンドル
#[derive(Debug)]
pub struct LoopbackPeer {
    /// クライアントが送出したワイヤテキスト（最初の1件はセットアップ）
    pub outbound_rx: mpsc::Receiver<String>,
    /// サービス→クライアントのワイヤテキストを注入する
    pub inbound_tx: mpsc::Sender<String>,
}

impl LoopbackPeer {
    /// サーバメッセージを注入（シリアライズ込みの補助）
    pub async fn inject(&self, message: &ServerMessage) {
        match serde_json::to_string(message) {
            Ok(text) => {
                let _ = self.inbound_tx.send(text).await;
            }
            Err(e) => warn!(error = %e, "failed to serialize injected message"),
        }
    }

    /// 次の音声フレームをデシリアライズして取得（音声以外は読み飛ばす）
    pub async fn next_audio(&mut self) -> Option<ClientMessage> {
        while let Some(text) = self.outbound_rx.recv().await {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(message @ ClientMessage::Audio { .. }) => return Some(message),
                Ok(ClientMessage::Close) => return None,
                Ok(_) => continue,
                Err(e) => {
                    warn!(error = %e, "peer received malformed wire text");
                    continue;
                }
            }
        }
        None
    }
}

/// インメモリのループバック実装
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    handshake_delay: Duration,
    fail_handshake: bool,
    peer: Mutex<Option<LoopbackPeer>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// ハンドシェイクに要する時間を模擬
    pub fn with_handshake_delay(mut self, delay: Duration) -> Self {
        self.handshake_delay = delay;
        self
    }

    /// ハンドシェイクを必ず失敗させる（エラーパス検証用）
    pub fn with_failing_handshake(mut self) -> Self {
        self.fail_handshake = true;
        self
    }

    /// 接続済みセッションのピア側ハンドルを取り出す（一度だけ成功）
    pub fn take_peer(&self) -> Option<LoopbackPeer> {
        self.peer.lock().take()
    }
}

#[async_trait]
impl VoiceTransport for LoopbackTransport {
    async fn connect(&self, config: &SessionConfig) -> Result<TransportSession, TransportError> {
        tokio::time::sleep(self.handshake_delay).await;
        if self.fail_handshake {
            return Err(TransportError::HandshakeFailed {
                message: "remote rejected session".to_string(),
            });
        }

        let session_id = Uuid::new_v4().to_string();
        let (outbound_tx, outbound_rx) = mpsc::channel::<String>(CHANNEL_DEPTH);
        let (inbound_tx, inbound_rx) = mpsc::channel::<String>(CHANNEL_DEPTH);
        let (events_tx, events_rx) = mpsc::channel::<TransportEvent>(CHANNEL_DEPTH);

        // セットアップペイロードは接続時に一度だけ送る（中身は不透明）
        let setup = ClientMessage::Setup {
            voice: config.voice.clone(),
            system_instruction: config.system_instruction.clone(),
            output_sample_rate_hz: 24_000,
        };
        let setup_text =
            serde_json::to_string(&setup).map_err(|source| TransportError::Encode { source })?;
        outbound_tx
            .try_send(setup_text)
            .map_err(|_| TransportError::Send)?;

        spawn_demux(session_id.clone(), inbound_rx, events_tx);

        *self.peer.lock() = Some(LoopbackPeer {
            outbound_rx,
            inbound_tx,
        });

        debug!(session_id = %session_id, "loopback handshake complete");
        Ok(TransportSession::new(session_id, outbound_tx, events_rx))
    }
}

/// 受信ワイヤテキストを型付きイベントへ分流するタスク
fn spawn_demux(
    session_id: String,
    mut inbound_rx: mpsc::Receiver<String>,
    events_tx: mpsc::Sender<TransportEvent>,
) {
    tokio::spawn(async move {
        while let Some(text) = inbound_rx.recv().await {
            let event = match serde_json::from_str::<ServerMessage>(&text) {
                Ok(ServerMessage::Audio { data, mime_type }) => {
                    TransportEvent::Audio(TransportFrame { data, mime_type })
                }
                Ok(ServerMessage::Closed { reason }) => TransportEvent::Closed { reason },
                Ok(ServerMessage::Error { message }) => TransportEvent::Error { message },
                Ok(ServerMessage::Other) => {
                    // 音声とライフサイクル以外はこのコアの対象外
                    debug!(session_id = %session_id, "ignoring non-audio payload");
                    continue;
                }
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "malformed inbound wire text");
                    continue;
                }
            };

            let is_terminal = matches!(
                event,
                TransportEvent::Closed { .. } | TransportEvent::Error { .. }
            );
            if events_tx.send(event).await.is_err() {
                break;
            }
            if is_terminal {
                break;
            }
        }
    });
}
