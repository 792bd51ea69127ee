//! 接続確立後のセッションハンドル
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use super::error::TransportError;
use super::wire::{ClientMessage, TransportFrame};

/// 受信メッセージを分流した結果のイベント
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// 音声フレーム（まだトランスポート符号化されたまま）
    Audio(TransportFrame),
    /// リモート主導のクローズ
    Closed { reason: Option<String> },
    /// セッション継続不能なトランスポート障害
    Error { message: String },
}

/// 双方向チャネルのクライアント側ハンドル
///
/// `connect()` の成功によってのみ得られます。送信はファイアアンドフォワードで
/// ネットワーク待ちをせず、`close()` 後の送信は `NotConnected` になります。
#[derive(Debug)]
pub struct TransportSession {
    session_id: String,
    outbound_tx: mpsc::Sender<String>,
    events_rx: Mutex<Option<mpsc::Receiver<TransportEvent>>>,
    open: Arc<AtomicBool>,
}

impl TransportSession {
    pub(crate) fn new(
        session_id: impl Into<String>,
        outbound_tx: mpsc::Sender<String>,
        events_rx: mpsc::Receiver<TransportEvent>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            outbound_tx,
            events_rx: Mutex::new(Some(events_rx)),
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// 音声フレームを送出（キャプチャ順のFIFO、ブロックしない）
    pub fn send(&self, frame: TransportFrame) -> Result<(), TransportError> {
        if !self.open.load(Ordering::Acquire) {
            return Err(TransportError::NotConnected);
        }

        let message = ClientMessage::Audio {
            data: frame.data,
            mime_type: frame.mime_type,
        };
        let text =
            serde_json::to_string(&message).map_err(|source| TransportError::Encode { source })?;
        self.outbound_tx
            .try_send(text)
            .map_err(|_| TransportError::Send)
    }

    /// 受信イベントチャネルを取り出す（一度だけ成功）
    pub fn take_events(&self) -> Option<mpsc::Receiver<TransportEvent>> {
        self.events_rx.lock().take()
    }

    /// セッションを閉じる（冪等）
    pub fn close(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            debug!(session_id = %self.session_id, "transport session closed");
            // ベストエフォートでクローズを通知。キュー満杯なら諦める
            if let Ok(text) = serde_json::to_string(&ClientMessage::Close) {
                let _ = self.outbound_tx.try_send(text);
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}
