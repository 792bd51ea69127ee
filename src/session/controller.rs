//! セッションコントローラ
//!
//! キャプチャ→トランスポート→スケジューラを結線し、ライフサイクルを
//! 一手に握るオーケストレータ。キャプチャティックと受信フレームは
//! 有界チャネル上の型付きイベントとして単一のループで消費します。
//!
//! 資源の解放は取得の逆順（キャプチャ→シンク→トランスポート）で、
//! 正常停止・リモートクローズ・エラーのどの経路でも同じ一箇所を通ります。
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::capture::{CaptureDevice, CaptureEvent, CapturePipeline};
use crate::config::ConfigSet;
use crate::playback::{PlaybackError, PlaybackScheduler, RenderSink};
use crate::telemetry::{MetricsSnapshot, SessionMetrics, VolumeSample};
use crate::transport::{TransportError, TransportEvent, TransportSession, VoiceTransport};

use super::error::SessionError;
use super::state::SessionState;

const VOLUME_CHANNEL_DEPTH: usize = 64;

/// 1回の音声対話を担うコントローラ
///
/// `start()` が全資源を取得し、`stop()`（または内部エラー）が無条件に
/// 解放します。停止後の再利用はできず、新しい対話には新しいインスタンスを
/// 作ります。
pub struct SessionController<T, D, S>
where
    T: VoiceTransport,
    D: CaptureDevice,
    S: RenderSink,
{
    config: Arc<ConfigSet>,
    transport: Arc<T>,
    device: Mutex<Option<D>>,
    sink: Mutex<Option<S>>,
    state_tx: watch::Sender<SessionState>,
    volume_tx: broadcast::Sender<VolumeSample>,
    metrics: Arc<SessionMetrics>,
    runtime: tokio::sync::Mutex<Option<SessionRuntime<S>>>,
}

struct SessionRuntime<S: RenderSink> {
    shared: Arc<Teardown<S>>,
    run_loop: JoinHandle<()>,
}

/// 逆取得順で一度だけ実行される解放リスト
struct Teardown<S: RenderSink> {
    capture: CapturePipeline,
    scheduler: PlaybackScheduler<S>,
    session: Arc<TransportSession>,
    state_tx: watch::Sender<SessionState>,
    done: AtomicBool,
}

impl<S: RenderSink> Teardown<S> {
    async fn run(&self, final_state: SessionState) {
        if self.done.swap(true, Ordering::AcqRel) {
            return;
        }

        if final_state == SessionState::Closed {
            transition(&self.state_tx, SessionState::Closing);
        }

        self.capture.stop().await;
        self.scheduler.stop();
        self.session.close();
        transition(&self.state_tx, final_state);
        info!(state = %final_state, "session torn down");
    }
}

/// 終端状態からは遷移しない
fn transition(state_tx: &watch::Sender<SessionState>, next: SessionState) {
    state_tx.send_if_modified(|current| {
        if current.is_terminal() {
            false
        } else {
            *current = next;
            true
        }
    });
}

impl<T, D, S> SessionController<T, D, S>
where
    T: VoiceTransport,
    D: CaptureDevice,
    S: RenderSink,
{
    pub fn new(config: ConfigSet, transport: Arc<T>, device: D, sink: S) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Idle);
        let (volume_tx, _) = broadcast::channel(VOLUME_CHANNEL_DEPTH);
        Self {
            config: Arc::new(config),
            transport,
            device: Mutex::new(Some(device)),
            sink: Mutex::new(Some(sink)),
            state_tx,
            volume_tx,
            metrics: Arc::new(SessionMetrics::default()),
            runtime: tokio::sync::Mutex::new(None),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    /// 状態遷移の購読口
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// 音量テレメトリの購読口（キャプチャ/再生の両方が流れる）
    pub fn subscribe_volume(&self) -> broadcast::Receiver<VolumeSample> {
        self.volume_tx.subscribe()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// 全資源を取得してストリーミングを開始する
    ///
    /// ハンドシェイク失敗時は、途中まで取得した資源をすべて解放してから
    /// エラーを返します。
    pub async fn start(&self) -> Result<(), SessionError> {
        {
            let runtime = self.runtime.lock().await;
            if runtime.is_some() || self.state() != SessionState::Idle {
                return Err(SessionError::AlreadyStarted);
            }
            transition(&self.state_tx, SessionState::Connecting);
        }

        // 接続待ちの間はロックを持たない。この間の stop() は状態を終端へ
        // 進めるだけでよく、ここの select が即座にハンドシェイクを破棄する
        let mut state_rx = self.state_tx.subscribe();
        let connected = tokio::select! {
            result = self.connect() => result,
            _ = state_rx.wait_for(|state| state.is_terminal()) => {
                info!("session stopped while connecting");
                return Err(SessionError::Stopped);
            }
        };
        let session = match connected {
            Ok(session) => Arc::new(session),
            Err(e) => {
                transition(&self.state_tx, SessionState::Error);
                return Err(e.into());
            }
        };

        let mut runtime = self.runtime.lock().await;
        if self.state() != SessionState::Connecting {
            // 接続完了と停止が競合した。セッションは使わずに閉じる
            session.close();
            return Err(SessionError::Stopped);
        }
        transition(&self.state_tx, SessionState::Open);
        info!(session_id = %session.session_id(), "transport handshake complete");

        // 取得順: トランスポート → シンク → マイク
        let sink = self.sink.lock().take().ok_or(SessionError::AlreadyStarted)?;
        let scheduler = match PlaybackScheduler::new(
            sink,
            &self.config.audio.playback,
            self.volume_tx.clone(),
            self.metrics.clone(),
        ) {
            Ok(scheduler) => scheduler,
            Err(e) => {
                session.close();
                transition(&self.state_tx, SessionState::Error);
                return Err(e.into());
            }
        };

        let events_rx = match session.take_events().ok_or(TransportError::NotConnected) {
            Ok(rx) => rx,
            Err(e) => {
                scheduler.stop();
                session.close();
                transition(&self.state_tx, SessionState::Error);
                return Err(e.into());
            }
        };

        let device = self
            .device
            .lock()
            .take()
            .ok_or(SessionError::AlreadyStarted)?;
        let (event_tx, event_rx) = mpsc::channel(self.config.audio.capture.queue_frames);
        let capture = match CapturePipeline::start(
            device,
            self.config.audio.transport.sample_rate_hz,
            event_tx,
            self.volume_tx.clone(),
            self.metrics.clone(),
        )
        .await
        {
            Ok(capture) => capture,
            Err(e) => {
                scheduler.stop();
                session.close();
                transition(&self.state_tx, SessionState::Error);
                return Err(e.into());
            }
        };

        transition(&self.state_tx, SessionState::Streaming);
        info!("session streaming");

        let shared = Arc::new(Teardown {
            capture,
            scheduler,
            session,
            state_tx: self.state_tx.clone(),
            done: AtomicBool::new(false),
        });
        let run_loop = tokio::spawn(run_loop(
            shared.clone(),
            event_rx,
            events_rx,
            self.metrics.clone(),
        ));
        *runtime = Some(SessionRuntime { shared, run_loop });
        Ok(())
    }

    /// 順序立てた冪等な停止
    ///
    /// どの状態からでも呼べて、呼び出しが戻った時点でマイク・シンク・
    /// トランスポートは解放済み。二重停止やエラー後の停止は最初の解放以降
    /// 何もしません。
    pub async fn stop(&self) {
        let runtime = self.runtime.lock().await.take();
        match runtime {
            Some(rt) => {
                rt.shared.run(SessionState::Closed).await;
                // 解放後はキャプチャ側チャネルが閉じるのでループは自然に終わる。
                // ループ自身が解放中の場合もここで完了を待つ
                let _ = rt.run_loop.await;
            }
            None => {
                // 未開始（または停止済み）。資源は何も持っていない
                transition(&self.state_tx, SessionState::Closed);
            }
        }
    }

    async fn connect(&self) -> Result<TransportSession, TransportError> {
        let timeout = Duration::from_millis(self.config.session.connect_timeout_ms);
        match tokio::time::timeout(timeout, self.transport.connect(&self.config.session)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::HandshakeFailed {
                message: format!("handshake timed out after {}ms", timeout.as_millis()),
            }),
        }
    }
}

/// キャプチャイベントとトランスポートイベントを消費する単一のループ
async fn run_loop<S: RenderSink>(
    shared: Arc<Teardown<S>>,
    mut capture_rx: mpsc::Receiver<CaptureEvent>,
    mut transport_rx: mpsc::Receiver<TransportEvent>,
    metrics: Arc<SessionMetrics>,
) {
    loop {
        tokio::select! {
            event = capture_rx.recv() => match event {
                Some(CaptureEvent::Frame(frame)) => match shared.session.send(frame) {
                    Ok(()) => metrics.record_frame_sent(),
                    Err(e) => {
                        // 送信経路はブロックしない。落としたことは必ず残す
                        metrics.record_frame_dropped();
                        warn!(error = %e, "outbound frame dropped");
                    }
                },
                Some(CaptureEvent::Fatal(e)) => {
                    error!(error = %e, "capture device lost");
                    shared.run(SessionState::Error).await;
                    break;
                }
                // キャプチャ側が黙って閉じた（致命イベントが落ちた場合を含む）。
                // 通常停止の後なら解放済みなので run は何もしない
                None => {
                    shared.run(SessionState::Error).await;
                    break;
                }
            },
            event = transport_rx.recv() => match event {
                Some(TransportEvent::Audio(frame)) => match shared.scheduler.enqueue(&frame) {
                    Ok(item) => debug!(
                        scheduled_start = item.scheduled_start,
                        duration_secs = item.duration_secs,
                        "inbound frame scheduled"
                    ),
                    Err(e @ PlaybackError::Decode(_)) => {
                        // 壊れたフレーム1枚の影響はそのフレーム限りにする
                        warn!(error = %e, "dropping malformed inbound frame");
                    }
                    Err(e @ PlaybackError::QueueOverflow { .. }) => {
                        warn!(error = %e, "inbound frame rejected by queue cap");
                    }
                    Err(e) => {
                        error!(error = %e, "playback scheduling failed");
                        shared.run(SessionState::Error).await;
                        break;
                    }
                },
                Some(TransportEvent::Closed { reason }) => {
                    info!(reason = ?reason, "remote closed session");
                    shared.run(SessionState::Closed).await;
                    break;
                }
                Some(TransportEvent::Error { message }) => {
                    error!(message = %message, "transport failed");
                    shared.run(SessionState::Error).await;
                    break;
                }
                None => {
                    shared.run(SessionState::Error).await;
                    break;
                }
            },
        }
    }
}
