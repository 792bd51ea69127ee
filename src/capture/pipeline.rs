//! キャプチャパイプライン
//!
//! デバイスからチャンクを引き、リサンプル→PCM16→トランスポート符号化を
//! 同期的に行ってフレームを送出するタスク。ネットワーク待ちは一切せず、
//! キューが満杯ならフレームは縁で破棄され、破棄はカウンタに必ず現れます。
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::audio_pipeline::{
    display_volume, encode_transport_text, float_to_pcm16, AudioChunk, BlockResampler,
};
use crate::telemetry::{SessionMetrics, VolumeSample, VolumeSource};
use crate::transport::TransportFrame;

use super::device::CaptureDevice;
use super::error::CaptureError;

/// キャプチャタスクからコントローラへの型付きイベント
#[derive(Debug)]
pub enum CaptureEvent {
    /// 符号化済みの送信フレーム
    Frame(TransportFrame),
    /// デバイス喪失。パイプラインはこの後自律的に終了する
    Fatal(CaptureError),
}

/// 稼働中のキャプチャパイプラインのハンドル
///
/// `stop()` は何度呼んでも安全で、エラーハンドラからも呼べます。
/// 最初の呼び出しでティックの発火を止め、デバイスを解放します。
#[derive(Debug)]
pub struct CapturePipeline {
    stop_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CapturePipeline {
    /// デバイスを取得してキャプチャタスクを起動
    ///
    /// 取得失敗（権限拒否など）はタスクを立ち上げる前に同期的に返します。
    pub async fn start<D: CaptureDevice>(
        mut device: D,
        transport_rate_hz: u32,
        event_tx: mpsc::Sender<CaptureEvent>,
        volume_tx: broadcast::Sender<VolumeSample>,
        metrics: Arc<SessionMetrics>,
    ) -> Result<Self, CaptureError> {
        device.acquire().await?;

        let native_rate = device.sample_rate_hz();
        let resampler = BlockResampler::new(native_rate, transport_rate_hz);
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            info!(native_rate, transport_rate_hz, "capture pipeline started");
            loop {
                let chunk = tokio::select! {
                    _ = stop_rx.changed() => break,
                    chunk = device.next_chunk() => chunk,
                };

                match chunk {
                    Ok(chunk) => {
                        process_chunk(
                            &chunk,
                            &resampler,
                            transport_rate_hz,
                            &event_tx,
                            &volume_tx,
                            metrics.as_ref(),
                        );
                    }
                    Err(CaptureError::Stalled) => {
                        // ティック1回分の欠落。ストリームは継続する
                        metrics.record_capture_stall();
                        warn!("capture tick produced no frame");
                    }
                    Err(e) => {
                        // キュー満杯でも停止経路を待たせない。届かなかった喪失は
                        // チャネル閉鎖として伝わる
                        if event_tx.try_send(CaptureEvent::Fatal(e)).is_err() {
                            warn!("frame queue full, fatal capture event dropped");
                        }
                        break;
                    }
                }
            }

            device.release();
            debug!("capture pipeline stopped");
        });

        Ok(Self {
            stop_tx,
            task: Mutex::new(Some(task)),
        })
    }

    /// ティックの発火を止め、デバイス解放まで待つ（冪等）
    pub async fn stop(&self) {
        let _ = self.stop_tx.send(true);
        let task = self.task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

/// チャンク1つ分の変換と送出。ティックごとにちょうど一度呼ばれる
fn process_chunk(
    chunk: &AudioChunk,
    resampler: &BlockResampler,
    transport_rate_hz: u32,
    event_tx: &mpsc::Sender<CaptureEvent>,
    volume_tx: &broadcast::Sender<VolumeSample>,
    metrics: &SessionMetrics,
) {
    let resampled = resampler.resample(&chunk.samples);
    let pcm = float_to_pcm16(&resampled);
    let frame = TransportFrame::pcm(encode_transport_text(&pcm), transport_rate_hz);
    metrics.record_frame_captured();

    // 音量はフレーム経路をブロックせずに配信（購読者不在なら捨てる）
    let volume = display_volume(&chunk.samples);
    let _ = volume_tx.send(VolumeSample::now(volume, VolumeSource::Capture));

    match event_tx.try_send(CaptureEvent::Frame(frame)) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            metrics.record_frame_dropped();
            warn!("frame queue full, dropping capture frame at the edge");
        }
        Err(TrySendError::Closed(_)) => {
            metrics.record_frame_dropped();
            debug!("frame queue closed, dropping capture frame");
        }
    }
}
