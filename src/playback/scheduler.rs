//! 再生スケジューラ
//!
//! 到着順の復号済みバッファを、重なりなし・順序厳守・隙間なしで再生クロックに
//! 載せるのがこの系全体の核心の不変条件です。
//!
//! - `next_start` カーソルは単調非減少で、スケジューラ内部にのみ存在する
//! - 新バッファの開始時刻は `max(next_start, now)`。到着が再生より速ければ
//!   隙間なく連結され、遅ければ空白はアンダーランの正しい兆候として残る
//! - 到着がずっと実時間より速い場合に備え、キュー総量には上限を設け、
//!   超過フレームは拒否して呼び出し側へ知らせる
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::audio_pipeline::{decode_transport_text, display_volume, pcm16_to_float};
use crate::config::PlaybackFormat;
use crate::telemetry::{SessionMetrics, VolumeSample, VolumeSource};
use crate::transport::TransportFrame;

use super::error::PlaybackError;
use super::sink::{RenderSink, SinkItemId};

/// スケジュール済みバッファのメタデータ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackItem {
    pub scheduled_start: f64,
    pub duration_secs: f64,
}

struct ActiveItem {
    sink_item: SinkItemId,
    completion: JoinHandle<()>,
}

struct CursorState {
    next_start: f64,
    active: HashMap<u64, ActiveItem>,
}

struct Inner<S> {
    sink: S,
    sample_rate_hz: u32,
    max_queued_secs: f64,
    state: Mutex<CursorState>,
    volume_tx: broadcast::Sender<VolumeSample>,
    metrics: Arc<SessionMetrics>,
    stopped: AtomicBool,
    next_id: AtomicU64,
}

/// シンクを専有し、隙間なし再生を保証するスケジューラ
///
/// セッションごとに新規作成し、共有状態のリセットはしません。
pub struct PlaybackScheduler<S: RenderSink> {
    inner: Arc<Inner<S>>,
}

impl<S: RenderSink> Clone for PlaybackScheduler<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: RenderSink> PlaybackScheduler<S> {
    /// シンクを取得してスケジューラを作成
    pub fn new(
        sink: S,
        format: &PlaybackFormat,
        volume_tx: broadcast::Sender<VolumeSample>,
        metrics: Arc<SessionMetrics>,
    ) -> Result<Self, PlaybackError> {
        sink.acquire()?;
        let next_start = sink.now();
        info!(
            sample_rate_hz = format.sample_rate_hz,
            max_queued_secs = format.max_queued_secs,
            "playback scheduler started"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                sink,
                sample_rate_hz: format.sample_rate_hz,
                max_queued_secs: format.max_queued_secs,
                state: Mutex::new(CursorState {
                    next_start,
                    active: HashMap::new(),
                }),
                volume_tx,
                metrics,
                stopped: AtomicBool::new(false),
                next_id: AtomicU64::new(1),
            }),
        })
    }

    /// 符号化されたままの受信フレームを復号し、再生クロックに載せる
    ///
    /// 復号失敗はそのフレーム限りのエラーで、ストリームは継続できます。
    pub fn enqueue(&self, frame: &TransportFrame) -> Result<PlaybackItem, PlaybackError> {
        let inner = &self.inner;
        if inner.stopped.load(Ordering::Acquire) {
            return Err(PlaybackError::Stopped);
        }

        let samples = match decode_frame(frame) {
            Ok(samples) => samples,
            Err(e) => {
                inner.metrics.record_decode_error();
                return Err(e);
            }
        };
        let duration_secs = samples.len() as f64 / inner.sample_rate_hz as f64;

        let volume = display_volume(&samples);
        let _ = inner
            .volume_tx
            .send(VolumeSample::now(volume, VolumeSource::Playback));

        // カーソル更新とシンク登録は同一ロック内で行い、並行到着に対して
        // 順序付けの直列化点をここ一箇所にする
        let mut state = inner.state.lock();
        // stop() はフラグを立ててから同じロックで排水する。ロック越しに
        // 再確認しないと、解放済みシンクへ登録してしまう窓が残る
        if inner.stopped.load(Ordering::Acquire) {
            return Err(PlaybackError::Stopped);
        }
        let now = inner.sink.now();
        let queued_secs = (state.next_start - now).max(0.0);
        if queued_secs + duration_secs > inner.max_queued_secs {
            inner.metrics.record_playback_rejected();
            return Err(PlaybackError::QueueOverflow { queued_secs });
        }

        let scheduled_start = state.next_start.max(now);
        let sink_item = inner
            .sink
            .schedule(samples, inner.sample_rate_hz, scheduled_start)?;
        state.next_start = scheduled_start + duration_secs;

        let id = inner.next_id.fetch_add(1, Ordering::AcqRel);
        let completion = spawn_completion(inner.clone(), id, scheduled_start + duration_secs);
        state.active.insert(id, ActiveItem {
            sink_item,
            completion,
        });

        debug!(scheduled_start, duration_secs, "playback buffer scheduled");
        Ok(PlaybackItem {
            scheduled_start,
            duration_secs,
        })
    }

    /// まだ再生待ち・再生中の項目数
    pub fn active_items(&self) -> usize {
        self.inner.state.lock().active.len()
    }

    /// 全項目を即時停止・破棄し、シンクを解放する（冪等）
    ///
    /// キャンセル時の再生途中打ち切りは許容される。重なりは決して起こさない。
    pub fn stop(&self) {
        let inner = &self.inner;
        if inner.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        let mut state = inner.state.lock();
        for (_, item) in state.active.drain() {
            item.completion.abort();
            inner.sink.cancel(item.sink_item);
        }
        drop(state);

        inner.sink.release();
        info!("playback scheduler stopped");
    }
}

/// 自然な再生終了で項目をアクティブ集合から外す完了フック
fn spawn_completion<S: RenderSink>(
    inner: Arc<Inner<S>>,
    id: u64,
    end_secs: f64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let delay = (end_secs - inner.sink.now()).max(0.0);
        tokio::time::sleep(Duration::from_secs_f64(delay)).await;
        inner.state.lock().active.remove(&id);
    })
}

fn decode_frame(frame: &TransportFrame) -> Result<Vec<f32>, PlaybackError> {
    let bytes = decode_transport_text(&frame.data)?;
    Ok(pcm16_to_float(&bytes)?)
}
