//! テレメトリ（音量サンプルとセッション内カウンタ）
//!
//! - `VolumeSample` は可視化用の振幅値。購読者が消費するだけで永続化しない
//! - `SessionMetrics` は「黙って落とさない」ためのカウンタ群。
//!   フレーム破棄・デコード失敗・キャプチャ停滞はすべてここに現れます
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// 音量サンプルの発生源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeSource {
    Capture,
    Playback,
}

/// 可視化用の音量サンプル（0.0..=1.0）
#[derive(Debug, Clone, Copy)]
pub struct VolumeSample {
    pub value: f32,
    pub source: VolumeSource,
    pub at: Instant,
}

impl VolumeSample {
    pub fn now(value: f32, source: VolumeSource) -> Self {
        Self {
            value,
            source,
            at: Instant::now(),
        }
    }
}

/// セッション単位のカウンタ群（全てアトミック、複数タスクから加算）
#[derive(Debug, Default)]
pub struct SessionMetrics {
    frames_captured: AtomicU64,
    frames_sent: AtomicU64,
    frames_dropped: AtomicU64,
    capture_stalls: AtomicU64,
    decode_errors: AtomicU64,
    playback_rejected: AtomicU64,
}

impl SessionMetrics {
    pub fn record_frame_captured(&self) {
        self.frames_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// 送信経路でフレームを落とした（満杯キュー、未接続など）
    pub fn record_frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_capture_stall(&self) {
        self.capture_stalls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_playback_rejected(&self) {
        self.playback_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// 現在値のスナップショットを取得
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_captured: self.frames_captured.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            capture_stalls: self.capture_stalls.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            playback_rejected: self.playback_rejected.load(Ordering::Relaxed),
        }
    }
}

/// ある時点のカウンタ値
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_captured: u64,
    pub frames_sent: u64,
    pub frames_dropped: u64,
    pub capture_stalls: u64,
    pub decode_errors: u64,
    pub playback_rejected: u64,
}
