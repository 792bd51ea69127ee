//! 音声入出力フォーマットの設定値
//!
//! トランスポート16kHz・再生24kHzはリモートサービスとの固定契約。
//! キャプチャレートはデバイス依存のヒントに過ぎません。
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AudioIoConfig {
    pub capture: CaptureFormat,
    pub transport: TransportFormat,
    pub playback: PlaybackFormat,
}

impl AudioIoConfig {
    /// キャプチャ1チャンクの実時間長（秒）
    pub fn capture_chunk_secs(&self) -> f64 {
        self.capture.chunk_samples as f64 / self.capture.sample_rate_hz as f64
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureFormat {
    pub sample_rate_hz: u32,
    pub chunk_samples: usize,
    /// コントローラへ渡すフレームキューの深さ。満杯時は縁で破棄（可観測）
    pub queue_frames: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransportFormat {
    pub sample_rate_hz: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackFormat {
    pub sample_rate_hz: u32,
    /// 再生キューに積める最大秒数。超過フレームは拒否して通知する
    pub max_queued_secs: f64,
}
