//! 音声変換パイプラインの純粋関数群
//!
//! - PCM16 ⇔ f32 の相互変換（リモートサービスとの固定フォーマット契約）
//! - バイナリ⇔テキストのトランスポート符号化（base64）
//! - ブロック平均によるリサンプル
//! - 可視化用の音量メトリクス
//!
//! どれも状態を持たず、副作用もありません。
mod error;
mod pcm;
mod resampler;
mod transport_text;
mod volume;

pub use error::DecodeError;
pub use pcm::{float_to_pcm16, pcm16_to_float};
pub use resampler::BlockResampler;
pub use transport_text::{decode_transport_text, encode_transport_text};
pub use volume::display_volume;

/// キャプチャ1チャンク分の音声（モノラル、-1.0..=1.0）
///
/// デバイスのネイティブレートで生成され、以後変更されません。
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub samples: Vec<f32>,
    pub sample_rate_hz: u32,
}

impl AudioChunk {
    pub fn new(samples: Vec<f32>, sample_rate_hz: u32) -> Self {
        Self {
            samples,
            sample_rate_hz,
        }
    }

    /// チャンクの実時間長（秒）
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate_hz as f64
    }
}
