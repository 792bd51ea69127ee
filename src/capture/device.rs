//! キャプチャデバイス境界
//!
//! プラットフォームのマイク抽象を引き込む側の最小インタフェース。
//! デバイス選択はこのコアの責務ではなく、与えられた既定入力を消費するだけです。
use async_trait::async_trait;

use crate::audio_pipeline::AudioChunk;

use super::error::CaptureError;

/// ネイティブレートで固定長チャンクを届けるマイク抽象
///
/// ハンドルの所有者はキャプチャパイプラインただ一つ。`acquire` と `release`
/// は対で呼ばれ、`release` 後に `next_chunk` が呼ばれることはありません。
#[async_trait]
pub trait CaptureDevice: Send + 'static {
    /// デバイスのネイティブサンプルレート
    fn sample_rate_hz(&self) -> u32;

    /// デバイスを取得（権限拒否・使用中は `Unavailable`）
    async fn acquire(&mut self) -> Result<(), CaptureError>;

    /// 次のチャンクが揃うまで待つ
    ///
    /// `Stalled` はそのティックだけの欠落で、呼び出しを続けてよい。
    /// `Closed` / `Unavailable` はデバイス喪失で、以後呼んではならない。
    async fn next_chunk(&mut self) -> Result<AudioChunk, CaptureError>;

    /// デバイスを解放
    fn release(&mut self);
}
