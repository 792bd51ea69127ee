//! レンダーシンク境界
//!
//! 再生クロック上の開始時刻付きでサンプルバッファを受け取るプラットフォーム
//! 出力の抽象。シンクハンドルの所有者は再生スケジューラただ一つです。
use super::error::PlaybackError;

/// シンク側でスケジュール済みバッファを指すID
pub type SinkItemId = u64;

pub trait RenderSink: Send + Sync + 'static {
    /// 出力を取得（デバイス使用中などは `SinkUnavailable`）
    fn acquire(&self) -> Result<(), PlaybackError>;

    /// 再生クロックの現在時刻（秒）
    fn now(&self) -> f64;

    /// `start_secs` から再生するバッファを登録
    fn schedule(
        &self,
        samples: Vec<f32>,
        sample_rate_hz: u32,
        start_secs: f64,
    ) -> Result<SinkItemId, PlaybackError>;

    /// 登録済みバッファを即座に停止・破棄
    fn cancel(&self, item: SinkItemId);

    /// 出力を解放
    fn release(&self);
}
