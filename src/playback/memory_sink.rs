//! 記録型のインメモリシンク（テスト・デモ用）
//!
//! 実スピーカの代わりにスケジュール・キャンセル・取得/解放をすべて記録し、
//! 仮想時間と相性のよい tokio クロックで `now()` を刻みます。
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::Instant;

use super::error::PlaybackError;
use super::sink::{RenderSink, SinkItemId};

/// 記録されたスケジュール1件
#[derive(Debug, Clone)]
pub struct ScheduledBuffer {
    pub item: SinkItemId,
    pub start_secs: f64,
    pub duration_secs: f64,
    pub sample_rate_hz: u32,
}

#[derive(Debug)]
struct SinkShared {
    epoch: Instant,
    next_item: AtomicU64,
    acquired: AtomicU32,
    released: AtomicU32,
    scheduled: Mutex<Vec<ScheduledBuffer>>,
    cancelled: Mutex<Vec<SinkItemId>>,
}

/// シンクの記録内容を外から観測するハンドル
#[derive(Debug, Clone)]
pub struct SinkProbe {
    shared: Arc<SinkShared>,
}

impl SinkProbe {
    pub fn acquire_count(&self) -> u32 {
        self.shared.acquired.load(Ordering::Acquire)
    }

    pub fn release_count(&self) -> u32 {
        self.shared.released.load(Ordering::Acquire)
    }

    pub fn scheduled(&self) -> Vec<ScheduledBuffer> {
        self.shared.scheduled.lock().clone()
    }

    pub fn cancelled(&self) -> Vec<SinkItemId> {
        self.shared.cancelled.lock().clone()
    }
}

#[derive(Debug)]
pub struct MemorySink {
    shared: Arc<SinkShared>,
    fail_acquire: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(SinkShared {
                epoch: Instant::now(),
                next_item: AtomicU64::new(1),
                acquired: AtomicU32::new(0),
                released: AtomicU32::new(0),
                scheduled: Mutex::new(Vec::new()),
                cancelled: Mutex::new(Vec::new()),
            }),
            fail_acquire: false,
        }
    }

    /// `acquire` を失敗させる（出力デバイス使用中の模擬）
    pub fn with_failing_acquire(mut self) -> Self {
        self.fail_acquire = true;
        self
    }

    pub fn probe(&self) -> SinkProbe {
        SinkProbe {
            shared: self.shared.clone(),
        }
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSink for MemorySink {
    fn acquire(&self) -> Result<(), PlaybackError> {
        if self.fail_acquire {
            return Err(PlaybackError::SinkUnavailable {
                message: "output device busy".to_string(),
            });
        }
        self.shared.acquired.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn now(&self) -> f64 {
        self.shared.epoch.elapsed().as_secs_f64()
    }

    fn schedule(
        &self,
        samples: Vec<f32>,
        sample_rate_hz: u32,
        start_secs: f64,
    ) -> Result<SinkItemId, PlaybackError> {
        let item = self.shared.next_item.fetch_add(1, Ordering::AcqRel);
        self.shared.scheduled.lock().push(ScheduledBuffer {
            item,
            start_secs,
            duration_secs: samples.len() as f64 / sample_rate_hz as f64,
            sample_rate_hz,
        });
        Ok(item)
    }

    fn cancel(&self, item: SinkItemId) {
        self.shared.cancelled.lock().push(item);
    }

    fn release(&self) {
        self.shared.released.fetch_add(1, Ordering::AcqRel);
    }
}
