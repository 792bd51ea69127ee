//! 合成キャプチャデバイス（テスト・デモ用）
//!
//! 実マイクの代わりに正弦波チャンクを一定周期で生成します。取得/解放の
//! 回数をプローブに記録するため、リソース収支の検証にも使えます。
use std::f32::consts::TAU;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::audio_pipeline::AudioChunk;

use super::device::CaptureDevice;
use super::error::CaptureError;

/// 取得/解放の回数を外から観測するためのプローブ
#[derive(Debug, Default)]
pub struct CaptureProbe {
    acquired: AtomicU32,
    released: AtomicU32,
}

impl CaptureProbe {
    pub fn acquire_count(&self) -> u32 {
        self.acquired.load(Ordering::Acquire)
    }

    pub fn release_count(&self) -> u32 {
        self.released.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct SyntheticCaptureDevice {
    sample_rate_hz: u32,
    chunk_samples: usize,
    tone_hz: f32,
    phase: f32,
    ticker: Option<Interval>,
    chunk_limit: Option<usize>,
    stall_at: Option<usize>,
    fail_at: Option<usize>,
    produced: usize,
    fail_acquire: bool,
    probe: Arc<CaptureProbe>,
}

impl SyntheticCaptureDevice {
    pub fn new(sample_rate_hz: u32, chunk_samples: usize) -> Self {
        Self {
            sample_rate_hz,
            chunk_samples,
            tone_hz: 440.0,
            phase: 0.0,
            ticker: None,
            chunk_limit: None,
            stall_at: None,
            fail_at: None,
            produced: 0,
            fail_acquire: false,
            probe: Arc::new(CaptureProbe::default()),
        }
    }

    /// 生成チャンク数に上限を設ける。到達後 `next_chunk` は完了しない
    pub fn with_chunk_limit(mut self, limit: usize) -> Self {
        self.chunk_limit = Some(limit);
        self
    }

    /// n番目のティックを一度だけ停滞させる
    pub fn with_stall_at(mut self, tick: usize) -> Self {
        self.stall_at = Some(tick);
        self
    }

    /// n番目のティックでデバイス喪失を起こす
    pub fn with_failure_at(mut self, tick: usize) -> Self {
        self.fail_at = Some(tick);
        self
    }

    /// `acquire` を失敗させる（マイク権限拒否の模擬）
    pub fn with_failing_acquire(mut self) -> Self {
        self.fail_acquire = true;
        self
    }

    pub fn probe(&self) -> Arc<CaptureProbe> {
        self.probe.clone()
    }

    fn chunk_duration(&self) -> Duration {
        Duration::from_secs_f64(self.chunk_samples as f64 / self.sample_rate_hz as f64)
    }

    fn synthesize(&mut self) -> Vec<f32> {
        let step = TAU * self.tone_hz / self.sample_rate_hz as f32;
        let mut samples = Vec::with_capacity(self.chunk_samples);
        for _ in 0..self.chunk_samples {
            samples.push(self.phase.sin() * 0.3);
            self.phase = (self.phase + step) % TAU;
        }
        samples
    }
}

#[async_trait]
impl CaptureDevice for SyntheticCaptureDevice {
    fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    async fn acquire(&mut self) -> Result<(), CaptureError> {
        if self.fail_acquire {
            return Err(CaptureError::Unavailable {
                message: "microphone permission denied".to_string(),
            });
        }

        let mut ticker = interval(self.chunk_duration());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
        self.probe.acquired.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    async fn next_chunk(&mut self) -> Result<AudioChunk, CaptureError> {
        let ticker = self.ticker.as_mut().ok_or(CaptureError::Closed)?;

        if let Some(limit) = self.chunk_limit {
            if self.produced >= limit {
                // 上限到達後は沈黙する（停止されるまで待つだけ）
                std::future::pending::<()>().await;
            }
        }

        ticker.tick().await;
        self.produced += 1;

        if self.fail_at == Some(self.produced) {
            return Err(CaptureError::Closed);
        }

        if self.stall_at == Some(self.produced) {
            self.stall_at = None;
            return Err(CaptureError::Stalled);
        }

        let samples = self.synthesize();
        Ok(AudioChunk::new(samples, self.sample_rate_hz))
    }

    fn release(&mut self) {
        if self.ticker.take().is_some() {
            self.probe.released.fetch_add(1, Ordering::AcqRel);
        }
    }
}
