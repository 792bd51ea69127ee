//! 受信音声の復号と隙間なし再生スケジューリング
mod error;
mod memory_sink;
mod scheduler;
mod sink;

pub use error::PlaybackError;
pub use memory_sink::{MemorySink, ScheduledBuffer, SinkProbe};
pub use scheduler::{PlaybackItem, PlaybackScheduler};
pub use sink::{RenderSink, SinkItemId};
