use thiserror::Error;

use crate::audio_pipeline::DecodeError;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("failed to decode inbound frame")]
    Decode(#[from] DecodeError),
    #[error("playback queue full: {queued_secs:.2}s already queued")]
    QueueOverflow { queued_secs: f64 },
    #[error("render sink unavailable: {message}")]
    SinkUnavailable { message: String },
    #[error("scheduler already stopped")]
    Stopped,
}
