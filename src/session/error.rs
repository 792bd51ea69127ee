use thiserror::Error;

use crate::capture::CaptureError;
use crate::playback::PlaybackError;
use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session already started")]
    AlreadyStarted,
    #[error("session stopped before startup completed")]
    Stopped,
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("playback error: {0}")]
    Playback(#[from] PlaybackError),
}
