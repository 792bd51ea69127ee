use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture device unavailable: {message}")]
    Unavailable { message: String },
    #[error("capture tick produced no frame")]
    Stalled,
    #[error("capture device closed")]
    Closed,
}
