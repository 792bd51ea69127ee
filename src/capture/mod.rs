//! マイクキャプチャ（デバイス境界とパイプライン）
mod device;
mod error;
mod pipeline;
mod synthetic;

pub use device::CaptureDevice;
pub use error::CaptureError;
pub use pipeline::{CaptureEvent, CapturePipeline};
pub use synthetic::{CaptureProbe, SyntheticCaptureDevice};
