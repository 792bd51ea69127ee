pub mod audio_pipeline;
pub mod capture;
pub mod config;
pub mod playback;
pub mod session;
pub mod telemetry;
pub mod transport;

pub use config::ConfigSet;
pub use session::{SessionController, SessionError, SessionState};
