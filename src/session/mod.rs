//! セッションのライフサイクル制御
mod controller;
mod error;
mod state;

pub use controller::SessionController;
pub use error::SessionError;
pub use state::SessionState;
