//! リモートストリーミング音声セッションとの双方向トランスポート
//!
//! `connect()` はハンドシェイク完了（または失敗）まで中断し、成功時のみ
//! `TransportSession` を返します。セッションが存在しない限り送信口も
//! 存在しないため、「接続前の send」は型レベルで起こらず、`close()` 後の
//! 送信だけが `NotConnected` として現れます。
mod error;
mod loopback;
mod session;
mod wire;

use async_trait::async_trait;

use crate::config::SessionConfig;

pub use error::TransportError;
pub use loopback::{LoopbackPeer, LoopbackTransport};
pub use session::{TransportEvent, TransportSession};
pub use wire::{ClientMessage, ServerMessage, TransportFrame};

#[async_trait]
pub trait VoiceTransport: Send + Sync {
    /// ハンドシェイク完了まで中断し、双方向セッションを確立する
    async fn connect(&self, config: &SessionConfig) -> Result<TransportSession, TransportError>;
}
