//! リモートセッションの接続設定
//!
//! ボイスやシステム指示は接続時に一度だけ送る不透明なペイロードで、
//! このコアでは解釈しません。
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub voice: String,
    pub system_instruction: String,
    pub connect_timeout_ms: u64,
}
