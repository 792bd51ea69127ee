//! リモートセッションとのワイヤ形式（JSONテキストフレーム）
//!
//! 音声ペイロードは base64 済みの PCM16 モノラル。エンベロープは符号化と
//! サンプルレートをメタデータとして明示し、受信側に推測させません。
use serde::{Deserialize, Serialize};

/// 双方向で交換する音声フレーム
///
/// `data` はトランスポート符号化済み（base64）のままで、復号は
/// 再生スケジューラ側の責務です。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFrame {
    pub data: String,
    pub mime_type: String,
}

impl TransportFrame {
    /// PCM16モノラルのフレームを組み立て
    pub fn pcm(data: String, sample_rate_hz: u32) -> Self {
        Self {
            data,
            mime_type: format!("audio/pcm;rate={sample_rate_hz}"),
        }
    }
}

/// クライアント→サービスのメッセージ
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Setup {
        voice: String,
        system_instruction: String,
        output_sample_rate_hz: u32,
    },
    #[serde(rename_all = "camelCase")]
    Audio { data: String, mime_type: String },
    Close,
}

/// サービス→クライアントのメッセージ
///
/// 音声以外の未知の種別は `Other` として無視されます（このコアの対象外）。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    Audio { data: String, mime_type: String },
    #[serde(rename_all = "camelCase")]
    Closed {
        #[serde(default)]
        reason: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Error { message: String },
    #[serde(other)]
    Other,
}
