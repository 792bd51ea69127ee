//! トランスポートがテキストフレームしか受け付けないための base64 符号化
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::error::DecodeError;

/// バイト列をテキスト安全な形式へ符号化
pub fn encode_transport_text(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// テキスト形式をバイト列へ復元（全バイト値で往復が厳密に一致）
pub fn decode_transport_text(text: &str) -> Result<Vec<u8>, DecodeError> {
    STANDARD
        .decode(text)
        .map_err(|source| DecodeError::InvalidText { source })
}
