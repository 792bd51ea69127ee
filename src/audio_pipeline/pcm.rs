//! f32 ⇔ PCM16(S16LE) の相互変換
use super::error::DecodeError;

/// f32サンプル列をPCM16(リトルエンディアン)へ変換
///
/// 各サンプルは [-1.0, 1.0] にクランプし、非負は 32767 倍・負は 32768 倍で
/// スケールして i16 に切り捨てます。
pub fn float_to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        let scaled = if clamped >= 0.0 {
            clamped * 32767.0
        } else {
            clamped * 32768.0
        };
        let value = scaled as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// PCM16(リトルエンディアン)をf32サンプル列へ変換
///
/// 奇数バイト長はフレーム破損とみなしエラーを返します（パニックしない）。
pub fn pcm16_to_float(bytes: &[u8]) -> Result<Vec<f32>, DecodeError> {
    if bytes.len() % 2 != 0 {
        return Err(DecodeError::OddLength { len: bytes.len() });
    }

    let mut samples = Vec::with_capacity(bytes.len() / 2);
    for pair in bytes.chunks_exact(2) {
        let value = i16::from_le_bytes([pair[0], pair[1]]);
        samples.push(value as f32 / 32768.0);
    }
    Ok(samples)
}
