//! 可視化用の音量メトリクス
/// 表示用ゲイン。会話音声の平均振幅はフルスケールの1/4程度に収まるため、
/// 4倍して 0..=1 に広げる。
const DISPLAY_GAIN: f32 = 4.0;

/// 平均絶対振幅を表示向けにスケールした値（0.0..=1.0）
pub fn display_volume(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum: f32 = samples.iter().map(|s| s.abs()).sum();
    let mean = sum / samples.len() as f32;
    (mean * DISPLAY_GAIN).clamp(0.0, 1.0)
}
