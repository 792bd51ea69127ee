//! ブロック平均による単純なリサンプラ
//!
//! アンチエイリアスフィルタを持たない意図的に簡素なアルゴリズムです。
//! 会話音声の帯域では実用上問題にならない忠実度のトレードオフであり、
//! バグではありません。
#[derive(Debug, Clone)]
pub struct BlockResampler {
    input_rate: u32,
    output_rate: u32,
}

impl BlockResampler {
    /// 入出力サンプルレートを指定して作成（任意のレート対に対応）
    pub fn new(input_rate: u32, output_rate: u32) -> Self {
        Self {
            input_rate,
            output_rate,
        }
    }

    /// ブロック平均でリサンプル
    ///
    /// 出力インデックス i に対応する入力窓 [round(i*ratio), round((i+1)*ratio))
    /// の算術平均を出力します。窓が空なら 0.0。決定的で副作用なし。
    pub fn resample(&self, samples: &[f32]) -> Vec<f32> {
        if self.input_rate == self.output_rate || samples.is_empty() {
            return samples.to_vec();
        }

        let ratio = self.input_rate as f64 / self.output_rate as f64;
        let output_len = (samples.len() as f64 / ratio).round() as usize;
        if output_len == 0 {
            return Vec::new();
        }

        let mut output = Vec::with_capacity(output_len);
        for i in 0..output_len {
            let begin = ((i as f64 * ratio).round() as usize).min(samples.len());
            let end = (((i + 1) as f64 * ratio).round() as usize).min(samples.len());
            if begin >= end {
                output.push(0.0);
                continue;
            }

            let window = &samples[begin..end];
            let sum: f32 = window.iter().sum();
            output.push(sum / window.len() as f32);
        }
        output
    }
}
