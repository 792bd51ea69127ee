use voice_realtime_session::audio_pipeline::{
    decode_transport_text, display_volume, encode_transport_text, float_to_pcm16, pcm16_to_float,
    BlockResampler, DecodeError,
};

fn ramp(len: usize) -> Vec<f32> {
    (0..len).map(|i| i as f32 / len as f32 * 2.0 - 1.0).collect()
}

fn pseudo_random_bytes(len: usize) -> Vec<u8> {
    let mut state = 0x2545_f491_4f6c_dd1d_u64;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            (state >> 56) as u8
        })
        .collect()
}

#[test]
fn pcm_round_trip_stays_within_quantization_error() {
    let input = ramp(4096);
    let bytes = float_to_pcm16(&input);
    let output = pcm16_to_float(&bytes).expect("decode");

    assert_eq!(output.len(), input.len());
    // 正側は 32767 倍エンコード + 切り捨てなので誤差は最大2量子化ステップ
    for (a, b) in input.iter().zip(output.iter()) {
        assert!((a - b).abs() <= 2.0 / 32768.0 + f32::EPSILON, "{a} vs {b}");
    }
}

#[test]
fn pcm_scaling_is_asymmetric_at_full_scale() {
    let bytes = float_to_pcm16(&[1.0, -1.0]);
    assert_eq!(bytes, vec![0xFF, 0x7F, 0x00, 0x80]); // 32767, -32768
}

#[test]
fn pcm_clamps_out_of_range_samples() {
    let bytes = float_to_pcm16(&[2.5, -3.0]);
    assert_eq!(bytes, float_to_pcm16(&[1.0, -1.0]));
}

#[test]
fn pcm_rejects_odd_byte_length() {
    let err = pcm16_to_float(&[0x00, 0x01, 0x02]).expect_err("odd length");
    match err {
        DecodeError::OddLength { len: 3 } => {}
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn transport_text_round_trip_is_exact() {
    for len in [0_usize, 1, 2, 3, 255, 256, 4096, 10_000] {
        let bytes = pseudo_random_bytes(len);
        let text = encode_transport_text(&bytes);
        let decoded = decode_transport_text(&text).expect("decode");
        assert_eq!(decoded, bytes, "length {len}");
    }
}

#[test]
fn transport_text_covers_all_byte_values() {
    let bytes: Vec<u8> = (0..=255).collect();
    let decoded = decode_transport_text(&encode_transport_text(&bytes)).expect("decode");
    assert_eq!(decoded, bytes);
}

#[test]
fn malformed_transport_text_is_an_error_not_a_panic() {
    let err = decode_transport_text("not//valid!!base64").expect_err("malformed");
    match err {
        DecodeError::InvalidText { .. } => {}
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn resample_identity_when_rates_match() {
    let input = ramp(480);
    for rate in [8_000, 16_000, 44_100, 48_000] {
        let resampler = BlockResampler::new(rate, rate);
        assert_eq!(resampler.resample(&input), input);
    }
}

#[test]
fn resample_output_length_matches_ratio() {
    let input = ramp(4096);
    for (input_rate, output_rate) in [
        (48_000_u32, 16_000_u32),
        (44_100, 16_000),
        (16_000, 24_000),
        (24_000, 48_000),
    ] {
        let resampler = BlockResampler::new(input_rate, output_rate);
        let output = resampler.resample(&input);
        let expected = (input.len() as f64 * output_rate as f64 / input_rate as f64).round();
        let delta = (output.len() as f64 - expected).abs();
        assert!(delta <= 1.0, "{input_rate}->{output_rate}: {}", output.len());
    }
}

#[test]
fn downsampling_preserves_a_constant_signal() {
    let input = vec![0.5_f32; 4800];
    let resampler = BlockResampler::new(48_000, 16_000);
    let output = resampler.resample(&input);

    assert_eq!(output.len(), 1600);
    for sample in output {
        assert!((sample - 0.5).abs() < 1e-6);
    }
}

#[test]
fn resample_of_empty_input_is_empty() {
    let resampler = BlockResampler::new(48_000, 16_000);
    assert!(resampler.resample(&[]).is_empty());
}

#[test]
fn display_volume_is_scaled_mean_magnitude() {
    assert_eq!(display_volume(&[]), 0.0);
    assert!((display_volume(&[0.1, -0.1, 0.1, -0.1]) - 0.4).abs() < 1e-6);
    // 大音量でも 1.0 を超えない
    assert_eq!(display_volume(&[1.0, -1.0]), 1.0);
}
