use voice_realtime_session::config::{ConfigError, ConfigSet};

#[test]
fn loads_the_bundled_configuration_directory() {
    let config = ConfigSet::load_from_dir("config").expect("config");
    assert_eq!(config.audio.capture.sample_rate_hz, 48_000);
    assert_eq!(config.audio.transport.sample_rate_hz, 16_000);
    assert_eq!(config.audio.playback.sample_rate_hz, 24_000);
    assert!(config.audio.playback.max_queued_secs > 0.0);
    assert!(!config.session.voice.is_empty());
}

#[test]
fn missing_root_names_the_expected_files() {
    let err = ConfigSet::load_from_dir("no_such_config_dir").expect_err("missing root");
    assert!(matches!(err, ConfigError::MissingRoot(_)));

    let message = err.to_string();
    assert!(message.contains("audio_io.yaml"), "{message}");
    assert!(message.contains("session.yaml"), "{message}");
}
