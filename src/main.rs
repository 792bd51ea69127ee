use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use voice_realtime_session::audio_pipeline::{
    decode_transport_text, encode_transport_text, float_to_pcm16, pcm16_to_float, BlockResampler,
};
use voice_realtime_session::capture::SyntheticCaptureDevice;
use voice_realtime_session::config::ConfigSet;
use voice_realtime_session::playback::MemorySink;
use voice_realtime_session::transport::{
    ClientMessage, LoopbackPeer, LoopbackTransport, ServerMessage,
};
use voice_realtime_session::SessionController;

#[tokio::main]
async fn main() {
    init_tracing();

    match ConfigSet::load_from_env() {
        Ok(config) => {
            let config = Arc::new(config);
            info!(root = ?config.root(), "configuration loaded");

            let transport = Arc::new(LoopbackTransport::new().with_handshake_delay(
                Duration::from_millis(50),
            ));
            let device = SyntheticCaptureDevice::new(
                config.audio.capture.sample_rate_hz,
                config.audio.capture.chunk_samples,
            );
            let sink = MemorySink::new();
            let sink_probe = sink.probe();

            let controller =
                SessionController::new(config.as_ref().clone(), transport.clone(), device, sink);
            let mut volume_rx = controller.subscribe_volume();

            if let Err(e) = controller.start().await {
                error!(error = %e, "failed to start voice session");
                std::process::exit(1);
            }
            info!(state = %controller.state(), "session started");

            // ループバックのピア側でリモートサービスを演じる:
            // 受けた16kHzフレームを24kHzへ変換して送り返す
            let peer = transport.take_peer();
            let echo = peer.map(|peer| tokio::spawn(echo_as_remote(peer)));

            let telemetry = tokio::spawn(async move {
                while let Ok(sample) = volume_rx.recv().await {
                    info!(
                        source = ?sample.source,
                        value = format!("{:.3}", sample.value),
                        "volume"
                    );
                }
            });

            tokio::time::sleep(Duration::from_secs(2)).await;
            controller.stop().await;
            telemetry.abort();
            if let Some(echo) = echo {
                echo.abort();
            }

            let metrics = controller.metrics();
            info!(
                state = %controller.state(),
                frames_captured = metrics.frames_captured,
                frames_sent = metrics.frames_sent,
                frames_dropped = metrics.frames_dropped,
                buffers_scheduled = sink_probe.scheduled().len(),
                "session finished"
            );
        }
        Err(err) => {
            error!(error = ?err, "failed to load configuration");
            std::process::exit(1);
        }
    }
}

/// リモートサービス役: 受信音声を24kHzに変換してそのまま返す
async fn echo_as_remote(mut peer: LoopbackPeer) {
    let resampler = BlockResampler::new(16_000, 24_000);
    while let Some(message) = peer.next_audio().await {
        let ClientMessage::Audio { data, .. } = message else {
            continue;
        };
        let Ok(bytes) = decode_transport_text(&data) else {
            continue;
        };
        let Ok(samples) = pcm16_to_float(&bytes) else {
            continue;
        };
        let upsampled = resampler.resample(&samples);
        let reply = ServerMessage::Audio {
            data: encode_transport_text(&float_to_pcm16(&upsampled)),
            mime_type: "audio/pcm;rate=24000".to_string(),
        };
        peer.inject(&reply).await;
    }
}

fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install tracing subscriber: {err}");
    }
}
