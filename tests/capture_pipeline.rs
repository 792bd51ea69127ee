use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};

use voice_realtime_session::capture::{CaptureEvent, CapturePipeline, SyntheticCaptureDevice};

#[tokio::test(start_paused = true)]
async fn device_loss_with_a_full_queue_does_not_block_stop() {
    let device = SyntheticCaptureDevice::new(48_000, 4096).with_failure_at(2);
    let probe = device.probe();
    let (event_tx, mut event_rx) = mpsc::channel(1);
    let (volume_tx, _) = broadcast::channel(16);

    let pipeline = CapturePipeline::start(device, 16_000, event_tx, volume_tx, Arc::default())
        .await
        .expect("start");

    // 1ティック目のフレームでキューが満杯になり、2ティック目でデバイス喪失。
    // 誰も消費していなくても停止は完了しなければならない
    tokio::time::sleep(Duration::from_millis(300)).await;
    pipeline.stop().await;

    assert_eq!(probe.acquire_count(), 1);
    assert_eq!(probe.release_count(), 1);

    // 致命イベントは満杯キューに入らず、チャネル閉鎖として観測される
    assert!(matches!(event_rx.recv().await, Some(CaptureEvent::Frame(_))));
    assert!(event_rx.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn device_loss_surfaces_as_a_fatal_event_when_the_queue_has_room() {
    let device = SyntheticCaptureDevice::new(48_000, 4096).with_failure_at(2);
    let probe = device.probe();
    let (event_tx, mut event_rx) = mpsc::channel(8);
    let (volume_tx, _) = broadcast::channel(16);

    let _pipeline = CapturePipeline::start(device, 16_000, event_tx, volume_tx, Arc::default())
        .await
        .expect("start");

    assert!(matches!(event_rx.recv().await, Some(CaptureEvent::Frame(_))));
    assert!(matches!(event_rx.recv().await, Some(CaptureEvent::Fatal(_))));
    assert!(event_rx.recv().await.is_none());

    // 致命経路でもデバイスは解放されている
    assert_eq!(probe.release_count(), 1);
}
