// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the capture job

mod common;

use common::{Call, Harness};
use intervalcam::errors::{CaptureError, DeviceError, StoreError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn test_silent_capture_persists_without_torch() {
    let harness = Harness::new();
    let job = harness.job();

    let asset = job.capture_silently().await.unwrap();

    assert_eq!(asset.path.to_str(), Some("/mock/IMG_1.jpg"));
    assert_eq!(
        harness.timeline.calls(),
        vec![(0, Call::Capture), (0, Call::Persist)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_countdown_finishes_before_frame_is_requested() {
    let harness = Harness::new();
    let job = harness.job();

    job.capture_with_countdown().await.unwrap();

    let calls = harness.timeline.calls();
    assert_eq!(calls.len(), 18);

    // 15 toggles + forced off, then capture and persist
    let capture_index = calls.iter().position(|(_, c)| *c == Call::Capture).unwrap();
    assert_eq!(capture_index, 16);
    assert_eq!(calls[15], (7000, Call::Torch(false)));
    assert_eq!(calls[16], (7000, Call::Capture));
    assert_eq!(calls[17], (7000, Call::Persist));
    assert!(!harness.flash_state.torch_on());
}

#[tokio::test(start_paused = true)]
async fn test_device_error_skips_store() {
    for countdown in [false, true] {
        let harness = Harness::new();
        harness.camera.fail(true);
        let job = harness.job();

        let result = if countdown {
            job.capture_with_countdown().await
        } else {
            job.capture_silently().await
        };

        assert!(matches!(
            result,
            Err(CaptureError::Device(DeviceError::CaptureFailed(_)))
        ));
        assert_eq!(harness.timeline.count(Call::Persist), 0);
        assert_eq!(harness.store.persisted(), 0);
    }
}

#[tokio::test(start_paused = true)]
async fn test_store_error_after_successful_capture() {
    for countdown in [false, true] {
        let harness = Harness::new();
        harness.store.fail(true);
        let job = harness.job();

        let result = if countdown {
            job.capture_with_countdown().await
        } else {
            job.capture_silently().await
        };

        assert_eq!(
            result,
            Err(CaptureError::Store(StoreError::WriteFailed("disk full".into())))
        );
        assert_eq!(harness.timeline.count(Call::Capture), 1);
        // Not retried
        assert_eq!(harness.timeline.count(Call::Persist), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_countdown_never_captures() {
    let harness = Harness::new();
    let job = harness.job();
    let cancel = CancellationToken::new();

    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5500)).await;
            cancel.cancel();
        })
    };

    let result = job.capture_with_countdown_until(&cancel).await;
    canceller.await.unwrap();

    assert_eq!(result, Err(CaptureError::Cancelled));
    assert_eq!(harness.timeline.count(Call::Capture), 0);
    assert_eq!(
        harness.timeline.calls().last(),
        Some(&(5500, Call::Torch(false)))
    );
    assert!(!harness.flash_state.torch_on());
}
