// SPDX-License-Identifier: GPL-3.0-only

//! Test doubles shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use intervalcam::backends::camera::{CaptureDevice, DeviceResult, Frame};
use intervalcam::errors::{DeviceError, StoreError};
use intervalcam::flash::{FlashState, TorchDriver};
use intervalcam::pipelines::interval::CaptureJob;
use intervalcam::pipelines::photo::EncodingFormat;
use intervalcam::storage::{AssetRef, AssetStore};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Something a collaborator was asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Torch(bool),
    Capture,
    Persist,
}

/// Ordered log of collaborator calls, stamped with virtual-clock offsets
pub struct Timeline {
    start: Instant,
    calls: Mutex<Vec<(u64, Call)>>,
}

impl Timeline {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            start: Instant::now(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn record(&self, call: Call) {
        let at = self.start.elapsed().as_millis() as u64;
        self.calls.lock().unwrap().push((at, call));
    }

    /// All calls as (milliseconds since start, call)
    pub fn calls(&self) -> Vec<(u64, Call)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls().iter().filter(|(_, c)| *c == call).count()
    }

    pub fn torch_writes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|(_, c)| matches!(c, Call::Torch(_)))
            .count()
    }

    /// Offsets of every capture request
    pub fn capture_times(&self) -> Vec<u64> {
        self.calls()
            .iter()
            .filter(|(_, c)| *c == Call::Capture)
            .map(|(at, _)| *at)
            .collect()
    }
}

pub struct MockCamera {
    timeline: Arc<Timeline>,
    fail: AtomicBool,
    capture_delay: Mutex<Duration>,
}

impl MockCamera {
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Make each capture take this long on the virtual clock
    pub fn set_capture_delay(&self, delay: Duration) {
        *self.capture_delay.lock().unwrap() = delay;
    }
}

impl TorchDriver for MockCamera {
    fn set_torch(&self, on: bool) {
        self.timeline.record(Call::Torch(on));
    }
}

#[async_trait]
impl CaptureDevice for MockCamera {
    fn name(&self) -> &str {
        "mock"
    }

    async fn capture_photo(&self) -> DeviceResult<Frame> {
        self.timeline.record(Call::Capture);

        let delay = *self.capture_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(DeviceError::CaptureFailed("mock sensor failure".into()));
        }

        Ok(Frame {
            data: Arc::from(vec![0xFFu8, 0xD8, 0xFF, 0xD9].into_boxed_slice()),
            format: EncodingFormat::Jpeg,
            width: 1,
            height: 1,
            captured_at: chrono::Local::now(),
        })
    }
}

pub struct MockStore {
    timeline: Arc<Timeline>,
    fail: AtomicBool,
    persisted: AtomicUsize,
}

impl MockStore {
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn persisted(&self) -> usize {
        self.persisted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetStore for MockStore {
    async fn persist(&self, frame: Frame) -> Result<AssetRef, StoreError> {
        self.timeline.record(Call::Persist);

        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed("disk full".into()));
        }

        let n = self.persisted.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(AssetRef {
            path: PathBuf::from(format!("/mock/IMG_{}.jpg", n)),
            size: frame.len(),
        })
    }
}

/// Camera, store and a job wired to them, all logging to one timeline
pub struct Harness {
    pub timeline: Arc<Timeline>,
    pub camera: Arc<MockCamera>,
    pub store: Arc<MockStore>,
    pub flash_state: FlashState,
}

impl Harness {
    pub fn new() -> Self {
        let timeline = Timeline::new();
        Self {
            camera: Arc::new(MockCamera {
                timeline: timeline.clone(),
                fail: AtomicBool::new(false),
                capture_delay: Mutex::new(Duration::ZERO),
            }),
            store: Arc::new(MockStore {
                timeline: timeline.clone(),
                fail: AtomicBool::new(false),
                persisted: AtomicUsize::new(0),
            }),
            flash_state: FlashState::new(),
            timeline,
        }
    }

    pub fn job(&self) -> CaptureJob {
        CaptureJob::new(
            self.camera.clone(),
            self.store.clone(),
            self.flash_state.clone(),
        )
    }
}
