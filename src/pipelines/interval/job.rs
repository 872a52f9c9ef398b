// SPDX-License-Identifier: GPL-3.0-only

//! One "take a picture" action
//!
//! ```text
//! [countdown] → capture_photo → persist
//! ```
//!
//! Failures are returned to the caller as they happen; nothing is retried
//! and a frame whose persist failed is dropped.

use super::countdown::{CountdownOutcome, CountdownSequencer};
use crate::backends::camera::CaptureDevice;
use crate::constants::COUNTDOWN_PROBABILITY;
use crate::errors::CaptureError;
use crate::flash::FlashState;
use crate::storage::{AssetRef, AssetStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Outcome of one capture job invocation
pub type CaptureResult = Result<AssetRef, CaptureError>;

/// Whether a capture is preceded by the flash countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Capture immediately
    Silent,
    /// Run the flash countdown first
    Countdown,
}

impl CaptureMode {
    /// Branch on a uniform sample in `[0, 1)`; the boundary is exclusive
    pub fn from_sample(sample: f64) -> Self {
        if sample < COUNTDOWN_PROBABILITY {
            CaptureMode::Countdown
        } else {
            CaptureMode::Silent
        }
    }
}

impl std::fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureMode::Silent => write!(f, "silent"),
            CaptureMode::Countdown => write!(f, "countdown"),
        }
    }
}

/// Captures a frame and hands it to the asset store
pub struct CaptureJob {
    device: Arc<dyn CaptureDevice>,
    store: Arc<dyn AssetStore>,
    sequencer: CountdownSequencer,
}

impl CaptureJob {
    pub fn new(
        device: Arc<dyn CaptureDevice>,
        store: Arc<dyn AssetStore>,
        flash_state: FlashState,
    ) -> Self {
        Self {
            device,
            store,
            sequencer: CountdownSequencer::new(flash_state),
        }
    }

    /// Torch state driven by this job's countdowns
    pub fn flash_state(&self) -> &FlashState {
        self.sequencer.flash_state()
    }

    /// Run the job in the given mode
    pub async fn run(&self, mode: CaptureMode) -> CaptureResult {
        match mode {
            CaptureMode::Silent => self.capture_silently().await,
            CaptureMode::Countdown => self.capture_with_countdown().await,
        }
    }

    /// Run the job in the given mode, abortable during a countdown
    pub async fn run_until(&self, mode: CaptureMode, cancel: &CancellationToken) -> CaptureResult {
        match mode {
            CaptureMode::Silent => self.capture_silently().await,
            CaptureMode::Countdown => self.capture_with_countdown_until(cancel).await,
        }
    }

    /// Capture and persist without any flash signal
    pub async fn capture_silently(&self) -> CaptureResult {
        let frame = self.device.capture_photo().await.map_err(|e| {
            error!(device = self.device.name(), error = %e, "Capture failed");
            CaptureError::Device(e)
        })?;

        let asset = self.store.persist(frame).await.map_err(|e| {
            error!(error = %e, "Failed to persist captured photo");
            CaptureError::Store(e)
        })?;

        info!(path = %asset.path.display(), "Photo captured");
        Ok(asset)
    }

    /// Run the full countdown, then capture and persist
    pub async fn capture_with_countdown(&self) -> CaptureResult {
        self.sequencer.run(self.device.as_ref()).await;
        self.capture_silently().await
    }

    /// Like [`Self::capture_with_countdown`], but abortable during the countdown
    ///
    /// Once the countdown has completed the capture is no longer cancellable.
    pub async fn capture_with_countdown_until(&self, cancel: &CancellationToken) -> CaptureResult {
        match self
            .sequencer
            .run_until_cancelled(self.device.as_ref(), cancel)
            .await
        {
            CountdownOutcome::Completed => self.capture_silently().await,
            CountdownOutcome::Cancelled => Err(CaptureError::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_boundary_is_exclusive() {
        assert_eq!(
            CaptureMode::from_sample(COUNTDOWN_PROBABILITY - f64::EPSILON),
            CaptureMode::Countdown
        );
        assert_eq!(
            CaptureMode::from_sample(COUNTDOWN_PROBABILITY),
            CaptureMode::Silent
        );
        assert_eq!(CaptureMode::from_sample(0.0), CaptureMode::Countdown);
        assert_eq!(CaptureMode::from_sample(0.999), CaptureMode::Silent);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(CaptureMode::Silent.to_string(), "silent");
        assert_eq!(CaptureMode::Countdown.to_string(), "countdown");
    }
}
