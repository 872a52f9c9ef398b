// SPDX-License-Identifier: GPL-3.0-only

//! Camera capture devices
//!
//! A [`CaptureDevice`] produces one encoded frame on demand and owns the
//! torch that sits next to its lens. Readiness (permissions, device nodes)
//! is checked when the device is constructed, never by the capture job.

pub mod file_source;
pub mod v4l2;

pub use file_source::FileSourceCamera;
pub use v4l2::V4l2Camera;

use crate::errors::DeviceError;
use crate::flash::TorchDriver;
use crate::pipelines::photo::{EncodedImage, EncodingFormat};
use async_trait::async_trait;
use std::sync::Arc;

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// One encoded frame as delivered by a capture device
#[derive(Debug, Clone)]
pub struct Frame {
    /// Encoded image bytes (shared, never copied through the pipeline)
    pub data: Arc<[u8]>,
    /// Encoding of `data`
    pub format: EncodingFormat,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Wall-clock capture time, used for the asset name
    pub captured_at: chrono::DateTime<chrono::Local>,
}

impl Frame {
    /// Wrap an encoded image captured just now
    pub fn from_encoded(encoded: EncodedImage) -> Self {
        Self {
            data: Arc::from(encoded.data.into_boxed_slice()),
            format: encoded.format,
            width: encoded.width,
            height: encoded.height,
            captured_at: chrono::Local::now(),
        }
    }

    /// Encoded size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A camera that can take a still photo and drive its torch
#[async_trait]
pub trait CaptureDevice: TorchDriver {
    /// Human-readable device name for logs
    fn name(&self) -> &str;

    /// Capture one encoded frame
    async fn capture_photo(&self) -> DeviceResult<Frame>;
}
