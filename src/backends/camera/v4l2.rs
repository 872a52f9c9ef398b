// SPDX-License-Identifier: GPL-3.0-only

//! Direct V4L2 still capture
//!
//! Opens the device only for the duration of one capture, so the camera is
//! free (and its LED off) between ticks. MJPEG is requested first because
//! the frame can then be stored without re-encoding; YUYV devices are
//! converted and encoded with the configured photo encoder.

use super::{CaptureDevice, DeviceResult, Frame};
use crate::constants::v4l2 as timing;
use crate::errors::DeviceError;
use crate::flash::TorchDriver;
use crate::pipelines::photo::{EncodedImage, EncodingFormat, PhotoEncoder};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

/// Camera backed by a `/dev/videoN` node
pub struct V4l2Camera {
    device_path: PathBuf,
    name: String,
    width: u32,
    height: u32,
    encoder: PhotoEncoder,
    torch: Arc<dyn TorchDriver>,
}

impl V4l2Camera {
    /// Probe a V4L2 device node
    ///
    /// The device is opened once to confirm it exists and is accessible,
    /// then closed again until the first capture.
    pub fn open(
        device_path: &Path,
        encoder: PhotoEncoder,
        torch: Arc<dyn TorchDriver>,
    ) -> DeviceResult<Self> {
        let dev = Device::with_path(device_path).map_err(|e| {
            DeviceError::NotAvailable(format!(
                "Failed to open V4L2 device {}: {}",
                device_path.display(),
                e
            ))
        })?;

        let name = dev
            .query_caps()
            .map(|caps| caps.card)
            .unwrap_or_else(|_| device_path.display().to_string());

        info!(device = %device_path.display(), name = %name, "Using V4L2 camera");

        Ok(Self {
            device_path: device_path.to_path_buf(),
            name,
            width: timing::DEFAULT_WIDTH,
            height: timing::DEFAULT_HEIGHT,
            encoder,
            torch,
        })
    }
}

impl TorchDriver for V4l2Camera {
    fn set_torch(&self, on: bool) {
        self.torch.set_torch(on);
    }
}

#[async_trait]
impl CaptureDevice for V4l2Camera {
    fn name(&self) -> &str {
        &self.name
    }

    async fn capture_photo(&self) -> DeviceResult<Frame> {
        let device_path = self.device_path.clone();
        let (width, height) = (self.width, self.height);
        let encoder = self.encoder;

        let encoded =
            tokio::task::spawn_blocking(move || grab_still(&device_path, width, height, encoder))
                .await
                .map_err(|e| DeviceError::CaptureFailed(format!("Capture task error: {}", e)))??;

        Ok(Frame::from_encoded(encoded))
    }
}

/// Open the device, let exposure settle, and grab one frame
fn grab_still(
    device_path: &Path,
    width: u32,
    height: u32,
    encoder: PhotoEncoder,
) -> DeviceResult<EncodedImage> {
    let mjpg = v4l::FourCC::new(b"MJPG");
    let yuyv = v4l::FourCC::new(b"YUYV");

    let mut dev = Device::with_path(device_path).map_err(|e| {
        DeviceError::NotAvailable(format!(
            "Failed to open V4L2 device {}: {}",
            device_path.display(),
            e
        ))
    })?;

    let mut format = dev
        .format()
        .map_err(|e| DeviceError::CaptureFailed(format!("Failed to query format: {}", e)))?;
    format.width = width;
    format.height = height;
    format.fourcc = mjpg;

    let format = match dev.set_format(&format) {
        Ok(f) => f,
        Err(e) => {
            warn!(error = %e, "Could not set MJPEG format, using current device format");
            dev.format()
                .map_err(|e| DeviceError::CaptureFailed(format!("Failed to query format: {}", e)))?
        }
    };

    if format.fourcc != mjpg && format.fourcc != yuyv {
        return Err(DeviceError::CaptureFailed(format!(
            "Unsupported pixel format {:?}",
            format.fourcc
        )));
    }

    debug!(
        width = format.width,
        height = format.height,
        fourcc = ?format.fourcc,
        "V4L2 capture format"
    );

    let mut stream = MmapStream::with_buffers(&mut dev, Type::VideoCapture, timing::BUFFER_COUNT)
        .map_err(|e| {
            DeviceError::CaptureFailed(format!("Failed to create buffer stream: {}", e))
        })?;

    // Auto exposure and white balance need a few frames to converge
    for _ in 0..timing::WARMUP_FRAMES {
        stream
            .next()
            .map_err(|e| DeviceError::CaptureFailed(format!("Failed to dequeue frame: {}", e)))?;
    }

    let (buf, meta) = stream
        .next()
        .map_err(|e| DeviceError::CaptureFailed(format!("Failed to dequeue frame: {}", e)))?;
    let used = (meta.bytesused as usize).min(buf.len());
    let data = &buf[..used];

    if format.fourcc == mjpg {
        // Store the sensor's own JPEG when that is what was asked for
        if encoder.format() == EncodingFormat::Jpeg {
            return Ok(EncodedImage {
                data: data.to_vec(),
                format: EncodingFormat::Jpeg,
                width: format.width,
                height: format.height,
            });
        }
        let image = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
            .map_err(|e| DeviceError::CaptureFailed(format!("Corrupt MJPEG frame: {}", e)))?;
        return encoder.encode_sync(image.to_rgb8());
    }

    let rgb = yuyv_to_rgb(data, format.width, format.height);
    let image = image::RgbImage::from_raw(format.width, format.height, rgb).ok_or_else(|| {
        DeviceError::CaptureFailed(format!(
            "Short YUYV frame: {} bytes for {}x{}",
            used, format.width, format.height
        ))
    })?;
    encoder.encode_sync(image)
}

/// Convert YUYV (YUV 4:2:2) to packed RGB
///
/// YUYV format: Y0 U0 Y1 V0 - each 4-byte group encodes 2 pixels.
/// Uses BT.601 coefficients for YUV to RGB conversion.
pub fn yuyv_to_rgb(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);

    for chunk in data.chunks_exact(4) {
        let y0 = chunk[0] as f32;
        let u = chunk[1] as f32 - 128.0;
        let y1 = chunk[2] as f32;
        let v = chunk[3] as f32 - 128.0;

        for y in [y0, y1] {
            if rgb.len() >= pixel_count * 3 {
                break;
            }
            rgb.push((y + 1.402 * v).clamp(0.0, 255.0) as u8);
            rgb.push((y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8);
            rgb.push((y + 1.772 * u).clamp(0.0, 255.0) as u8);
        }
    }

    rgb
}
