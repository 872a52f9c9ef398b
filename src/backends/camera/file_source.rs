// SPDX-License-Identifier: GPL-3.0-only

//! Still image file used as a camera sensor
//!
//! Every capture re-reads the file, so swapping the image on disk between
//! ticks changes what gets stored. Useful for headless setups and testing.

use super::{CaptureDevice, DeviceResult, Frame};
use crate::constants::file_formats;
use crate::errors::DeviceError;
use crate::flash::TorchDriver;
use crate::pipelines::photo::PhotoEncoder;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Camera that "captures" by loading an image file
pub struct FileSourceCamera {
    path: PathBuf,
    name: String,
    encoder: PhotoEncoder,
    torch: Arc<dyn TorchDriver>,
}

impl FileSourceCamera {
    /// Open an image file source
    ///
    /// Fails if the file is missing or not a supported image type.
    pub fn open(
        path: &Path,
        encoder: PhotoEncoder,
        torch: Arc<dyn TorchDriver>,
    ) -> DeviceResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !file_formats::is_image_extension(&extension) {
            return Err(DeviceError::NotAvailable(format!(
                "Unsupported file format: '{}'",
                extension
            )));
        }

        if !path.is_file() {
            return Err(DeviceError::NotAvailable(format!(
                "Image file not found: {}",
                path.display()
            )));
        }

        info!(path = %path.display(), "Using image file as camera source");

        Ok(Self {
            path: path.to_path_buf(),
            name: format!("file:{}", path.display()),
            encoder,
            torch,
        })
    }
}

impl TorchDriver for FileSourceCamera {
    fn set_torch(&self, on: bool) {
        self.torch.set_torch(on);
    }
}

#[async_trait]
impl CaptureDevice for FileSourceCamera {
    fn name(&self) -> &str {
        &self.name
    }

    async fn capture_photo(&self) -> DeviceResult<Frame> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            DeviceError::CaptureFailed(format!("Failed to read '{}': {}", self.path.display(), e))
        })?;

        let encoder = self.encoder;
        let encoded = tokio::task::spawn_blocking(move || {
            let image = image::load_from_memory(&bytes)
                .map_err(|e| DeviceError::CaptureFailed(format!("Failed to decode image: {}", e)))?;
            encoder.encode_sync(image.to_rgb8())
        })
        .await
        .map_err(|e| DeviceError::CaptureFailed(format!("Capture task error: {}", e)))??;

        debug!(
            width = encoded.width,
            height = encoded.height,
            size = encoded.data.len(),
            "Frame loaded from file"
        );

        Ok(Frame::from_encoded(encoded))
    }
}
