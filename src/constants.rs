// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants
//!
//! Capture policy values are fixed; only the tick interval is user-facing.

use std::time::Duration;

/// Probability that a tick runs the flash countdown before capturing (1 in 15)
pub const COUNTDOWN_PROBABILITY: f64 = 1.0 / 15.0;

/// Milliseconds per minute, for converting the user-entered interval
pub const MS_PER_MINUTE: f64 = 60_000.0;

/// Default tick interval in minutes
pub const DEFAULT_INTERVAL_MINUTES: f64 = 2.0;

/// Capacity of the scheduler event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// One run of torch toggles at a fixed spacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownPhase {
    /// Number of torch toggles in this phase
    pub toggle_count: u32,
    /// Pause after each toggle, in milliseconds
    pub toggle_interval_ms: u64,
}

impl CountdownPhase {
    /// Pause after each toggle
    pub const fn toggle_interval(&self) -> Duration {
        Duration::from_millis(self.toggle_interval_ms)
    }

    /// Wall-clock length of the whole phase
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.toggle_interval_ms * self.toggle_count as u64)
    }
}

/// Countdown flash pattern: slow 1 Hz blink, then fast 5 Hz blink
pub mod countdown {
    use super::CountdownPhase;

    /// ~1 Hz blinking over ~5 seconds
    pub const SLOW_PHASE: CountdownPhase = CountdownPhase {
        toggle_count: 5,
        toggle_interval_ms: 1000,
    };

    /// ~5 Hz blinking over ~2 seconds
    pub const FAST_PHASE: CountdownPhase = CountdownPhase {
        toggle_count: 10,
        toggle_interval_ms: 200,
    };

    /// Phases in the order they run
    pub const PHASES: [CountdownPhase; 2] = [SLOW_PHASE, FAST_PHASE];
}

/// V4L2 capture timing
pub mod v4l2 {
    /// Frames thrown away while auto exposure settles
    pub const WARMUP_FRAMES: usize = 5;

    /// Number of mmap buffers requested from the driver
    pub const BUFFER_COUNT: u32 = 4;

    /// Default frame size requested when opening the device
    pub const DEFAULT_WIDTH: u32 = 1920;
    pub const DEFAULT_HEIGHT: u32 = 1080;
}

/// Supported file formats for the file source camera
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}
