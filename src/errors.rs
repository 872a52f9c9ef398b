// SPDX-License-Identifier: MPL-2.0

//! Error types for the interval camera

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Scheduler lifecycle errors
    Scheduler(SchedulerError),
    /// Capture job errors
    Capture(CaptureError),
    /// Configuration errors
    Config(ConfigError),
    /// Generic error with message
    Other(String),
}

/// Scheduler lifecycle errors
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerError {
    /// Interval is not a finite number of minutes greater than zero
    InvalidInterval(String),
    /// `start` was called while the timer is already armed
    AlreadyRunning,
    /// A capture job is already in flight
    Busy,
}

/// Camera device errors
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// Device could not be opened
    NotAvailable(String),
    /// Device did not deliver a frame
    CaptureFailed(String),
    /// Frame could not be encoded
    EncodingFailed(String),
}

/// Asset store errors
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Target directory could not be created
    DirectoryUnavailable(String),
    /// Frame could not be written
    WriteFailed(String),
}

/// Failure of one capture job invocation
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// The camera failed; the store was never contacted
    Device(DeviceError),
    /// The frame was captured but could not be persisted
    Store(StoreError),
    /// The countdown was aborted before the frame was requested
    Cancelled,
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Config file exists but could not be read or written
    Io(String),
    /// Config file is not valid JSON for this version
    Parse(String),
    /// No config directory on this platform
    NoConfigDir,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Scheduler(e) => write!(f, "Scheduler error: {}", e),
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::InvalidInterval(value) => {
                write!(f, "Invalid interval '{}': expected minutes > 0", value)
            }
            SchedulerError::AlreadyRunning => write!(f, "Scheduler is already running"),
            SchedulerError::Busy => write!(f, "A capture is already in progress"),
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NotAvailable(msg) => write!(f, "Camera not available: {}", msg),
            DeviceError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            DeviceError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DirectoryUnavailable(msg) => {
                write!(f, "Photo directory unavailable: {}", msg)
            }
            StoreError::WriteFailed(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Device(e) => write!(f, "Device error: {}", e),
            CaptureError::Store(e) => write!(f, "Store error: {}", e),
            CaptureError::Cancelled => write!(f, "Countdown cancelled before capture"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Invalid config file: {}", msg),
            ConfigError::NoConfigDir => write!(f, "No configuration directory available"),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for SchedulerError {}
impl std::error::Error for DeviceError {}
impl std::error::Error for StoreError {}
impl std::error::Error for CaptureError {}
impl std::error::Error for ConfigError {}

// Conversions from sub-errors to AppError
impl From<SchedulerError> for AppError {
    fn from(err: SchedulerError) -> Self {
        AppError::Scheduler(err)
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<DeviceError> for CaptureError {
    fn from(err: DeviceError) -> Self {
        CaptureError::Device(err)
    }
}

impl From<StoreError> for CaptureError {
    fn from(err: StoreError) -> Self {
        CaptureError::Store(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::WriteFailed(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
