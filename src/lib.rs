// SPDX-License-Identifier: MPL-2.0

//! Interval Camera - unattended periodic photo capture
//!
//! On a fixed cadence the camera either captures silently or, with a 1 in 15
//! chance, first blinks its torch through a two-phase "get ready" countdown.
//! Every photo is written to durable storage.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`pipelines`]: Capture scheduler, flash countdown, capture job, encoding
//! - [`backends`]: Camera devices (V4L2, image file)
//! - [`flash`]: Torch drivers and the observable torch state
//! - [`storage`]: Asset store for captured photos
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```ignore
//! let job = CaptureJob::new(camera, store, FlashState::new());
//! let mut scheduler = CaptureScheduler::new(job);
//! scheduler.start(2.0)?;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod flash;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use errors::{AppError, AppResult, CaptureError, SchedulerError};
pub use flash::FlashState;
pub use pipelines::interval::{
    CaptureJob, CaptureMode, CaptureScheduler, SchedulerEvent, SchedulerStatus,
};
