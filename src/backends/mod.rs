// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera capture
//!
//! The capture job only sees the [`camera::CaptureDevice`] trait; the
//! concrete sensor behind it is chosen at startup from the configuration:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 Capture Job                  │
//! └────────────────────┬────────────────────────┘
//!                      │ CaptureDevice
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌─────────────┐    ┌──────────────────┐   │
//! │  │ File source │    │      V4L2        │   │
//! │  │  (image)    │    │  (/dev/videoN)   │   │
//! │  └─────────────┘    └──────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```

pub mod camera;
