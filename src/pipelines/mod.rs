// SPDX-License-Identifier: MPL-2.0

//! Capture pipelines
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │    Timer     │ ──▶ │  Interval Capture │ ──▶ │  Asset Store │
//! │   (ticks)    │     │  - 1/15 branch    │     │  IMG_*.jpg   │
//! │              │     │  - Flash countdown│     │              │
//! │              │     │  - Capture frame  │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`interval`]: Recurring timer, countdown sequencer and capture job
//! - [`photo`]: Encoding of captured frames to JPEG/PNG

pub mod interval;
pub mod photo;
