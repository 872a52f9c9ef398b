// SPDX-License-Identifier: GPL-3.0-only

//! Unattended interval capture
//!
//! # Control Flow
//!
//! ```text
//! CaptureScheduler tick
//!     │  sample < 1/15 ?
//!     ├── yes ─▶ CountdownSequencer ─▶ CaptureJob ─▶ AssetStore
//!     └── no  ─────────────────────▶  CaptureJob ─▶ AssetStore
//! ```
//!
//! At most one [`CaptureJob`] is in flight at any time, so two countdowns
//! never interleave their torch writes.

pub mod countdown;
pub mod job;
pub mod random;
pub mod scheduler;

pub use countdown::{CountdownOutcome, CountdownPlan, CountdownSequencer};
pub use job::{CaptureJob, CaptureMode, CaptureResult};
pub use random::{RandomSource, ScriptedRandom, SeededRandom, ThreadRandom};
pub use scheduler::{
    CaptureScheduler, SchedulerEvent, SchedulerStatus, Trigger, interval_period,
    parse_interval_minutes,
};
