// SPDX-License-Identifier: GPL-3.0-only

//! Recurring capture timer
//!
//! The scheduler owns one repeating timer. On every tick it draws a uniform
//! sample and runs the capture job either silently or with the flash
//! countdown (1 in 15). Jobs run on their own task so the timer keeps its
//! cadence, but only one job is ever in flight: a tick that fires while a
//! job is still running is dropped and reported as
//! [`SchedulerEvent::TickSkipped`].
//!
//! `stop` disarms the timer only. A job already in flight runs to
//! completion and still reports its outcome.

use super::job::{CaptureJob, CaptureMode, CaptureResult};
use super::random::{RandomSource, ThreadRandom};
use crate::constants::{EVENT_CHANNEL_CAPACITY, MS_PER_MINUTE};
use crate::errors::{CaptureError, SchedulerError};
use crate::flash::FlashState;
use crate::storage::AssetRef;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Scheduler lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerStatus {
    Idle,
    Running,
}

/// What caused a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Timer tick, numbered from 1 within a start/stop session
    Tick(u64),
    /// Explicit request through [`CaptureScheduler::trigger`]
    Manual,
}

/// Notifications for observers of the scheduler
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    Started {
        interval: Duration,
    },
    Stopped,
    /// A tick fired and a job was launched
    Tick {
        tick: u64,
        mode: CaptureMode,
    },
    /// A tick fired while a job was in flight and was dropped
    TickSkipped {
        tick: u64,
    },
    Captured {
        trigger: Trigger,
        mode: CaptureMode,
        asset: AssetRef,
    },
    CaptureFailed {
        trigger: Trigger,
        mode: CaptureMode,
        error: CaptureError,
    },
}

/// Timer period for a user-entered interval in minutes
///
/// The value must be finite and greater than zero. Periods shorter than the
/// timer resolution are rounded up to one millisecond.
pub fn interval_period(minutes: f64) -> Result<Duration, SchedulerError> {
    let millis = minutes * MS_PER_MINUTE;
    if !minutes.is_finite() || minutes <= 0.0 || !millis.is_finite() || millis > u64::MAX as f64 {
        return Err(SchedulerError::InvalidInterval(minutes.to_string()));
    }
    Ok(Duration::from_millis(millis.round().max(1.0) as u64))
}

/// Parse an interval typed by the user, in minutes
pub fn parse_interval_minutes(input: &str) -> Result<f64, SchedulerError> {
    let minutes: f64 = input
        .trim()
        .parse()
        .map_err(|_| SchedulerError::InvalidInterval(input.to_string()))?;
    interval_period(minutes).map_err(|_| SchedulerError::InvalidInterval(input.to_string()))?;
    Ok(minutes)
}

/// State shared between the scheduler handle, its tick loop, and job tasks
struct Shared {
    job: CaptureJob,
    in_flight: Arc<Mutex<()>>,
    random: std::sync::Mutex<Box<dyn RandomSource>>,
    events: broadcast::Sender<SchedulerEvent>,
}

impl Shared {
    fn draw_mode(&self) -> CaptureMode {
        let sample = match self.random.lock() {
            Ok(mut random) => random.sample(),
            Err(poisoned) => poisoned.into_inner().sample(),
        };
        CaptureMode::from_sample(sample)
    }

    fn publish(&self, event: SchedulerEvent) {
        // No subscribers is fine; everything is logged as well
        let _ = self.events.send(event);
    }

    async fn execute(&self, trigger: Trigger, mode: CaptureMode) -> CaptureResult {
        let result = self.job.run(mode).await;
        self.report(trigger, mode, &result);
        result
    }

    async fn execute_until(
        &self,
        trigger: Trigger,
        mode: CaptureMode,
        cancel: &CancellationToken,
    ) -> CaptureResult {
        let result = self.job.run_until(mode, cancel).await;
        self.report(trigger, mode, &result);
        result
    }

    fn report(&self, trigger: Trigger, mode: CaptureMode, result: &CaptureResult) {
        match result {
            Ok(asset) => self.publish(SchedulerEvent::Captured {
                trigger,
                mode,
                asset: asset.clone(),
            }),
            Err(error) => {
                warn!(?trigger, %mode, error = %error, "Capture job failed, scheduler continues");
                self.publish(SchedulerEvent::CaptureFailed {
                    trigger,
                    mode,
                    error: error.clone(),
                });
            }
        }
    }
}

/// An armed timer
struct Session {
    period: Duration,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the recurring capture timer
///
/// Must be used from within a tokio runtime.
pub struct CaptureScheduler {
    shared: Arc<Shared>,
    session: Option<Session>,
}

impl CaptureScheduler {
    /// Scheduler drawing from the thread-local OS-seeded generator
    pub fn new(job: CaptureJob) -> Self {
        Self::with_random_source(job, Box::new(ThreadRandom))
    }

    /// Scheduler drawing from the given random source
    pub fn with_random_source(job: CaptureJob, random: Box<dyn RandomSource>) -> Self {
        let (events, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                job,
                in_flight: Arc::new(Mutex::new(())),
                random: std::sync::Mutex::new(random),
                events,
            }),
            session: None,
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        if self.session.is_some() {
            SchedulerStatus::Running
        } else {
            SchedulerStatus::Idle
        }
    }

    /// Timer period while running
    pub fn interval(&self) -> Option<Duration> {
        self.session.as_ref().map(|s| s.period)
    }

    /// Whether a capture job is in flight
    pub fn is_capturing(&self) -> bool {
        self.shared.in_flight.try_lock().is_err()
    }

    /// Torch state for live indicators
    pub fn flash_state(&self) -> FlashState {
        self.shared.job.flash_state().clone()
    }

    /// Subscribe to scheduler events
    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.shared.events.subscribe()
    }

    /// Arm the timer to tick every `interval_minutes`
    ///
    /// The first tick fires one full interval after this call. Starting a
    /// running scheduler is rejected and leaves the existing timer alone.
    pub fn start(&mut self, interval_minutes: f64) -> Result<(), SchedulerError> {
        let period = interval_period(interval_minutes).inspect_err(|_| {
            warn!(interval_minutes, "Rejected invalid capture interval");
        })?;

        if self.session.is_some() {
            warn!("Scheduler already running, ignoring start");
            return Err(SchedulerError::AlreadyRunning);
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_ticks(self.shared.clone(), period, cancel.clone()));

        info!(
            interval_minutes,
            period_ms = period.as_millis() as u64,
            "Scheduler started"
        );
        self.shared
            .publish(SchedulerEvent::Started { interval: period });

        self.session = Some(Session {
            period,
            cancel,
            handle,
        });
        Ok(())
    }

    /// Disarm the timer; a no-op when idle
    pub fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            debug!("Scheduler already idle");
            return;
        };

        session.cancel.cancel();
        // The loop holds no job, so aborting it cannot interrupt a capture
        session.handle.abort();

        if self.is_capturing() {
            info!("Scheduler stopped, in-flight capture will finish");
        } else {
            info!("Scheduler stopped");
        }
        self.shared.publish(SchedulerEvent::Stopped);
    }

    /// Run one capture now, outside the timer
    ///
    /// Shares the in-flight guard with timer ticks, so it fails with
    /// [`SchedulerError::Busy`] while another capture is running.
    pub async fn trigger(&self, mode: CaptureMode) -> Result<CaptureResult, SchedulerError> {
        self.trigger_until(mode, &CancellationToken::new()).await
    }

    /// Like [`Self::trigger`], but a countdown stops with the torch off once
    /// `cancel` fires
    ///
    /// A capture that has already been requested from the device still
    /// completes.
    pub async fn trigger_until(
        &self,
        mode: CaptureMode,
        cancel: &CancellationToken,
    ) -> Result<CaptureResult, SchedulerError> {
        let Ok(_guard) = self.shared.in_flight.clone().try_lock_owned() else {
            warn!(%mode, "Manual capture rejected, capture already in flight");
            return Err(SchedulerError::Busy);
        };

        info!(%mode, "Manual capture");
        Ok(self
            .shared
            .execute_until(Trigger::Manual, mode, cancel)
            .await)
    }
}

impl Drop for CaptureScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_ticks(shared: Arc<Shared>, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    // Ticks missed while the process was suspended are not replayed
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut tick = 0u64;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tick += 1;
        let mode = shared.draw_mode();

        let Ok(guard) = shared.in_flight.clone().try_lock_owned() else {
            warn!(tick, "Previous capture still running, dropping tick");
            shared.publish(SchedulerEvent::TickSkipped { tick });
            continue;
        };

        info!(tick, %mode, "Capture tick");
        shared.publish(SchedulerEvent::Tick { tick, mode });

        let shared = shared.clone();
        tokio::spawn(async move {
            let _guard = guard;
            let _ = shared.execute(Trigger::Tick(tick), mode).await;
        });
    }

    debug!(ticks = tick, "Tick loop finished");
}
