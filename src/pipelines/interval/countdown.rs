// SPDX-License-Identifier: GPL-3.0-only

//! Flash countdown shown before a countdown capture
//!
//! The torch blinks slowly, then quickly, then is forced off so the light
//! never bleeds into the exposure that follows:
//!
//! ```text
//! phase 1: toggle ─ 1000ms ─ toggle ─ 1000ms ─ ... (5 toggles, ~5s)
//! phase 2: toggle ─ 200ms ─ toggle ─ 200ms ─ ...   (10 toggles, ~2s)
//! finally: torch off
//! ```
//!
//! Every toggle inverts the current [`FlashState`], so the pattern is the
//! same whatever state the torch starts in. A run cannot be paused; it either
//! completes or, when a cancellation token is supplied, stops at the next
//! toggle boundary with the torch off.

use crate::constants::{CountdownPhase, countdown};
use crate::flash::{FlashState, TorchDriver};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Ordered, immutable list of countdown phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownPlan {
    phases: [CountdownPhase; 2],
}

impl CountdownPlan {
    /// The fixed slow-then-fast pattern
    pub const STANDARD: CountdownPlan = CountdownPlan {
        phases: countdown::PHASES,
    };

    pub fn phases(&self) -> &[CountdownPhase] {
        &self.phases
    }

    /// Toggles across all phases
    pub fn total_toggles(&self) -> u32 {
        self.phases.iter().map(|p| p.toggle_count).sum()
    }

    /// Time from the first toggle until the torch is forced off
    pub fn total_duration(&self) -> Duration {
        self.phases.iter().map(|p| p.duration()).sum()
    }
}

impl Default for CountdownPlan {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// How a countdown run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownOutcome {
    /// Both phases ran; torch is off
    Completed,
    /// Stopped early at a toggle boundary; torch is off
    Cancelled,
}

/// Runs the countdown plan against a torch
#[derive(Debug, Clone)]
pub struct CountdownSequencer {
    plan: CountdownPlan,
    flash_state: FlashState,
}

impl CountdownSequencer {
    pub fn new(flash_state: FlashState) -> Self {
        Self {
            plan: CountdownPlan::STANDARD,
            flash_state,
        }
    }

    /// Torch state mirrored for the presentation layer
    pub fn flash_state(&self) -> &FlashState {
        &self.flash_state
    }

    /// Run both phases to completion
    pub async fn run<T: TorchDriver + ?Sized>(&self, torch: &T) -> CountdownOutcome {
        self.run_until_cancelled(torch, &CancellationToken::new())
            .await
    }

    /// Run both phases, checking `cancel` during every pause
    pub async fn run_until_cancelled<T: TorchDriver + ?Sized>(
        &self,
        torch: &T,
        cancel: &CancellationToken,
    ) -> CountdownOutcome {
        info!(
            toggles = self.plan.total_toggles(),
            duration_ms = self.plan.total_duration().as_millis() as u64,
            "Starting flash countdown"
        );

        for (index, phase) in self.plan.phases().iter().enumerate() {
            debug!(
                phase = index + 1,
                toggles = phase.toggle_count,
                interval_ms = phase.toggle_interval_ms,
                "Countdown phase"
            );

            for _ in 0..phase.toggle_count {
                self.toggle(torch);

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        self.set(torch, false);
                        info!("Flash countdown cancelled");
                        return CountdownOutcome::Cancelled;
                    }
                    _ = tokio::time::sleep(phase.toggle_interval()) => {}
                }
            }
        }

        // 15 toggles leave the torch in an arbitrary state
        self.set(torch, false);
        info!("Flash countdown complete");
        CountdownOutcome::Completed
    }

    fn toggle<T: TorchDriver + ?Sized>(&self, torch: &T) {
        let next = !self.flash_state.torch_on();
        self.set(torch, next);
    }

    fn set<T: TorchDriver + ?Sized>(&self, torch: &T, on: bool) {
        torch.set_torch(on);
        self.flash_state.set(on);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Records every torch write with its offset on the virtual clock
    struct RecordingTorch {
        start: Instant,
        writes: Mutex<Vec<(u64, bool)>>,
    }

    impl RecordingTorch {
        fn new() -> Self {
            Self {
                start: Instant::now(),
                writes: Mutex::new(Vec::new()),
            }
        }

        fn writes(&self) -> Vec<(u64, bool)> {
            self.writes.lock().unwrap().clone()
        }
    }

    impl TorchDriver for RecordingTorch {
        fn set_torch(&self, on: bool) {
            let at = self.start.elapsed().as_millis() as u64;
            self.writes.lock().unwrap().push((at, on));
        }
    }

    fn expected_offsets() -> Vec<u64> {
        let slow = (0..5).map(|i| i * 1000);
        let fast = (0..10).map(|i| 5000 + i * 200);
        slow.chain(fast).collect()
    }

    #[test]
    fn test_standard_plan_shape() {
        let plan = CountdownPlan::STANDARD;
        assert_eq!(plan.phases().len(), 2);
        assert_eq!(plan.phases()[0].toggle_count, 5);
        assert_eq!(plan.phases()[0].toggle_interval_ms, 1000);
        assert_eq!(plan.phases()[1].toggle_count, 10);
        assert_eq!(plan.phases()[1].toggle_interval_ms, 200);
        assert_eq!(plan.total_toggles(), 15);
        assert_eq!(plan.total_duration(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_timeline_from_off() {
        let torch = RecordingTorch::new();
        let sequencer = CountdownSequencer::new(FlashState::new());

        let outcome = sequencer.run(&torch).await;
        assert_eq!(outcome, CountdownOutcome::Completed);

        let writes = torch.writes();
        assert_eq!(writes.len(), 16);

        let toggles = &writes[..15];
        let offsets: Vec<u64> = toggles.iter().map(|(at, _)| *at).collect();
        assert_eq!(offsets, expected_offsets());

        // Strict alternation starting with "on"
        for (i, (_, on)) in toggles.iter().enumerate() {
            assert_eq!(*on, i % 2 == 0, "toggle {} has wrong state", i);
        }

        // Forced off after the last pause
        assert_eq!(writes[15], (7000, false));
        assert!(!sequencer.flash_state().torch_on());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ends_off_when_starting_on() {
        let torch = RecordingTorch::new();
        let state = FlashState::new();
        state.set(true);
        let sequencer = CountdownSequencer::new(state.clone());

        sequencer.run(&torch).await;

        let writes = torch.writes();
        assert_eq!(writes[0], (0, false));
        assert_eq!(writes.last(), Some(&(7000, false)));
        assert!(!state.torch_on());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_at_toggle_boundary() {
        let torch = RecordingTorch::new();
        let sequencer = CountdownSequencer::new(FlashState::new());
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(2500)).await;
                cancel.cancel();
            })
        };

        let outcome = sequencer.run_until_cancelled(&torch, &cancel).await;
        canceller.await.unwrap();

        assert_eq!(outcome, CountdownOutcome::Cancelled);
        let writes = torch.writes();
        // Toggles at 0, 1000, 2000, then forced off at 2500
        assert_eq!(writes.len(), 4);
        assert_eq!(writes[3], (2500, false));
        assert!(!sequencer.flash_state().torch_on());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flash_state_watchers_see_transitions() {
        let torch = RecordingTorch::new();
        let state = FlashState::new();
        let mut rx = state.subscribe();
        let sequencer = CountdownSequencer::new(state);

        let watcher = tokio::spawn(async move {
            let mut seen = 0;
            while rx.changed().await.is_ok() {
                seen += 1;
                if seen == 15 {
                    break;
                }
            }
            seen
        });

        sequencer.run(&torch).await;
        assert_eq!(watcher.await.unwrap(), 15);
    }
}
