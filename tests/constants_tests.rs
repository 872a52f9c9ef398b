// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use intervalcam::constants::countdown::{FAST_PHASE, PHASES, SLOW_PHASE};
use intervalcam::constants::{COUNTDOWN_PROBABILITY, MS_PER_MINUTE};
use std::time::Duration;

#[test]
fn test_countdown_phase_order() {
    // Slow phase first, then fast
    assert_eq!(PHASES, [SLOW_PHASE, FAST_PHASE]);
    assert!(SLOW_PHASE.toggle_interval() > FAST_PHASE.toggle_interval());
}

#[test]
fn test_countdown_toggle_totals() {
    let toggles: u32 = PHASES.iter().map(|p| p.toggle_count).sum();
    let duration: Duration = PHASES.iter().map(|p| p.duration()).sum();

    // Odd number of toggles: a torch that starts off ends on, hence the forced off
    assert_eq!(toggles, 15);
    assert_eq!(duration, Duration::from_secs(7));
}

#[test]
fn test_countdown_probability() {
    assert!((COUNTDOWN_PROBABILITY * 15.0 - 1.0).abs() < f64::EPSILON);
    assert_eq!(MS_PER_MINUTE, 60_000.0);
}
