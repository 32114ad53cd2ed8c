// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_clock_is_after_2020() {
    let clock = SystemClock;
    assert!(clock.epoch_secs() > 1_577_836_800.0);
}

#[test]
fn fake_clock_can_be_advanced() {
    let clock = FakeClock::new();
    let t1 = clock.epoch_secs();
    clock.advance(Duration::from_secs(60));
    assert_eq!(clock.epoch_secs() - t1, 60.0);
}

#[test]
fn fake_clock_is_cloneable_and_shared() {
    let clock1 = FakeClock::at(500.0);
    let clock2 = clock1.clone();
    clock2.advance(Duration::from_millis(1500));
    assert_eq!(clock1.epoch_secs(), 501.5);
}

#[test]
fn fake_clock_set() {
    let clock = FakeClock::default();
    clock.set_epoch_secs(42.0);
    assert_eq!(clock.epoch_secs(), 42.0);
}
