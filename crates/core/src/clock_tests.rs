// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::new();
    let start = clock.now();
    clock.advance(Duration::seconds(90));
    assert_eq!(clock.now() - start, Duration::seconds(90));
}

#[test]
fn fake_clock_clones_share_time() {
    let clock = FakeClock::new();
    let other = clock.clone();
    clock.advance(Duration::minutes(5));
    assert_eq!(clock.now(), other.now());
}

#[test]
fn fake_clock_set_overrides() {
    let clock = FakeClock::new();
    let target = Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap();
    clock.set(target);
    assert_eq!(clock.now(), target);
}
