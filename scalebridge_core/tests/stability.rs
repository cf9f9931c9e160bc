use proptest::prelude::*;
use scalebridge_core::config::StabilityCfg;
use scalebridge_core::stability::{Settled, StabilityTracker};
use scalebridge_traits::ManualClock;
use std::time::Duration;

fn tracker_with(cfg: StabilityCfg) -> (StabilityTracker<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    (StabilityTracker::with_clock(cfg, clock.clone()), clock)
}

fn tracker() -> (StabilityTracker<ManualClock>, ManualClock) {
    tracker_with(StabilityCfg::default())
}

#[test]
fn three_close_samples_settle_to_their_mean() {
    let (mut t, _) = tracker();
    assert_eq!(t.ingest(2.001), None);
    assert_eq!(t.ingest(2.002), None);
    assert_eq!(t.ingest(2.000), Some(Settled { weight_kg: 2.001 }));
}

#[test]
fn spread_above_threshold_does_not_settle() {
    let (mut t, _) = tracker();
    for w in [1.00, 1.02, 1.01] {
        assert_eq!(t.ingest(w), None);
    }
}

#[test]
fn spread_of_exactly_threshold_settles() {
    let (mut t, _) = tracker();
    t.ingest(1.00);
    t.ingest(1.01);
    assert_eq!(t.ingest(1.005), Some(Settled { weight_kg: 1.005 }));
}

#[test]
fn settling_load_emits_once_when_steady() {
    let (mut t, _) = tracker();
    let ramp = [0.0, 0.4, 1.1, 1.48, 1.502, 1.499, 1.501, 1.500, 1.500, 1.501];
    let out: Vec<Settled> = ramp.iter().filter_map(|&w| t.ingest(w)).collect();
    assert_eq!(out, vec![Settled { weight_kg: 1.501 }]);
}

#[test]
fn non_positive_weights_never_settle() {
    let (mut t, _) = tracker();
    for _ in 0..10 {
        assert_eq!(t.ingest(0.0), None);
    }
    for _ in 0..10 {
        assert_eq!(t.ingest(-1.0), None);
    }
    assert_eq!(t.last_emitted(), None);
}

#[test]
fn duplicate_inside_cooldown_is_suppressed() {
    let (mut t, clock) = tracker();
    for w in [3.0, 3.0, 3.0] {
        t.ingest(w);
    }
    assert_eq!(t.last_emitted(), Some(3.0));

    clock.advance(Duration::from_millis(1500));
    assert_eq!(t.ingest(3.005), None);
    assert_eq!(t.ingest(3.0), None);
}

#[test]
fn equal_weight_reemitted_after_cooldown() {
    let (mut t, clock) = tracker();
    for w in [3.0, 3.0, 3.0] {
        t.ingest(w);
    }
    clock.advance(Duration::from_millis(2000));
    assert_eq!(t.ingest(3.0), Some(Settled { weight_kg: 3.0 }));
}

#[test]
fn different_weight_inside_cooldown_is_emitted() {
    let (mut t, clock) = tracker();
    for w in [3.0, 3.0, 3.0] {
        t.ingest(w);
    }
    clock.advance(Duration::from_millis(100));
    for w in [3.5, 3.5] {
        assert_eq!(t.ingest(w), None);
    }
    assert_eq!(t.ingest(3.5), Some(Settled { weight_kg: 3.5 }));
}

#[test]
fn stricter_window_keeps_mean_of_three() {
    let (mut t, _) = tracker_with(StabilityCfg {
        required_readings: 5,
        ..StabilityCfg::default()
    });
    let samples = [4.000, 4.004, 4.001, 4.002, 4.006];
    let out: Vec<Settled> = samples.iter().filter_map(|&w| t.ingest(w)).collect();
    // (4.001 + 4.002 + 4.006) / 3
    assert_eq!(out, vec![Settled { weight_kg: 4.003 }]);
}

#[test]
fn zero_sample_breaks_stability_run() {
    let (mut t, _) = tracker();
    t.ingest(2.0);
    t.ingest(2.0);
    assert_eq!(t.ingest(0.0), None);
    assert_eq!(t.ingest(2.0), None);
    assert_eq!(t.ingest(2.0), None);
    assert_eq!(t.ingest(2.0), Some(Settled { weight_kg: 2.0 }));
}

proptest! {
    #[test]
    fn fewer_than_required_samples_never_settle(
        n in 2usize..=10,
        base in 0.1f64..100.0,
    ) {
        let (mut t, _) = tracker_with(StabilityCfg {
            required_readings: n,
            ..StabilityCfg::default()
        });
        for _ in 0..n - 1 {
            prop_assert_eq!(t.ingest(base), None);
        }
    }

    #[test]
    fn steady_run_settles_on_nth_sample(
        n in 1usize..=10,
        base in 0.1f64..100.0,
        jitter in proptest::collection::vec(0.0f64..0.009, 10),
    ) {
        let (mut t, _) = tracker_with(StabilityCfg {
            required_readings: n,
            ..StabilityCfg::default()
        });
        for j in jitter.iter().take(n - 1) {
            prop_assert_eq!(t.ingest(base + j), None);
        }
        let last = t.ingest(base + jitter[n - 1]);
        prop_assert!(last.is_some());
    }

    #[test]
    fn wide_spread_never_settles(
        base in 0.1f64..100.0,
        gap in 0.011f64..1.0,
    ) {
        let (mut t, _) = tracker();
        for i in 0..10 {
            let w = if i % 2 == 0 { base } else { base + gap };
            prop_assert_eq!(t.ingest(w), None);
        }
    }

    #[test]
    fn at_most_one_event_per_steady_placement(
        base in 0.1f64..100.0,
        len in 3usize..40,
    ) {
        let (mut t, _) = tracker();
        let emitted = (0..len).filter_map(|_| t.ingest(base)).count();
        prop_assert_eq!(emitted, 1);
    }
}
