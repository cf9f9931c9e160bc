use chrono::Utc;
use scalebridge_core::{BroadcastHub, Delivery, EventSink, WeighEvent};
use std::sync::Arc;
use std::time::Duration;

fn event(weight: f64) -> WeighEvent {
    WeighEvent::new("0003", weight, 650.0, Utc::now())
}

#[test]
fn every_listener_gets_every_event() {
    let hub = BroadcastHub::new(8);
    let a = hub.subscribe();
    let b = hub.subscribe();

    hub.publish(&event(1.0)).unwrap();
    hub.publish(&event(2.0)).unwrap();

    for sub in [&a, &b] {
        let weights: Vec<f64> = sub
            .drain()
            .iter()
            .map(|m| WeighEvent::from_json(m).unwrap().weight_kg())
            .collect();
        assert_eq!(weights, vec![1.0, 2.0]);
    }
}

#[test]
fn slow_listener_loses_messages_without_blocking_others() {
    let hub = BroadcastHub::new(2);
    let slow = hub.subscribe();
    let fast = hub.subscribe();

    let mut last = Delivery::default();
    for i in 0..5 {
        last = hub.publish(&event(1.0 + f64::from(i))).unwrap();
        assert!(fast.try_next().is_some());
    }
    assert_eq!(
        last,
        Delivery {
            delivered: 1,
            dropped: 1,
            removed: 0
        }
    );
    // the slow listener kept the oldest two
    assert_eq!(slow.drain().len(), 2);
    assert_eq!(hub.listener_count(), 2);
}

#[test]
fn dropped_subscription_is_removed_on_next_publish() {
    let hub = BroadcastHub::new(4);
    let keep = hub.subscribe();
    drop(hub.subscribe());
    assert_eq!(hub.listener_count(), 2);

    let d = hub.publish(&event(1.5)).unwrap();
    assert_eq!(d.delivered, 1);
    assert_eq!(d.removed, 1);
    assert_eq!(hub.listener_count(), 1);
    assert!(keep.try_next().is_some());
}

#[test]
fn listeners_on_other_threads_receive_events() {
    let hub = Arc::new(BroadcastHub::new(16));
    let subs: Vec<_> = (0..4).map(|_| hub.subscribe()).collect();
    let handles: Vec<_> = subs
        .into_iter()
        .map(|sub| {
            std::thread::spawn(move || {
                (0..3)
                    .filter_map(|_| sub.next_timeout(Duration::from_secs(2)))
                    .count()
            })
        })
        .collect();

    for w in [1.0, 2.0, 3.0] {
        hub.deliver(&event(w)).unwrap();
    }
    for h in handles {
        assert_eq!(h.join().unwrap(), 3);
    }
}
