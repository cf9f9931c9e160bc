#![no_main]
use libfuzzer_sys::fuzz_target;
use scalebridge_core::config::StabilityCfg;
use scalebridge_core::{PriceTable, StabilityTracker, decode, decode_priced};

fuzz_target!(|data: &[u8]| {
    let prices: PriceTable = [("0001".to_string(), 850.0)].into_iter().collect();
    let mut tracker = StabilityTracker::new(StabilityCfg::default());

    // Feed the input as line traffic: every line decodes or is dropped.
    for line in data.split(|&b| b == b'\n') {
        let plain = decode(line);
        let priced = decode_priced(line, &prices);
        assert_eq!(plain.is_some(), priced.is_some());
        if let Some(frame) = plain {
            assert!(frame.weight_kg.is_finite());
            if let Some(settled) = tracker.ingest(frame.weight_kg) {
                assert!(settled.weight_kg > 0.0);
            }
        }
    }
});
