use scalebridge_hardware::sim::{Placement, demo_placements, placement_frames};
use scalebridge_hardware::SimulatedScale;
use scalebridge_traits::{LinkOpener, ManualClock, ScaleLink};
use std::time::Duration;

fn read_text(link: &mut impl ScaleLink) -> String {
    String::from_utf8(link.read().unwrap().unwrap()).unwrap()
}

#[test]
fn placement_ramps_holds_and_empties() {
    let frames = placement_frames(&Placement::new("0002", 0.75), 1);
    assert_eq!(
        frames,
        vec![
            "ST,GS,P0002W0.300\r\n",
            "ST,GS,P0002W0.675\r\n",
            "ST,GS,P0002W0.752\r\n",
            "ST,GS,P0002W0.749\r\n",
            "ST,GS,P0002W0.750\r\n",
            "ST,GS,P0002W0.751\r\n",
            "ST,GS,P0002W0.000\r\n",
            "ST,GS,P0002W0.000\r\n",
            "ST,GS,P0002W0.000\r\n",
        ]
    );
}

#[test]
fn styles_rotate_through_frame_formats() {
    let p = Placement {
        device_price: 900.0,
        ..Placement::new("0001", 1.0)
    };
    assert_eq!(placement_frames(&p, 0)[4], "P0001W1.000U900.00T900.00\r\n");
    assert_eq!(placement_frames(&p, 2)[4], "W+1.000\r\n");
    assert_eq!(placement_frames(&p, 3)[4], "ST,GS,   1.000 kg\r\n");
}

#[test]
fn script_repeats_after_last_placement() {
    let placements = vec![Placement::new("0004", 0.48)];
    let per_cycle = placement_frames(&placements[0], 0).len();
    let mut opener = SimulatedScale::with_clock(Duration::ZERO, ManualClock::new())
        .with_placements(placements);
    let mut link = opener.open().unwrap();

    let first = read_text(&mut link);
    for _ in 1..per_cycle {
        read_text(&mut link);
    }
    // second cycle uses the next frame style
    let again = read_text(&mut link);
    assert!(first.starts_with("P0004W"));
    assert!(again.starts_with("ST,GS,P0004W"));
}

#[test]
fn first_opens_can_be_made_to_fail() {
    let mut opener =
        SimulatedScale::with_clock(Duration::ZERO, ManualClock::new()).fail_first_opens(2);
    assert!(opener.open().is_err());
    assert!(opener.open().is_err());
    assert!(opener.open().is_ok());
    assert_eq!(opener.endpoint(), "simulated");
}

#[test]
fn demo_covers_every_default_product() {
    let codes: Vec<String> = demo_placements().into_iter().map(|p| p.product_code).collect();
    assert_eq!(codes, ["0001", "0002", "0003", "0004", "0005"]);
}
