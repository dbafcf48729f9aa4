//! Property-based tests for the sensor chain and section layout.
//!
//! Run with: cargo test -p conveyor-accumulation -- proptest

#![allow(clippy::unwrap_used, clippy::expect_used)]

use conveyor_accumulation::section::{ConnectionPoint, Revolution, SectionEdit, SectionShape};
use conveyor_accumulation::{
    Accumulation, AccumulationInfo, Controller, GateDecision, SectionHandler,
};
use conveyor_types::{pose, Beam, LoadId, SensorId, SensorTag};
use nalgebra::Isometry3;
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_shape() -> impl Strategy<Value = SectionShape> {
    prop_oneof![Just(SectionShape::Straight), Just(SectionShape::Curve)]
}

fn arb_revolution() -> impl Strategy<Value = Revolution> {
    prop_oneof![Just(Revolution::Clockwise), Just(Revolution::Counterclockwise)]
}

/// Shape, revolution, radius and sweep for one chain position.
fn arb_section() -> impl Strategy<Value = (SectionShape, Revolution, f64, f64)> {
    (
        arb_shape(),
        arb_revolution(),
        0.2..3.0f64,
        (30.0..=180.0f64).prop_map(f64::to_radians),
    )
}

fn arb_pose() -> impl Strategy<Value = Isometry3<f64>> {
    (
        -50.0..50.0f64,
        -50.0..50.0f64,
        0.0..5.0f64,
        -std::f64::consts::PI..std::f64::consts::PI,
    )
        .prop_map(|(x, y, z, yaw)| pose::from_xyz_yaw(x, y, z, yaw))
}

fn build(sections: &[(SectionShape, Revolution, f64, f64)], length: f64) -> Accumulation {
    let mut conveyor = Accumulation::new(AccumulationInfo {
        number_of_sections: sections.len(),
        length,
        ..AccumulationInfo::default()
    })
    .unwrap();
    for (index, &(shape, revolution, radius, angle)) in sections.iter().enumerate() {
        conveyor.set_section_shape(index, shape).unwrap();
        if shape == SectionShape::Curve {
            conveyor
                .edit_section(index, SectionEdit::Revolution(revolution))
                .unwrap();
            conveyor.edit_section(index, SectionEdit::Radius(radius)).unwrap();
            conveyor.edit_section(index, SectionEdit::Angle(angle)).unwrap();
        }
    }
    conveyor
}

/// Registers one tagged beam per entry, in the given order.
fn chain(tags: &[u32]) -> (Controller, Vec<Beam>) {
    let mut controller = Controller::new();
    let mut beams = Vec::new();
    for &tag in tags {
        let mut beam = Beam::new(controller.allocate_id(), format!("Sensor {tag}"));
        beam.assign_tag(SensorTag::new(tag)).unwrap();
        controller.add(&beam);
        beams.push(beam);
    }
    (controller, beams)
}

fn is_ascending(controller: &Controller) -> bool {
    controller
        .tags()
        .windows(2)
        .all(|pair| pair[0] <= pair[1])
}

fn tag_of(beams: &[Beam], id: SensorId) -> Option<SensorTag> {
    beams.iter().find(|b| b.id() == id).and_then(Beam::tag)
}

// =============================================================================
// Controller properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Registration in any order yields a chain sorted by tag.
    #[test]
    fn proptest_chain_sorted_after_add(
        tags in Just((0..12u32).collect::<Vec<_>>()).prop_shuffle()
    ) {
        let (controller, beams) = chain(&tags);
        prop_assert!(is_ascending(&controller));

        let heads: Vec<_> = controller.chain().collect();
        prop_assert_eq!(tag_of(&beams, heads[0]), Some(SensorTag::new(0)));
    }

    /// Removal keeps the remaining chain sorted.
    #[test]
    fn proptest_chain_sorted_after_remove(
        tags in Just((0..12u32).collect::<Vec<_>>()).prop_shuffle(),
        removals in prop::collection::vec(0..12usize, 0..12),
    ) {
        let (mut controller, beams) = chain(&tags);
        for index in removals {
            controller.remove(beams[index].id());
            prop_assert!(is_ascending(&controller));
        }
    }

    /// A non-head beam holds exactly when its predecessor is occupied.
    #[test]
    fn proptest_gating_follows_predecessor(
        occupied in prop::collection::vec(any::<bool>(), 2..10),
        pick in any::<prop::sample::Index>(),
        release in any::<bool>(),
    ) {
        let tags: Vec<u32> = (0..u32::try_from(occupied.len()).unwrap()).collect();
        let (controller, mut beams) = chain(&tags);
        for (index, &active) in occupied.iter().enumerate() {
            if active {
                beams[index].load_entered(LoadId::new(index as u64));
            }
        }

        let k = 1 + pick.index(occupied.len() - 1);
        let load = LoadId::new(1_000);
        let sensor = beams[k].id();
        beams[k].load_entered(load);

        let decision = controller.on_entering(sensor, load, release, beams.as_mut_slice());
        let expected = if occupied[k - 1] { GateDecision::Hold } else { GateDecision::Pass };
        prop_assert_eq!(decision, expected);
        prop_assert_eq!(beams[k].attached().contains(&load), occupied[k - 1]);
    }

    /// The head holds exactly when release is off.
    #[test]
    fn proptest_head_follows_release(release in any::<bool>(), len in 1..6u32) {
        let tags: Vec<u32> = (0..len).collect();
        let (controller, mut beams) = chain(&tags);
        let head = controller.head().unwrap();
        let decision = controller.on_entering(head, LoadId::new(1), release, beams.as_mut_slice());
        let expected = if release { GateDecision::Pass } else { GateDecision::Hold };
        prop_assert_eq!(decision, expected);
    }
}

// =============================================================================
// Layout properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Every section starts where the one before it ends, for any pose.
    #[test]
    fn proptest_chain_is_continuous(
        sections in prop::collection::vec(arb_section(), 1..7),
        parent in arb_pose(),
    ) {
        let mut conveyor = build(&sections, 3.0);
        conveyor.set_pose(parent);

        let handlers = conveyor.sections();
        let tail = handlers.last().unwrap();
        prop_assert!(pose::coincident(tail.section().local_pose(), &Isometry3::identity(), 1e-12));

        for pair in handlers.windows(2) {
            let end = pair[1].section().connection_global(ConnectionPoint::End, &parent);
            let start = pair[0].section().connection_global(ConnectionPoint::Start, &parent);
            prop_assert!(pose::coincident(&end, &start, 1e-6));
        }
    }

    /// In fixed-length mode the straight sections share the total length.
    #[test]
    fn proptest_straights_share_length(
        sections in prop::collection::vec(arb_section(), 1..7),
        length in 0.5..20.0f64,
    ) {
        let conveyor = build(&sections, length);
        let straights: Vec<f64> = conveyor
            .sections()
            .iter()
            .filter(|h| h.shape() == SectionShape::Straight)
            .map(|h| h.section().length())
            .collect();
        if !straights.is_empty() {
            let total: f64 = straights.iter().sum();
            prop_assert!((total - length).abs() < 1e-9);
        }
    }

    /// Shrinking disposes the highest positions and leaves the rest intact.
    #[test]
    fn proptest_shrink_removes_from_the_end(from in 1..10usize, to in 0..10usize) {
        prop_assume!(to < from);
        let mut conveyor = build(&vec![(SectionShape::Straight, Revolution::Counterclockwise, 1.0, 1.0); from], 5.0);
        let ids: Vec<SensorId> = conveyor.sections().iter().map(SectionHandler::sensor_id).collect();

        conveyor.set_number_of_sections(to).unwrap();
        prop_assert_eq!(conveyor.controller().len(), to);
        prop_assert_eq!(conveyor.controller().chain().collect::<Vec<_>>(), ids[..to].to_vec());
        for id in &ids[to..] {
            prop_assert!(!conveyor.controller().contains(*id));
        }
        let expected_tags: Vec<_> = (0..u32::try_from(to).unwrap()).map(|t| Some(SensorTag::new(t))).collect();
        prop_assert_eq!(conveyor.controller().tags(), expected_tags);
    }

    /// Saved conveyors come back with the same tags, shapes and lengths.
    #[test]
    fn proptest_roundtrip_preserves_chain(
        sections in prop::collection::vec(arb_section(), 0..6),
    ) {
        let original = build(&sections, 2.5);
        let restored = Accumulation::from_json(&original.to_json().unwrap()).unwrap();

        prop_assert_eq!(restored.controller().tags(), original.controller().tags());
        let shapes = |c: &Accumulation| c.sections().iter().map(SectionHandler::shape).collect::<Vec<_>>();
        prop_assert_eq!(shapes(&restored), shapes(&original));
        for (a, b) in restored.sections().iter().zip(original.sections()) {
            prop_assert!((a.section().length() - b.section().length()).abs() < 1e-12);
        }
    }
}
