use fleet_core::{Mmsi, PositionUpdate, Range, UpdateBatch, Vessel};
use fleet_state::{Predicate, VesselFilter};

use crate::helper::{TestHelper, current, forecast, position};

fn fleet() -> TestHelper {
    let mut helper = TestHelper::new();
    helper.apply(UpdateBatch::Position(
        [(1, 2.0, "Class A"), (2, 8.0, "Class A"), (3, 14.0, "Class B"), (4, 35.0, "Class A")]
            .into_iter()
            .map(|(mmsi, sog, vessel_type)| PositionUpdate {
                sog: Some(sog),
                vessel_type: Some(vessel_type.into()),
                ..position(mmsi)
            })
            .collect(),
    ));
    helper.apply(forecast(2, &[(5, 9.1, 56.1)]));
    helper.apply(current(&[(2, 3, 0.75)]));
    helper
}

fn predicates() -> Vec<Predicate> {
    vec![
        Predicate::accept_all(),
        Predicate::new(|_| false),
        Predicate::new(|v| v.sog >= 5.0),
        VesselFilter::default().into(),
        VesselFilter {
            vessel_type: "B".into(),
            ..Default::default()
        }
        .into(),
        VesselFilter {
            cri: "[0.5,1]".parse().unwrap(),
            ..Default::default()
        }
        .into(),
        VesselFilter {
            require_forecast: true,
            sog: Range::unbounded(),
            ..Default::default()
        }
        .into(),
    ]
}

#[test]
fn test_filtered_is_a_subset_satisfying_the_predicate() {
    let mut helper = fleet();
    helper.view.set_keep_selection(false);

    for predicate in predicates() {
        helper.view.set_filter(predicate.clone());
        let filtered = helper.view.filtered_snapshot();
        let snapshot = helper.store.snapshot();

        for (mmsi, vessel) in &filtered.vessels {
            assert!(snapshot.contains(mmsi));
            assert!(predicate.matches(vessel));
        }
        for (mmsi, vessel) in snapshot.iter() {
            assert_eq!(filtered.contains(mmsi), predicate.matches(vessel));
        }
    }
}

#[test]
fn test_reference_filter_conditions() {
    let mut helper = fleet();
    let ids = |helper: &mut TestHelper| -> Vec<Mmsi> {
        helper
            .view
            .filtered_snapshot()
            .vessels
            .keys()
            .cloned()
            .collect()
    };

    helper.view.set_filter(VesselFilter::default());
    assert_eq!(ids(&mut helper), vec![Mmsi::from(1), Mmsi::from(2), Mmsi::from(3)]);

    helper.view.set_filter(VesselFilter {
        cri: "[0.5,1]".parse().unwrap(),
        ..Default::default()
    });
    assert_eq!(ids(&mut helper), vec![Mmsi::from(2), Mmsi::from(3)]);

    helper.view.set_filter(VesselFilter {
        sog: Range::at_least(5.0),
        vessel_type: "Class A".into(),
        ..Default::default()
    });
    assert_eq!(ids(&mut helper), vec![Mmsi::from(2), Mmsi::from(4)]);

    helper.view.set_filter(VesselFilter {
        require_forecast: true,
        ..Default::default()
    });
    assert_eq!(ids(&mut helper), vec![Mmsi::from(2)]);

    helper.view.clear_filter();
    assert_eq!(helper.view.filtered_snapshot().len(), 4);
}

#[test]
fn test_filtered_follows_store_updates() {
    let mut helper = fleet();
    helper.view.set_filter(Predicate::new(|v: &Vessel| v.sog >= 5.0));
    assert!(helper.view.filtered_snapshot().contains(&Mmsi::from(2)));

    helper.apply(UpdateBatch::Position(vec![PositionUpdate {
        sog: Some(1.0),
        ..position(2)
    }]));

    let filtered = helper.view.filtered_snapshot();
    assert!(!filtered.contains(&Mmsi::from(2)));
    assert_eq!(filtered.source.version(), helper.store.snapshot().version());
}

#[test]
fn test_generation_changes_only_when_inputs_change() {
    let mut helper = fleet();

    let first = helper.view.filtered_snapshot().generation;
    assert_eq!(helper.view.filtered_snapshot().generation, first);

    helper.apply(UpdateBatch::Position(vec![position(9)]));
    let second = helper.view.filtered_snapshot().generation;
    assert!(second > first);

    helper.view.select(Mmsi::from(1));
    assert!(helper.view.filtered_snapshot().generation > second);
}

#[test]
fn test_active_vessel_and_partners_survive_the_filter() {
    let mut helper = fleet();
    helper.view.set_filter(Predicate::new(|_| false));
    assert!(helper.view.filtered_snapshot().is_empty());

    helper.view.select(Mmsi::from(2));
    let filtered = helper.view.filtered_snapshot();
    assert_eq!(
        filtered.vessels.keys().cloned().collect::<Vec<_>>(),
        vec![Mmsi::from(2), Mmsi::from(3)]
    );

    helper.view.set_keep_selection(false);
    assert!(helper.view.filtered_snapshot().is_empty());
}
