//! Integration tests for aligning hourly damaged profiles with network
//! snapshots and applying them to onwind generators.

mod common;

use chrono::Duration;
use damaged_dispatch::profile::{Resolution, apply_damaged_profile, reconcile};

#[test]
fn full_year_hourly_profile_on_weekly_snapshots() {
    let snapshots = common::timestamps(52, Duration::days(7));
    let hourly = common::profile(common::hourly(8760), &["bus1", "bus2"], |t, j| {
        (t / 168) as f64 + j as f64 * 0.5
    });

    let reconciled = reconcile(hourly, &snapshots).expect("reconcile");

    // 8760 h is 52 full weeks plus one day, so resampling yields 53 bins.
    assert_eq!(
        reconciled.resolution,
        Resolution::Aggregated {
            step: Duration::days(7),
            resampled_len: 53,
        }
    );
    assert_eq!(reconciled.profile.len(), 52);
    assert!(reconciled.profile.len() <= snapshots.len());
    assert_eq!(reconciled.profile.index, snapshots);
    for (week, row) in reconciled.profile.rows.iter().enumerate() {
        assert_eq!(row[0], week as f64);
        assert_eq!(row[1], week as f64 + 0.5);
    }
}

#[test]
fn weekly_profile_lands_on_onwind_generators() {
    let snapshots = common::timestamps(52, Duration::days(7));
    let mut n = common::two_bus_network(snapshots);
    let hourly = common::profile(common::hourly(8760), &["bus1", "bus2"], |_, j| {
        if j == 0 { 0.2 } else { 0.4 }
    });

    let reconciled = reconcile(hourly, &n.snapshots).expect("reconcile");
    let updated = apply_damaged_profile(&mut n, &reconciled).expect("apply");

    assert_eq!(updated, 2);
    let bus1 = &n.generators_t.p_max_pu["bus1 onwind"];
    let bus2 = &n.generators_t.p_max_pu["bus2 onwind"];
    assert_eq!(bus1.len(), 52);
    assert!(bus1.iter().all(|v| (v - 0.2).abs() < 1e-12));
    assert!(bus2.iter().all(|v| (v - 0.4).abs() < 1e-12));
    assert!(!n.generators_t.p_max_pu.contains_key("bus1 gas"));
}

#[test]
fn hourly_network_uses_profile_as_is() {
    let mut n = common::two_bus_network(common::hourly(24));
    let hourly = common::profile(common::hourly(48), &["bus1", "bus2"], |t, _| {
        t as f64 / 100.0
    });

    // 24 snapshots < 48 rows, but the step is one hour: resampling is a no-op
    // on values and the index comes from the snapshots.
    let reconciled = reconcile(hourly, &n.snapshots).expect("reconcile");
    assert_eq!(reconciled.profile.len(), 24);
    apply_damaged_profile(&mut n, &reconciled).expect("apply");
    assert_eq!(n.generators_t.p_max_pu["bus1 onwind"][5], 0.05);
}

#[test]
fn profile_at_least_as_long_as_snapshots_is_unchanged() {
    let snapshots = common::hourly(10);
    let hourly = common::profile(common::hourly(10), &["bus1"], |t, _| t as f64);
    let reconciled = reconcile(hourly.clone(), &snapshots).expect("reconcile");
    assert_eq!(reconciled.resolution, Resolution::Native);
    assert_eq!(reconciled.profile, hourly);
}

#[test]
fn profile_missing_a_bus_column_is_rejected() {
    let mut n = common::two_bus_network(common::hourly(4));
    let hourly = common::profile(common::hourly(4), &["bus1"], |_, _| 0.3);
    let reconciled = reconcile(hourly, &n.snapshots).expect("reconcile");
    assert!(apply_damaged_profile(&mut n, &reconciled).is_err());
}

#[test]
fn profile_shorter_than_aggregated_snapshots_is_rejected() {
    // 10 hourly rows resample to 4 bins of 3 h, fewer than the 6 snapshots
    // would need, but 6 < 10 so aggregation still applies.
    let mut n = common::two_bus_network(common::timestamps(6, Duration::hours(3)));
    let hourly = common::profile(common::hourly(10), &["bus1", "bus2"], |_, _| 0.3);
    let reconciled = reconcile(hourly, &n.snapshots).expect("reconcile");
    assert_eq!(reconciled.profile.len(), 4);
    let err = apply_damaged_profile(&mut n, &reconciled).expect_err("must fail");
    assert!(err.to_string().contains("4 rows"));
}
