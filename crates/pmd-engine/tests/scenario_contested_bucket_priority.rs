//! The canonical allocation scenario: 2 units of (S26, Black, 512GB) vs
//! 3 eligible reservations for that bucket, the carrier-switch customer
//! registered last.

use pmd_engine::matching;
use pmd_schemas::ReservationStatus;
use pmd_store::EntityStore;
use pmd_testkit::contested_bucket;

#[test]
fn mnp_jumps_the_queue_and_latest_new_line_is_short() {
    let store = EntityStore::new();
    let fx = contested_bucket(&store);

    let preview = matching::preview(&store, fx.group.id).unwrap();
    assert_eq!(preview.total_pending, 3);
    assert_eq!(preview.matches.len(), 2);
    assert_eq!(preview.unmatched.len(), 1);

    // Ranked order: the late MNP first, then the earliest new-line.
    assert_eq!(preview.matches[0].reservation_id, fx.late_mnp.id);
    assert_eq!(preview.matches[1].reservation_id, fx.first_new_line.id);
    assert_eq!(preview.unmatched[0].reservation_id, fx.second_new_line.id);

    // Units are consumed in arrival order.
    assert_eq!(preview.matches[0].serial_number, "SN-0001");
    assert_eq!(preview.matches[1].serial_number, "SN-0002");

    // Preview is pure: nothing changed.
    let snap = store.read();
    assert!(snap
        .reservations_by_group(fx.group.id)
        .iter()
        .all(|r| r.status == ReservationStatus::Pending));
    assert!(snap.inventory_by_group(fx.group.id).iter().all(|u| !u.matched));
}

#[test]
fn execute_commits_pairs_one_to_one() {
    let store = EntityStore::new();
    let fx = contested_bucket(&store);

    let report = matching::execute(&store, fx.group.id).unwrap();
    assert_eq!(report.matched, 2);
    assert_eq!(report.remaining, 1);
    assert_eq!(report.total_pending, 3);

    let snap = store.read();
    let mnp = snap.reservation(fx.late_mnp.id).unwrap();
    let first = snap.reservation(fx.first_new_line.id).unwrap();
    let second = snap.reservation(fx.second_new_line.id).unwrap();

    assert_eq!(mnp.status, ReservationStatus::Completed);
    assert_eq!(first.status, ReservationStatus::Completed);
    assert_eq!(second.status, ReservationStatus::Pending);
    assert!(second.matched_serial_number.is_none());

    // One-to-one: both serials assigned, no serial shared, each referenced
    // unit is flagged matched.
    let s1 = mnp.matched_serial_number.clone().unwrap();
    let s2 = first.matched_serial_number.clone().unwrap();
    assert_ne!(s1, s2);
    for s in [&s1, &s2] {
        assert!(snap.unit_by_serial(s).unwrap().matched);
    }
}

#[test]
fn second_execute_is_a_no_op() {
    let store = EntityStore::new();
    let fx = contested_bucket(&store);

    matching::execute(&store, fx.group.id).unwrap();
    let again = matching::execute(&store, fx.group.id).unwrap();

    // The two completed reservations are no longer eligible; the shortage
    // reservation is still pending but its bucket is empty.
    assert_eq!(again.matched, 0);
    assert_eq!(again.total_pending, 1);
    assert_eq!(again.remaining, 1);
}
