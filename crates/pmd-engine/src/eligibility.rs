//! Eligibility filter: which reservations are automatically matchable and
//! which inventory units are allocable, scoped to one group.
//!
//! Document readiness is a hard gate here — a reservation whose paperwork is
//! not `Complete` never enters automatic matching (it remains targetable via
//! manual override, where readiness is a ranking tier instead).

use std::collections::BTreeMap;

use pmd_schemas::{BucketKey, DocumentStatus, GroupId, InventoryUnit, Reservation, ReservationStatus};
use pmd_store::Tables;

/// Reservations a matching run considers: pending, paperwork complete.
/// Returned in registration order; ranking reorders globally afterwards.
pub fn eligible_reservations(t: &Tables, group_id: GroupId) -> Vec<Reservation> {
    t.reservations_by_group_and_status(group_id, ReservationStatus::Pending)
        .into_iter()
        .filter(|r| r.document_status == DocumentStatus::Complete)
        .collect()
}

/// Units a matching run may consume: unmatched and not transferred out.
pub fn available_units(t: &Tables, group_id: GroupId) -> Vec<InventoryUnit> {
    t.inventory_by_group(group_id)
        .into_iter()
        .filter(|u| !u.matched && !u.transferred)
        .collect()
}

/// Partition units into allocation buckets. Pool order inside a bucket is the
/// store insertion order (`seq`), which is what makes preview and execute
/// walk the same units in the same positions.
pub fn bucket_units(units: Vec<InventoryUnit>) -> BTreeMap<BucketKey, Vec<InventoryUnit>> {
    let mut buckets: BTreeMap<BucketKey, Vec<InventoryUnit>> = BTreeMap::new();
    for unit in units {
        buckets.entry(BucketKey::for_unit(&unit)).or_default().push(unit);
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmd_schemas::{StorageTier, SubscriptionType};
    use pmd_store::{EntityStore, NewInventoryUnit, NewReservation};

    fn seed() -> (EntityStore, GroupId) {
        let store = EntityStore::new();
        let gid = store.write().insert_group("Alpha").id;
        (store, gid)
    }

    fn res(group_id: GroupId) -> NewReservation {
        NewReservation {
            group_id,
            store_name: "Main".into(),
            recruiter: "Kim".into(),
            subscription_type: SubscriptionType::NewLine,
            customer_name: "Lee".into(),
            product_number: "010".into(),
            model: "S26".into(),
            color: "Black".into(),
            storage: None,
            activation_timing: "launch".into(),
            pre_order_number: None,
        }
    }

    #[test]
    fn incomplete_documents_are_a_hard_gate() {
        let (store, gid) = seed();
        let mut w = store.write();
        let a = w.insert_reservation(res(gid)).unwrap();
        let b = w.insert_reservation(res(gid)).unwrap();
        w.patch_reservation(a.id, |r| r.document_status = DocumentStatus::Complete)
            .unwrap();
        w.patch_reservation(b.id, |r| r.document_status = DocumentStatus::OnHold)
            .unwrap();

        let eligible = eligible_reservations(&w, gid);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].id, a.id);
    }

    #[test]
    fn matched_and_transferred_units_are_excluded() {
        let (store, gid) = seed();
        let mut w = store.write();
        for (i, flags) in [(false, false), (true, false), (false, true)].iter().enumerate() {
            let u = w
                .insert_unit(NewInventoryUnit {
                    group_id: gid,
                    model: "S26".into(),
                    color: "Black".into(),
                    storage: Some(StorageTier::Gb512),
                    serial_number: format!("SN-{i}"),
                    arrival_date: chrono::NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
                })
                .unwrap();
            let (matched, transferred) = *flags;
            w.patch_unit(u.id, |u| {
                u.matched = matched;
                u.transferred = transferred;
            })
            .unwrap();
        }
        let avail = available_units(&w, gid);
        assert_eq!(avail.len(), 1);
        assert_eq!(avail[0].serial_number, "SN-0");
    }

    #[test]
    fn missing_storage_joins_the_512gb_bucket() {
        let (store, gid) = seed();
        let mut w = store.write();
        for (i, storage) in [None, Some(StorageTier::Gb512), Some(StorageTier::Tb1)]
            .into_iter()
            .enumerate()
        {
            w.insert_unit(NewInventoryUnit {
                group_id: gid,
                model: "S26".into(),
                color: "Black".into(),
                storage,
                serial_number: format!("SN-{i}"),
                arrival_date: chrono::NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            })
            .unwrap();
        }
        let buckets = bucket_units(available_units(&w, gid));
        assert_eq!(buckets.len(), 2);
        let b512 = buckets
            .get(&BucketKey::new("S26", "Black", None))
            .expect("512GB bucket");
        assert_eq!(b512.len(), 2);
        // Insertion order within the bucket.
        assert_eq!(b512[0].serial_number, "SN-0");
        assert_eq!(b512[1].serial_number, "SN-1");
    }
}
