//! pmd-store: the Entity Store.
//!
//! An in-memory, single-writer document store for the matching desk. The
//! original system ran on a hosted transactional document store; here the
//! atomic-multi-write primitive is a single exclusive guard:
//!
//! - [`EntityStore::read`] yields a consistent snapshot for pure queries
//!   (matching preview, dashboards).
//! - [`EntityStore::write`] yields the one writer. Every domain mutation —
//!   including the two-record writes of a match/unmatch pair — runs to
//!   completion under one guard, so no reader or competing writer can observe
//!   half of a pairing, and concurrent `execute` calls on the same group
//!   cannot double-assign a unit.
//!
//! The store also owns two invariants the engine relies on:
//! - serial-number uniqueness across all inventory units (insert is rejected,
//!   the index is maintained on patch/delete);
//! - the global monotonic `seq` counter stamped on reservations and units at
//!   insert, used as the stable registration-order tie-break.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{NaiveDate, Utc};
use pmd_schemas::{
    DocumentStatus, Group, GroupId, InventoryId, InventoryUnit, Reservation, ReservationId,
    ReservationStatus, StorageTier, StoreFront, StoreId, SubscriptionType,
};

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    GroupNotFound(GroupId),
    ReservationNotFound(ReservationId),
    UnitNotFound(InventoryId),
    /// A unit with this serial number already exists somewhere in the store.
    DuplicateSerial(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GroupNotFound(id) => write!(f, "group {id} not found"),
            Self::ReservationNotFound(id) => write!(f, "reservation {id} not found"),
            Self::UnitNotFound(id) => write!(f, "inventory unit {id} not found"),
            Self::DuplicateSerial(sn) => {
                write!(f, "serial number '{sn}' is already registered")
            }
        }
    }
}

impl std::error::Error for StoreError {}

// ---------------------------------------------------------------------------
// New-record payloads
// ---------------------------------------------------------------------------

/// Insert payload for a reservation. The store assigns id, `seq`,
/// `registered_at`, and the initial lifecycle fields (Pending / NotStarted,
/// no matched serial).
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub group_id: GroupId,
    pub store_name: String,
    pub recruiter: String,
    pub subscription_type: SubscriptionType,
    pub customer_name: String,
    pub product_number: String,
    pub model: String,
    pub color: String,
    pub storage: Option<StorageTier>,
    pub activation_timing: String,
    pub pre_order_number: Option<String>,
}

/// Insert payload for an inventory unit. The store assigns id and `seq` and
/// starts the unit unmatched / untransferred.
#[derive(Debug, Clone)]
pub struct NewInventoryUnit {
    pub group_id: GroupId,
    pub model: String,
    pub color: String,
    pub storage: Option<StorageTier>,
    pub serial_number: String,
    pub arrival_date: NaiveDate,
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// All tables plus the secondary serial index. Only reachable through the
/// read/write guards below.
#[derive(Debug, Default)]
pub struct Tables {
    seq: u64,
    groups: BTreeMap<GroupId, Group>,
    store_fronts: BTreeMap<StoreId, StoreFront>,
    reservations: BTreeMap<ReservationId, Reservation>,
    inventory: BTreeMap<InventoryId, InventoryUnit>,
    by_serial: BTreeMap<String, InventoryId>,
}

impl Tables {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    // -- group / store queries ----------------------------------------------

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    pub fn groups(&self) -> Vec<Group> {
        self.groups.values().cloned().collect()
    }

    pub fn store_fronts_by_group(&self, group_id: GroupId) -> Vec<StoreFront> {
        self.store_fronts
            .values()
            .filter(|s| s.group_id == group_id)
            .cloned()
            .collect()
    }

    pub fn reservation_count(&self) -> usize {
        self.reservations.len()
    }

    pub fn inventory_count(&self) -> usize {
        self.inventory.len()
    }

    // -- reservation queries ------------------------------------------------

    pub fn reservation(&self, id: ReservationId) -> Option<&Reservation> {
        self.reservations.get(&id)
    }

    /// All reservations in a group, registration order (`seq` ascending).
    pub fn reservations_by_group(&self, group_id: GroupId) -> Vec<Reservation> {
        let mut out: Vec<Reservation> = self
            .reservations
            .values()
            .filter(|r| r.group_id == group_id)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.seq);
        out
    }

    /// Group + status slice of the reservations table, registration order.
    pub fn reservations_by_group_and_status(
        &self,
        group_id: GroupId,
        status: ReservationStatus,
    ) -> Vec<Reservation> {
        let mut out: Vec<Reservation> = self
            .reservations
            .values()
            .filter(|r| r.group_id == group_id && r.status == status)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.seq);
        out
    }

    /// Completed reservations currently holding the given serial. The
    /// one-to-one invariant makes >1 element a consistency fault; reversal
    /// still sweeps all of them so a damaged store can be repaired.
    pub fn completed_with_serial(&self, serial: &str) -> Vec<Reservation> {
        self.reservations
            .values()
            .filter(|r| {
                r.status == ReservationStatus::Completed
                    && r.matched_serial_number.as_deref() == Some(serial)
            })
            .cloned()
            .collect()
    }

    // -- inventory queries --------------------------------------------------

    pub fn unit(&self, id: InventoryId) -> Option<&InventoryUnit> {
        self.inventory.get(&id)
    }

    pub fn unit_by_serial(&self, serial: &str) -> Option<&InventoryUnit> {
        self.by_serial.get(serial).and_then(|id| self.inventory.get(id))
    }

    /// All units in a group, arrival (insert) order. Bucket pools consume in
    /// this order, so it must be stable between preview and execute.
    pub fn inventory_by_group(&self, group_id: GroupId) -> Vec<InventoryUnit> {
        let mut out: Vec<InventoryUnit> = self
            .inventory
            .values()
            .filter(|u| u.group_id == group_id)
            .cloned()
            .collect();
        out.sort_by_key(|u| u.seq);
        out
    }
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Shared snapshot. All query methods live on [`Tables`].
pub struct Snapshot<'a>(RwLockReadGuard<'a, Tables>);

impl std::ops::Deref for Snapshot<'_> {
    type Target = Tables;
    fn deref(&self) -> &Tables {
        &self.0
    }
}

/// The single writer. Mutations are methods here; queries deref to
/// [`Tables`], so a mutation can re-read its own uncommitted view — the
/// consistent-snapshot requirement of the matching engine's `execute`.
pub struct Writer<'a>(RwLockWriteGuard<'a, Tables>);

impl std::ops::Deref for Writer<'_> {
    type Target = Tables;
    fn deref(&self) -> &Tables {
        &self.0
    }
}

impl Writer<'_> {
    // -- groups / stores ----------------------------------------------------

    pub fn insert_group(&mut self, name: &str) -> Group {
        let group = Group {
            id: GroupId::new(),
            name: name.to_string(),
            is_active: true,
        };
        self.0.groups.insert(group.id, group.clone());
        group
    }

    pub fn insert_store_front(&mut self, group_id: GroupId, name: &str, p_code: &str) -> Result<StoreFront, StoreError> {
        if !self.0.groups.contains_key(&group_id) {
            return Err(StoreError::GroupNotFound(group_id));
        }
        let sf = StoreFront {
            id: StoreId::new(),
            group_id,
            name: name.to_string(),
            p_code: p_code.to_string(),
            is_active: true,
        };
        self.0.store_fronts.insert(sf.id, sf.clone());
        Ok(sf)
    }

    // -- reservations -------------------------------------------------------

    pub fn insert_reservation(&mut self, new: NewReservation) -> Result<Reservation, StoreError> {
        if !self.0.groups.contains_key(&new.group_id) {
            return Err(StoreError::GroupNotFound(new.group_id));
        }
        let seq = self.0.next_seq();
        let r = Reservation {
            id: ReservationId::new(),
            group_id: new.group_id,
            store_name: new.store_name,
            recruiter: new.recruiter,
            subscription_type: new.subscription_type,
            customer_name: new.customer_name,
            product_number: new.product_number,
            model: new.model,
            color: new.color,
            storage: new.storage,
            activation_timing: new.activation_timing,
            pre_order_number: new.pre_order_number,
            matched_serial_number: None,
            status: ReservationStatus::Pending,
            document_status: DocumentStatus::NotStarted,
            registered_at: Utc::now(),
            seq,
        };
        self.0.reservations.insert(r.id, r.clone());
        Ok(r)
    }

    /// Atomic single-record update. The closure sees the live record; the
    /// updated copy is returned.
    pub fn patch_reservation<F>(&mut self, id: ReservationId, f: F) -> Result<Reservation, StoreError>
    where
        F: FnOnce(&mut Reservation),
    {
        let r = self
            .0
            .reservations
            .get_mut(&id)
            .ok_or(StoreError::ReservationNotFound(id))?;
        f(r);
        Ok(r.clone())
    }

    pub fn delete_reservation(&mut self, id: ReservationId) -> Result<Reservation, StoreError> {
        self.0
            .reservations
            .remove(&id)
            .ok_or(StoreError::ReservationNotFound(id))
    }

    // -- inventory ----------------------------------------------------------

    /// Insert a unit, enforcing global serial uniqueness.
    pub fn insert_unit(&mut self, new: NewInventoryUnit) -> Result<InventoryUnit, StoreError> {
        if !self.0.groups.contains_key(&new.group_id) {
            return Err(StoreError::GroupNotFound(new.group_id));
        }
        if self.0.by_serial.contains_key(&new.serial_number) {
            return Err(StoreError::DuplicateSerial(new.serial_number));
        }
        let seq = self.0.next_seq();
        let u = InventoryUnit {
            id: InventoryId::new(),
            group_id: new.group_id,
            model: new.model,
            color: new.color,
            storage: new.storage,
            serial_number: new.serial_number,
            matched: false,
            transferred: false,
            transfer_note: None,
            arrival_date: new.arrival_date,
            seq,
        };
        self.0.by_serial.insert(u.serial_number.clone(), u.id);
        self.0.inventory.insert(u.id, u.clone());
        Ok(u)
    }

    /// Atomic single-record update. Re-keys the serial index if the closure
    /// rewrote the serial; a rename to a taken serial rejects the whole patch
    /// and restores the record as it was.
    pub fn patch_unit<F>(&mut self, id: InventoryId, f: F) -> Result<InventoryUnit, StoreError>
    where
        F: FnOnce(&mut InventoryUnit),
    {
        let before = self
            .0
            .inventory
            .get(&id)
            .ok_or(StoreError::UnitNotFound(id))?
            .clone();
        let new_serial = {
            let u = self.0.inventory.get_mut(&id).ok_or(StoreError::UnitNotFound(id))?;
            f(u);
            u.serial_number.clone()
        };
        if new_serial != before.serial_number {
            if self.0.by_serial.contains_key(&new_serial) {
                self.0.inventory.insert(id, before);
                return Err(StoreError::DuplicateSerial(new_serial));
            }
            self.0.by_serial.remove(&before.serial_number);
            self.0.by_serial.insert(new_serial, id);
        }
        Ok(self.0.inventory[&id].clone())
    }

    pub fn delete_unit(&mut self, id: InventoryId) -> Result<InventoryUnit, StoreError> {
        let u = self
            .0
            .inventory
            .remove(&id)
            .ok_or(StoreError::UnitNotFound(id))?;
        self.0.by_serial.remove(&u.serial_number);
        Ok(u)
    }
}

// ---------------------------------------------------------------------------
// EntityStore
// ---------------------------------------------------------------------------

/// Handle shared across the daemon, the engine, and tests (wrap in `Arc`).
#[derive(Debug, Default)]
pub struct EntityStore {
    tables: RwLock<Tables>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consistent read snapshot.
    pub fn read(&self) -> Snapshot<'_> {
        Snapshot(self.tables.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// The single writer. Holding this guard serializes every mutation in the
    /// process, including whole `execute` runs.
    pub fn write(&self) -> Writer<'_> {
        Writer(self.tables.write().unwrap_or_else(|e| e.into_inner()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_unit(group_id: GroupId, serial: &str) -> NewInventoryUnit {
        NewInventoryUnit {
            group_id,
            model: "S26".into(),
            color: "Black".into(),
            storage: Some(StorageTier::Gb512),
            serial_number: serial.into(),
            arrival_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        }
    }

    #[test]
    fn seq_is_strictly_monotonic_across_tables() {
        let store = EntityStore::new();
        let mut w = store.write();
        let g = w.insert_group("Alpha");
        let u1 = w.insert_unit(new_unit(g.id, "SN-1")).unwrap();
        let r1 = w
            .insert_reservation(NewReservation {
                group_id: g.id,
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
            })
            .unwrap();
        let u2 = w.insert_unit(new_unit(g.id, "SN-2")).unwrap();
        assert!(u1.seq < r1.seq && r1.seq < u2.seq);
    }

    #[test]
    fn duplicate_serial_insert_is_rejected() {
        let store = EntityStore::new();
        let mut w = store.write();
        let g = w.insert_group("Alpha");
        w.insert_unit(new_unit(g.id, "SN-1")).unwrap();
        let err = w.insert_unit(new_unit(g.id, "SN-1")).unwrap_err();
        assert_eq!(err, StoreError::DuplicateSerial("SN-1".into()));
    }

    #[test]
    fn delete_frees_the_serial_for_reuse() {
        let store = EntityStore::new();
        let mut w = store.write();
        let g = w.insert_group("Alpha");
        let u = w.insert_unit(new_unit(g.id, "SN-1")).unwrap();
        w.delete_unit(u.id).unwrap();
        assert!(w.unit_by_serial("SN-1").is_none());
        w.insert_unit(new_unit(g.id, "SN-1")).unwrap();
    }

    #[test]
    fn patch_rekeys_serial_index_and_rejects_collision() {
        let store = EntityStore::new();
        let mut w = store.write();
        let g = w.insert_group("Alpha");
        let a = w.insert_unit(new_unit(g.id, "SN-A")).unwrap();
        w.insert_unit(new_unit(g.id, "SN-B")).unwrap();

        // A rejected rename must leave no trace, including the other fields
        // the closure touched.
        let before = w.unit(a.id).unwrap().clone();
        let err = w
            .patch_unit(a.id, |u| {
                u.serial_number = "SN-B".into();
                u.matched = true;
                u.transfer_note = Some("half-applied".into());
            })
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateSerial("SN-B".into()));
        assert_eq!(w.unit(a.id).unwrap(), &before);

        w.patch_unit(a.id, |u| u.serial_number = "SN-C".into()).unwrap();
        assert!(w.unit_by_serial("SN-A").is_none());
        assert_eq!(w.unit_by_serial("SN-C").unwrap().id, a.id);
    }
}
