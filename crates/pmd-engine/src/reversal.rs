//! Reversal: undoing matches, singly or per group, and the deletes whose
//! cleanup rules belong with them.
//!
//! Unmatching tolerates a unit that was hard-deleted after the match — the
//! serial lookup returning nothing means there is nothing left to reconcile,
//! and the reservation still reverts cleanly.

use serde::{Deserialize, Serialize};
use tracing::info;

use pmd_schemas::{
    GroupId, InventoryId, InventoryUnit, Reservation, ReservationId, ReservationStatus,
};
use pmd_store::EntityStore;

use crate::error::EngineError;

/// Result of [`reset_group`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetReport {
    /// Completed reservations reverted to pending.
    pub reset_count: usize,
}

/// Revert one reservation to pending, freeing its unit if it still exists.
pub fn unmatch_reservation(
    store: &EntityStore,
    id: ReservationId,
) -> Result<Reservation, EngineError> {
    let mut w = store.write();
    let serial = w
        .reservation(id)
        .ok_or(EngineError::ReservationNotFound(id))?
        .matched_serial_number
        .clone();

    if let Some(serial) = serial {
        if let Some(unit_id) = w.unit_by_serial(&serial).map(|u| u.id) {
            w.patch_unit(unit_id, |u| u.matched = false)?;
        }
        // No unit with that serial: already deleted, nothing to free.
    }

    let r = w.patch_reservation(id, |r| {
        r.matched_serial_number = None;
        r.status = ReservationStatus::Pending;
    })?;
    Ok(r)
}

/// Inverse entry point: unmatch starting from the unit. The unit must
/// actually be matched; the completed reservation(s) holding its serial are
/// reverted alongside it.
pub fn unmatch_unit(store: &EntityStore, id: InventoryId) -> Result<InventoryUnit, EngineError> {
    let mut w = store.write();
    let unit = w.unit(id).cloned().ok_or(EngineError::UnitNotFound(id))?;
    if !unit.matched {
        return Err(EngineError::UnitNotMatched {
            serial: unit.serial_number,
        });
    }

    let holders: Vec<ReservationId> = w
        .completed_with_serial(&unit.serial_number)
        .into_iter()
        .map(|r| r.id)
        .collect();
    for rid in holders {
        w.patch_reservation(rid, |r| {
            r.matched_serial_number = None;
            r.status = ReservationStatus::Pending;
        })?;
    }

    let u = w.patch_unit(id, |u| u.matched = false)?;
    Ok(u)
}

/// Bulk reversal: every completed reservation in the group goes back to
/// pending, every matched unit in the group back to available. Records are
/// processed independently, all under the one write guard.
pub fn reset_group(store: &EntityStore, group_id: GroupId) -> Result<ResetReport, EngineError> {
    let mut w = store.write();
    w.group(group_id)
        .ok_or(EngineError::GroupNotFound(group_id))?;

    let completed: Vec<ReservationId> = w
        .reservations_by_group_and_status(group_id, ReservationStatus::Completed)
        .into_iter()
        .map(|r| r.id)
        .collect();
    for rid in &completed {
        w.patch_reservation(*rid, |r| {
            r.matched_serial_number = None;
            r.status = ReservationStatus::Pending;
        })?;
    }

    let matched_units: Vec<InventoryId> = w
        .inventory_by_group(group_id)
        .into_iter()
        .filter(|u| u.matched)
        .map(|u| u.id)
        .collect();
    for uid in matched_units {
        w.patch_unit(uid, |u| u.matched = false)?;
    }

    info!(group = %group_id, reset = completed.len(), "matching reset");
    Ok(ResetReport {
        reset_count: completed.len(),
    })
}

/// Hard-delete a reservation from any state. If it was matched, its unit is
/// freed first (symmetric cleanup).
pub fn remove_reservation(
    store: &EntityStore,
    id: ReservationId,
) -> Result<Reservation, EngineError> {
    let mut w = store.write();
    let serial = w
        .reservation(id)
        .ok_or(EngineError::ReservationNotFound(id))?
        .matched_serial_number
        .clone();
    if let Some(serial) = serial {
        if let Some(unit_id) = w.unit_by_serial(&serial).map(|u| u.id) {
            w.patch_unit(unit_id, |u| u.matched = false)?;
        }
    }
    let r = w.delete_reservation(id)?;
    Ok(r)
}

/// Hard-delete an inventory unit. Rejected while it is matched; the caller
/// must unmatch first so no completed reservation is left pointing at a
/// missing serial.
pub fn remove_unit(store: &EntityStore, id: InventoryId) -> Result<InventoryUnit, EngineError> {
    let mut w = store.write();
    let unit = w.unit(id).ok_or(EngineError::UnitNotFound(id))?;
    if unit.matched {
        return Err(EngineError::MatchedUnitUndeletable {
            serial: unit.serial_number.clone(),
        });
    }
    let u = w.delete_unit(id)?;
    Ok(u)
}
