//! Manual override: an operator hand-picks a unit for a reservation.
//!
//! Candidate lists match on `(model, color)` only — storage is deliberately
//! not filtered here, the operator decides — and readiness is a visible
//! ranking tier rather than a gate. The pairing itself enforces exactly the
//! same consistency invariants as an automatic pairing step.

use tracing::info;

use pmd_schemas::{InventoryId, Reservation, ReservationId, ReservationStatus};
use pmd_store::EntityStore;

use crate::error::EngineError;
use crate::ranking::rank_for_manual;

/// Pending reservations the given unit could serve, in manual priority
/// order (MNP, then paperwork complete, then registration order).
pub fn assignable_reservations(
    store: &EntityStore,
    unit_id: InventoryId,
) -> Result<Vec<Reservation>, EngineError> {
    let snap = store.read();
    let unit = snap
        .unit(unit_id)
        .cloned()
        .ok_or(EngineError::UnitNotFound(unit_id))?;

    let mut candidates: Vec<Reservation> = snap
        .reservations_by_group_and_status(unit.group_id, ReservationStatus::Pending)
        .into_iter()
        .filter(|r| r.model == unit.model && r.color == unit.color)
        .collect();
    rank_for_manual(&mut candidates);
    Ok(candidates)
}

/// Pair one specific unit with one specific reservation.
///
/// Preconditions (each rejected with its own error, never a silent no-op):
/// the unit exists, is unmatched, and has not been transferred out; the
/// reservation exists and is not already completed. A cancelled reservation
/// IS matchable — the override revives it to completed, which is the
/// operator escape hatch for a customer who came back.
pub fn manual_match(
    store: &EntityStore,
    unit_id: InventoryId,
    reservation_id: ReservationId,
) -> Result<Reservation, EngineError> {
    let mut w = store.write();

    let unit = w
        .unit(unit_id)
        .cloned()
        .ok_or(EngineError::UnitNotFound(unit_id))?;
    if unit.matched {
        return Err(EngineError::UnitAlreadyMatched {
            serial: unit.serial_number,
        });
    }
    if unit.transferred {
        return Err(EngineError::UnitTransferred {
            serial: unit.serial_number,
        });
    }

    let reservation = w
        .reservation(reservation_id)
        .ok_or(EngineError::ReservationNotFound(reservation_id))?;
    if reservation.status == ReservationStatus::Completed {
        return Err(EngineError::ReservationAlreadyMatched(reservation_id));
    }

    // Both writes commit under the guard held since the checks above.
    let serial = unit.serial_number.clone();
    let r = w.patch_reservation(reservation_id, |r| {
        r.status = ReservationStatus::Completed;
        r.matched_serial_number = Some(serial);
    })?;
    w.patch_unit(unit_id, |u| u.matched = true)?;

    info!(
        reservation = %reservation_id,
        serial = %unit.serial_number,
        "manual match committed"
    );
    Ok(r)
}
