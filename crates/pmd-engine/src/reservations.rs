//! Reservation intake and lifecycle edits (everything except matching,
//! which lives in [`crate::matching`] / [`crate::manual`]).

use serde::{Deserialize, Serialize};
use tracing::info;

use pmd_schemas::{DocumentStatus, GroupId, Reservation, ReservationId, ReservationStatus};
use pmd_store::{EntityStore, NewReservation};

use crate::error::EngineError;

/// Register a new reservation; enters Pending with paperwork NotStarted.
pub fn register_reservation(
    store: &EntityStore,
    new: NewReservation,
) -> Result<Reservation, EngineError> {
    let mut w = store.write();
    let r = w.insert_reservation(new)?;
    info!(reservation = %r.id, group = %r.group_id, "reservation registered");
    Ok(r)
}

/// Cancel a pending reservation. Completed reservations must be unmatched
/// first; cancelling twice is rejected.
pub fn cancel_reservation(
    store: &EntityStore,
    id: ReservationId,
) -> Result<Reservation, EngineError> {
    let mut w = store.write();
    let r = w.reservation(id).ok_or(EngineError::ReservationNotFound(id))?;
    match r.status {
        ReservationStatus::Completed => return Err(EngineError::ReservationCompleted(id)),
        ReservationStatus::Cancelled => return Err(EngineError::ReservationAlreadyCancelled(id)),
        ReservationStatus::Pending => {}
    }
    let r = w.patch_reservation(id, |r| r.status = ReservationStatus::Cancelled)?;
    Ok(r)
}

/// Update paperwork readiness. Allowed in any state — readiness only gates
/// future matching runs.
pub fn set_document_status(
    store: &EntityStore,
    id: ReservationId,
    status: DocumentStatus,
) -> Result<Reservation, EngineError> {
    let mut w = store.write();
    w.reservation(id).ok_or(EngineError::ReservationNotFound(id))?;
    let r = w.patch_reservation(id, |r| r.document_status = status)?;
    Ok(r)
}

/// Set or clear the carrier pre-order reference number.
pub fn set_pre_order_number(
    store: &EntityStore,
    id: ReservationId,
    pre_order_number: Option<String>,
) -> Result<Reservation, EngineError> {
    let mut w = store.write();
    w.reservation(id).ok_or(EngineError::ReservationNotFound(id))?;
    let r = w.patch_reservation(id, |r| {
        r.pre_order_number = pre_order_number.filter(|n| !n.is_empty());
    })?;
    Ok(r)
}

/// Change the reserved device. Rejected once the reservation is matched —
/// the pairing was made on the old bucket.
pub fn change_device(
    store: &EntityStore,
    id: ReservationId,
    model: String,
    color: String,
) -> Result<Reservation, EngineError> {
    let mut w = store.write();
    let r = w.reservation(id).ok_or(EngineError::ReservationNotFound(id))?;
    if r.status == ReservationStatus::Completed {
        return Err(EngineError::ReservationCompleted(id));
    }
    let r = w.patch_reservation(id, |r| {
        r.model = model;
        r.color = color;
    })?;
    Ok(r)
}

/// Change color only (same guard as [`change_device`]).
pub fn change_color(
    store: &EntityStore,
    id: ReservationId,
    color: String,
) -> Result<Reservation, EngineError> {
    let mut w = store.write();
    let r = w.reservation(id).ok_or(EngineError::ReservationNotFound(id))?;
    if r.status == ReservationStatus::Completed {
        return Err(EngineError::ReservationCompleted(id));
    }
    let r = w.patch_reservation(id, |r| r.color = color)?;
    Ok(r)
}

/// All reservations in a group, newest first; optional store-name filter.
pub fn list_reservations(
    store: &EntityStore,
    group_id: GroupId,
    store_name: Option<&str>,
) -> Result<Vec<Reservation>, EngineError> {
    let snap = store.read();
    snap.group(group_id)
        .ok_or(EngineError::GroupNotFound(group_id))?;
    let mut out = snap.reservations_by_group(group_id);
    if let Some(name) = store_name {
        out.retain(|r| r.store_name == name);
    }
    out.reverse();
    Ok(out)
}

// ---------------------------------------------------------------------------
// Demand view
// ---------------------------------------------------------------------------

/// Per-(model, color) demand counts for the dashboard. Cancelled
/// reservations are excluded entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandRow {
    pub model: String,
    pub color: String,
    pub total: usize,
    pub matched: usize,
    pub doc_complete: usize,
    pub with_pre_order: usize,
}

pub fn demand_overview(
    store: &EntityStore,
    group_id: GroupId,
) -> Result<Vec<DemandRow>, EngineError> {
    let snap = store.read();
    snap.group(group_id)
        .ok_or(EngineError::GroupNotFound(group_id))?;

    let mut rows: std::collections::BTreeMap<(String, String), DemandRow> =
        std::collections::BTreeMap::new();
    for r in snap.reservations_by_group(group_id) {
        if r.status == ReservationStatus::Cancelled {
            continue;
        }
        let row = rows
            .entry((r.model.clone(), r.color.clone()))
            .or_insert_with(|| DemandRow {
                model: r.model.clone(),
                color: r.color.clone(),
                total: 0,
                matched: 0,
                doc_complete: 0,
                with_pre_order: 0,
            });
        row.total += 1;
        if r.status == ReservationStatus::Completed {
            row.matched += 1;
        }
        if r.document_status == DocumentStatus::Complete {
            row.doc_complete += 1;
        }
        if r.pre_order_number.is_some() {
            row.with_pre_order += 1;
        }
    }
    Ok(rows.into_values().collect())
}
