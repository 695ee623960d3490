//! The matching engine.
//!
//! One algorithm, two entry points:
//! - [`preview`] runs it against a read snapshot and reports what would
//!   happen — strictly pure.
//! - [`execute`] runs it under the store's exclusive write guard and commits
//!   every planned pair. The eligibility read and all pair writes happen
//!   under the same guard, so the run sees a consistent snapshot of its own
//!   group and concurrent runs cannot double-assign a unit.
//!
//! Ranking is global per group; consumption is per bucket via a local cursor
//! map that lives only for the duration of the run. Shortage (an eligible
//! reservation whose bucket ran dry, or whose bucket has no inventory at
//! all) is a normal outcome counted in `remaining`, never an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use pmd_schemas::{
    BucketKey, GroupId, InventoryId, ReservationId, ReservationStatus, StorageTier,
};
use pmd_store::{EntityStore, Tables};

use crate::eligibility::{available_units, bucket_units, eligible_reservations};
use crate::error::EngineError;
use crate::ranking::rank_for_matching;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// One reservation↔unit pairing the algorithm decided on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedMatch {
    pub reservation_id: ReservationId,
    pub inventory_id: InventoryId,
    pub customer_name: String,
    pub model: String,
    pub color: String,
    pub storage: StorageTier,
    pub serial_number: String,
}

/// An eligible reservation left without a unit this run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortfallEntry {
    pub reservation_id: ReservationId,
    pub customer_name: String,
    pub model: String,
    pub color: String,
    pub storage: StorageTier,
}

/// Result of [`preview`]: the full would-be pairing list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPreview {
    pub matches: Vec<PlannedMatch>,
    pub unmatched: Vec<ShortfallEntry>,
    pub total_pending: usize,
}

/// Result of [`execute`]: counts only. `total_pending == matched + remaining`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    pub matched: usize,
    pub remaining: usize,
    pub total_pending: usize,
}

// ---------------------------------------------------------------------------
// Algorithm
// ---------------------------------------------------------------------------

/// The shared walk: rank eligible reservations globally, consume bucket
/// pools positionally.
fn plan(t: &Tables, group_id: GroupId) -> MatchPreview {
    let mut reservations = eligible_reservations(t, group_id);
    rank_for_matching(&mut reservations);

    let buckets = bucket_units(available_units(t, group_id));

    // Per-run consumption cursors, keyed by bucket. Local to this call.
    let mut cursors: BTreeMap<BucketKey, usize> = BTreeMap::new();

    let total_pending = reservations.len();
    let mut matches = Vec::new();
    let mut unmatched = Vec::new();

    for r in reservations {
        let key = BucketKey::for_reservation(&r);
        let cursor = cursors.entry(key.clone()).or_insert(0);
        match buckets.get(&key).and_then(|pool| pool.get(*cursor)) {
            Some(unit) => {
                *cursor += 1;
                matches.push(PlannedMatch {
                    reservation_id: r.id,
                    inventory_id: unit.id,
                    customer_name: r.customer_name,
                    model: r.model,
                    color: r.color,
                    storage: key.storage,
                    serial_number: unit.serial_number.clone(),
                });
            }
            None => unmatched.push(ShortfallEntry {
                reservation_id: r.id,
                customer_name: r.customer_name,
                model: r.model,
                color: r.color,
                storage: key.storage,
            }),
        }
    }

    MatchPreview {
        matches,
        unmatched,
        total_pending,
    }
}

fn ensure_group(t: &Tables, group_id: GroupId) -> Result<(), EngineError> {
    t.group(group_id)
        .map(|_| ())
        .ok_or(EngineError::GroupNotFound(group_id))
}

/// Pure simulation of a matching run. Mutates nothing.
pub fn preview(store: &EntityStore, group_id: GroupId) -> Result<MatchPreview, EngineError> {
    let snap = store.read();
    ensure_group(&snap, group_id)?;
    Ok(plan(&snap, group_id))
}

/// Run the algorithm and commit every pairing.
///
/// Each pair is two record writes (reservation → Completed + serial, unit →
/// matched); both happen under the one write guard held for the whole call.
pub fn execute(store: &EntityStore, group_id: GroupId) -> Result<MatchReport, EngineError> {
    let mut w = store.write();
    ensure_group(&w, group_id)?;
    let planned = plan(&w, group_id);

    for m in &planned.matches {
        let serial = m.serial_number.clone();
        w.patch_reservation(m.reservation_id, |r| {
            r.status = ReservationStatus::Completed;
            r.matched_serial_number = Some(serial);
        })?;
        w.patch_unit(m.inventory_id, |u| u.matched = true)?;
    }

    let report = MatchReport {
        matched: planned.matches.len(),
        remaining: planned.total_pending - planned.matches.len(),
        total_pending: planned.total_pending,
    };
    info!(
        group = %group_id,
        matched = report.matched,
        remaining = report.remaining,
        "matching run committed"
    );
    Ok(report)
}
