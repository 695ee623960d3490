//! Inventory intake and stock operations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use pmd_schemas::{GroupId, InventoryId, InventoryUnit, ReservationStatus, StorageTier};
use pmd_store::{EntityStore, NewInventoryUnit};

use crate::error::EngineError;

/// One row of a bulk intake (e.g. a CSV line from the carrier's manifest).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUnit {
    pub model: String,
    pub color: String,
    pub storage: Option<StorageTier>,
    pub serial_number: String,
    pub arrival_date: NaiveDate,
}

/// Register a single unit. Duplicate serial is rejected by the store.
pub fn register_unit(
    store: &EntityStore,
    new: NewInventoryUnit,
) -> Result<InventoryUnit, EngineError> {
    let mut w = store.write();
    let u = w.insert_unit(new)?;
    info!(serial = %u.serial_number, group = %u.group_id, "inventory unit registered");
    Ok(u)
}

/// Register a batch, all-or-nothing.
///
/// Every serial — against the store and within the batch itself — is
/// validated before the first insert, so a duplicate anywhere leaves the
/// store untouched rather than half-loaded.
pub fn register_bulk(
    store: &EntityStore,
    group_id: GroupId,
    items: Vec<BulkUnit>,
) -> Result<Vec<InventoryUnit>, EngineError> {
    let mut w = store.write();
    w.group(group_id)
        .ok_or(EngineError::GroupNotFound(group_id))?;

    let mut seen: std::collections::BTreeSet<&str> = std::collections::BTreeSet::new();
    for item in &items {
        if w.unit_by_serial(&item.serial_number).is_some()
            || !seen.insert(item.serial_number.as_str())
        {
            return Err(EngineError::DuplicateSerial(item.serial_number.clone()));
        }
    }

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(w.insert_unit(NewInventoryUnit {
            group_id,
            model: item.model,
            color: item.color,
            storage: item.storage,
            serial_number: item.serial_number,
            arrival_date: item.arrival_date,
        })?);
    }
    info!(group = %group_id, count = out.len(), "bulk inventory registered");
    Ok(out)
}

/// Ship a unit to another location. Terminal for allocation purposes.
/// Matched units must be unmatched first; transferring twice is rejected.
pub fn transfer_unit(
    store: &EntityStore,
    id: InventoryId,
    note: Option<String>,
) -> Result<InventoryUnit, EngineError> {
    let mut w = store.write();
    let unit = w.unit(id).ok_or(EngineError::UnitNotFound(id))?;
    if unit.matched {
        return Err(EngineError::MatchedUnitUntransferable {
            serial: unit.serial_number.clone(),
        });
    }
    if unit.transferred {
        return Err(EngineError::AlreadyTransferred {
            serial: unit.serial_number.clone(),
        });
    }
    let u = w.patch_unit(id, |u| {
        u.transferred = true;
        u.transfer_note = note.filter(|n| !n.is_empty());
    })?;
    info!(serial = %u.serial_number, "unit transferred out");
    Ok(u)
}

// ---------------------------------------------------------------------------
// Stock views
// ---------------------------------------------------------------------------

/// Per-(model, color) stock counts for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRow {
    pub model: String,
    pub color: String,
    pub total: usize,
    pub available: usize,
    pub matched: usize,
    pub transferred: usize,
}

pub fn stock_overview(store: &EntityStore, group_id: GroupId) -> Result<Vec<StockRow>, EngineError> {
    let snap = store.read();
    snap.group(group_id)
        .ok_or(EngineError::GroupNotFound(group_id))?;

    let mut rows: std::collections::BTreeMap<(String, String), StockRow> =
        std::collections::BTreeMap::new();
    for u in snap.inventory_by_group(group_id) {
        let row = rows
            .entry((u.model.clone(), u.color.clone()))
            .or_insert_with(|| StockRow {
                model: u.model.clone(),
                color: u.color.clone(),
                total: 0,
                available: 0,
                matched: 0,
                transferred: 0,
            });
        row.total += 1;
        if u.transferred {
            row.transferred += 1;
        } else if u.matched {
            row.matched += 1;
        } else {
            row.available += 1;
        }
    }
    Ok(rows.into_values().collect())
}

/// An inventory unit annotated with the customer currently holding it
/// (completed reservation carrying the unit's serial), for the stock table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedUnit {
    #[serde(flatten)]
    pub unit: InventoryUnit,
    pub matched_customer_name: Option<String>,
    pub matched_store_name: Option<String>,
}

/// List a group's units, optionally filtered on the matched flag, newest
/// first, each joined to the reservation holding it (if any).
pub fn list_units(
    store: &EntityStore,
    group_id: GroupId,
    matched: Option<bool>,
) -> Result<Vec<ListedUnit>, EngineError> {
    let snap = store.read();
    snap.group(group_id)
        .ok_or(EngineError::GroupNotFound(group_id))?;

    let mut completed = std::collections::BTreeMap::new();
    for r in snap.reservations_by_group_and_status(group_id, ReservationStatus::Completed) {
        if let Some(sn) = r.matched_serial_number.clone() {
            completed.insert(sn, (r.customer_name, r.store_name));
        }
    }

    let mut units = snap.inventory_by_group(group_id);
    units.reverse(); // newest first, like the stock table expects
    Ok(units
        .into_iter()
        .filter(|u| matched.map_or(true, |m| u.matched == m))
        .map(|u| {
            let holder = if u.matched {
                completed.get(&u.serial_number).cloned()
            } else {
                None
            };
            let (matched_customer_name, matched_store_name) = match holder {
                Some((c, s)) => (Some(c), Some(s)),
                None => (None, None),
            };
            ListedUnit {
                unit: u,
                matched_customer_name,
                matched_store_name,
            }
        })
        .collect())
}
