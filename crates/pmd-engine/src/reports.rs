//! Performance rankings within a group: who is bringing in reservations and
//! which stores are converting them. Cancelled reservations never count.

use serde::{Deserialize, Serialize};

use pmd_schemas::{DocumentStatus, GroupId, Reservation, ReservationStatus, SubscriptionType};
use pmd_store::EntityStore;

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub total: usize,
    pub mnp: usize,
    pub completed: usize,
    pub doc_ready: usize,
    pub with_pre_order: usize,
}

impl Tally {
    fn add(&mut self, r: &Reservation) {
        self.total += 1;
        if r.subscription_type == SubscriptionType::Mnp {
            self.mnp += 1;
        }
        if r.status == ReservationStatus::Completed {
            self.completed += 1;
        }
        if r.document_status == DocumentStatus::Complete {
            self.doc_ready += 1;
        }
        if r.pre_order_number.is_some() {
            self.with_pre_order += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecruiterRow {
    pub recruiter: String,
    pub store_name: String,
    #[serde(flatten)]
    pub tally: Tally,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRow {
    pub store_name: String,
    #[serde(flatten)]
    pub tally: Tally,
}

/// Recruiters ranked by total active reservations, descending (name
/// ascending on ties so the order is deterministic).
pub fn recruiter_ranking(
    store: &EntityStore,
    group_id: GroupId,
) -> Result<Vec<RecruiterRow>, EngineError> {
    let snap = store.read();
    snap.group(group_id)
        .ok_or(EngineError::GroupNotFound(group_id))?;

    let mut rows: std::collections::BTreeMap<String, RecruiterRow> =
        std::collections::BTreeMap::new();
    for r in snap.reservations_by_group(group_id) {
        if r.status == ReservationStatus::Cancelled {
            continue;
        }
        let row = rows
            .entry(r.recruiter.clone())
            .or_insert_with(|| RecruiterRow {
                recruiter: r.recruiter.clone(),
                store_name: r.store_name.clone(),
                tally: Tally::default(),
            });
        row.tally.add(&r);
    }
    let mut out: Vec<RecruiterRow> = rows.into_values().collect();
    out.sort_by(|a, b| {
        b.tally
            .total
            .cmp(&a.tally.total)
            .then_with(|| a.recruiter.cmp(&b.recruiter))
    });
    Ok(out)
}

/// Stores ranked the same way.
pub fn store_ranking(store: &EntityStore, group_id: GroupId) -> Result<Vec<StoreRow>, EngineError> {
    let snap = store.read();
    snap.group(group_id)
        .ok_or(EngineError::GroupNotFound(group_id))?;

    let mut rows: std::collections::BTreeMap<String, StoreRow> = std::collections::BTreeMap::new();
    for r in snap.reservations_by_group(group_id) {
        if r.status == ReservationStatus::Cancelled {
            continue;
        }
        let row = rows.entry(r.store_name.clone()).or_insert_with(|| StoreRow {
            store_name: r.store_name.clone(),
            tally: Tally::default(),
        });
        row.tally.add(&r);
    }
    let mut out: Vec<StoreRow> = rows.into_values().collect();
    out.sort_by(|a, b| {
        b.tally
            .total
            .cmp(&a.tally.total)
            .then_with(|| a.store_name.cmp(&b.store_name))
    });
    Ok(out)
}
