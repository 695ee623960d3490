//! Engine error taxonomy.
//!
//! Two families matter to callers: missing records (surface as 404 at the
//! HTTP edge) and domain-rule violations (409). Inventory shortage is NOT an
//! error anywhere in this crate — it is reported through the counts on
//! [`crate::matching::MatchReport`].

use pmd_schemas::{GroupId, InventoryId, ReservationId};
use pmd_store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    // -- not found ----------------------------------------------------------
    GroupNotFound(GroupId),
    ReservationNotFound(ReservationId),
    UnitNotFound(InventoryId),

    // -- precondition failed ------------------------------------------------
    /// A unit with this serial number already exists (single or bulk insert).
    DuplicateSerial(String),
    /// Target unit of a manual match is already matched.
    UnitAlreadyMatched { serial: String },
    /// Target unit of a manual match has been transferred out.
    UnitTransferred { serial: String },
    /// Unmatch requested on a unit that is not matched.
    UnitNotMatched { serial: String },
    /// Delete requested on a matched unit; unmatch first.
    MatchedUnitUndeletable { serial: String },
    /// Transfer requested on a matched unit; unmatch first.
    MatchedUnitUntransferable { serial: String },
    /// Transfer requested on an already-transferred unit.
    AlreadyTransferred { serial: String },
    /// Manual match requested for a reservation that is already completed.
    ReservationAlreadyMatched(ReservationId),
    /// Cancel or model/color change requested on a completed reservation.
    ReservationCompleted(ReservationId),
    /// Cancel requested twice.
    ReservationAlreadyCancelled(ReservationId),
}

impl EngineError {
    /// True for the missing-record family (HTTP 404); everything else is a
    /// domain-rule violation (HTTP 409).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::GroupNotFound(_) | Self::ReservationNotFound(_) | Self::UnitNotFound(_)
        )
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GroupNotFound(id) => write!(f, "group {id} not found"),
            Self::ReservationNotFound(id) => write!(f, "reservation {id} not found"),
            Self::UnitNotFound(id) => write!(f, "inventory unit {id} not found"),
            Self::DuplicateSerial(sn) => {
                write!(f, "serial number '{sn}' is already registered")
            }
            Self::UnitAlreadyMatched { serial } => {
                write!(f, "unit '{serial}' is already matched")
            }
            Self::UnitTransferred { serial } => {
                write!(f, "unit '{serial}' was transferred out and cannot be assigned")
            }
            Self::UnitNotMatched { serial } => {
                write!(f, "unit '{serial}' is not matched")
            }
            Self::MatchedUnitUndeletable { serial } => {
                write!(f, "unit '{serial}' is matched and cannot be deleted; unmatch it first")
            }
            Self::MatchedUnitUntransferable { serial } => {
                write!(f, "unit '{serial}' is matched and cannot be transferred; unmatch it first")
            }
            Self::AlreadyTransferred { serial } => {
                write!(f, "unit '{serial}' was already transferred out")
            }
            Self::ReservationAlreadyMatched(id) => {
                write!(f, "reservation {id} is already matched")
            }
            Self::ReservationCompleted(id) => {
                write!(f, "reservation {id} is matched; unmatch it before changing or cancelling")
            }
            Self::ReservationAlreadyCancelled(id) => {
                write!(f, "reservation {id} is already cancelled")
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::GroupNotFound(id) => Self::GroupNotFound(id),
            StoreError::ReservationNotFound(id) => Self::ReservationNotFound(id),
            StoreError::UnitNotFound(id) => Self::UnitNotFound(id),
            StoreError::DuplicateSerial(sn) => Self::DuplicateSerial(sn),
        }
    }
}
