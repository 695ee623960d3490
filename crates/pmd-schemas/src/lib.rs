//! pmd-schemas
//!
//! Shared domain records for the pre-order matching desk: reservations,
//! serialized inventory units, and the tenant/store/user records they hang
//! off. Pure data — no storage, no business rules. The Entity Store
//! (pmd-store) owns persistence and sequence assignment; the engine
//! (pmd-engine) owns lifecycle rules.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// Tenant boundary. Matching never pairs records across groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryId(pub Uuid);

macro_rules! impl_id {
    ($t:ident) => {
        impl $t {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }
        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }
        impl std::fmt::Display for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
        impl std::str::FromStr for $t {
            type Err = uuid::Error;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

impl_id!(GroupId);
impl_id!(StoreId);
impl_id!(UserId);
impl_id!(ReservationId);
impl_id!(InventoryId);

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How the customer subscribes. `Mnp` (number portability from another
/// carrier) is commercially prioritized by the matching engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionType {
    /// Brand-new line ("010" number issue).
    NewLine,
    /// Carrier switch, keeping the existing number.
    Mnp,
    /// Same-carrier device upgrade.
    DeviceChange,
}

impl SubscriptionType {
    /// True for the number-port variant that jumps the allocation queue.
    pub fn is_carrier_switch(&self) -> bool {
        matches!(self, Self::Mnp)
    }
}

/// Reservation lifecycle.
///
/// `Pending --[match]--> Completed --[unmatch]--> Pending`;
/// `Pending --[cancel]--> Cancelled`. Hard delete is allowed from any state
/// and frees a linked inventory unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Completed,
    Cancelled,
}

/// Paperwork readiness. Automatic matching only considers `Complete`;
/// manual candidate lists surface the others as a lower tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    NotStarted,
    Complete,
    OnHold,
}

/// Device storage tier. Records created before storage tracking carry `None`
/// in the record; [`StorageTier::FALLBACK`] is applied uniformly wherever the
/// field participates in a bucket key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StorageTier {
    #[serde(rename = "256GB")]
    Gb256,
    #[serde(rename = "512GB")]
    Gb512,
    #[serde(rename = "1TB")]
    Tb1,
}

impl StorageTier {
    /// Default tier assumed for records that predate storage tracking.
    pub const FALLBACK: StorageTier = StorageTier::Gb512;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gb256 => "256GB",
            Self::Gb512 => "512GB",
            Self::Tb1 => "1TB",
        }
    }

    /// Resolve an optional stored value to a concrete tier.
    pub fn resolve(opt: Option<StorageTier>) -> StorageTier {
        opt.unwrap_or(Self::FALLBACK)
    }
}

impl std::fmt::Display for StorageTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StorageTier {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "256GB" => Ok(Self::Gb256),
            "512GB" => Ok(Self::Gb512),
            "1TB" => Ok(Self::Tb1),
            other => Err(format!("unknown storage tier '{other}'")),
        }
    }
}

/// Operator role. Carried as data on [`User`]; authorization itself lives in
/// the calling layer, not in this subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    GroupAdmin,
    Staff,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreFront {
    pub id: StoreId,
    pub group_id: GroupId,
    pub name: String,
    /// Carrier point-of-sale code.
    pub p_code: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub login_id: String,
    pub name: String,
    pub role: Role,
    pub group_id: Option<GroupId>,
    pub store_id: Option<StoreId>,
    pub is_active: bool,
}

/// A customer pre-order reservation.
///
/// `seq` is assigned by the Entity Store at insert time and is strictly
/// monotonic across the whole store; it is the registration-order tie-break
/// used by priority ranking (wall-clock `registered_at` can collide,
/// `seq` cannot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub group_id: GroupId,
    pub store_name: String,
    pub recruiter: String,
    pub subscription_type: SubscriptionType,
    pub customer_name: String,
    /// Customer phone number on the order form.
    pub product_number: String,
    pub model: String,
    pub color: String,
    pub storage: Option<StorageTier>,
    pub activation_timing: String,
    pub pre_order_number: Option<String>,
    /// Set iff `status == Completed`; references exactly one inventory unit.
    pub matched_serial_number: Option<String>,
    pub status: ReservationStatus,
    pub document_status: DocumentStatus,
    pub registered_at: DateTime<Utc>,
    pub seq: u64,
}

/// One physical handset, identified by its serial number (globally unique).
///
/// `matched` and `transferred` are mutually exclusive entry points: a matched
/// unit cannot be transferred and a transferred unit cannot be matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryUnit {
    pub id: InventoryId,
    pub group_id: GroupId,
    pub model: String,
    pub color: String,
    pub storage: Option<StorageTier>,
    pub serial_number: String,
    pub matched: bool,
    /// Shipped to another location; out of the allocable pool for good.
    pub transferred: bool,
    pub transfer_note: Option<String>,
    pub arrival_date: NaiveDate,
    pub seq: u64,
}

// ---------------------------------------------------------------------------
// BucketKey
// ---------------------------------------------------------------------------

/// Allocation bucket: `(model, color, storage)` with the storage fallback
/// already resolved.
///
/// Both sides of a match MUST build their key through the constructors below
/// so that a reservation with no recorded storage and a unit with no recorded
/// storage land in the same bucket. Building the key by hand risks silently
/// splitting buckets.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BucketKey {
    pub model: String,
    pub color: String,
    pub storage: StorageTier,
}

impl BucketKey {
    pub fn new(model: &str, color: &str, storage: Option<StorageTier>) -> Self {
        Self {
            model: model.to_string(),
            color: color.to_string(),
            storage: StorageTier::resolve(storage),
        }
    }

    pub fn for_reservation(r: &Reservation) -> Self {
        Self::new(&r.model, &r.color, r.storage)
    }

    pub fn for_unit(u: &InventoryUnit) -> Self {
        Self::new(&u.model, &u.color, u.storage)
    }
}

impl std::fmt::Display for BucketKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.model, self.color, self.storage)
    }
}
