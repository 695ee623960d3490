//! Request/response payloads for the HTTP surface. Engine/report types that
//! already derive serde (MatchPreview, StockRow, ...) are returned directly;
//! this module only adds what the wire needs on top.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use pmd_schemas::{DocumentStatus, GroupId, ReservationId, StorageTier, SubscriptionType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

/// Point-in-time snapshot returned by GET /v1/status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub service: String,
    pub version: String,
    pub uptime_secs: u64,
    pub config_hash: String,
    pub groups: usize,
    pub reservations: usize,
    pub inventory_units: usize,
}

/// Error body for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReservationRequest {
    pub group_id: GroupId,
    pub store_name: String,
    pub recruiter: String,
    pub subscription_type: SubscriptionType,
    pub customer_name: String,
    pub product_number: String,
    pub model: String,
    pub color: String,
    #[serde(default)]
    pub storage: Option<StorageTier>,
    pub activation_timing: String,
    #[serde(default)]
    pub pre_order_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUnitRequest {
    pub group_id: GroupId,
    pub model: String,
    pub color: String,
    #[serde(default)]
    pub storage: Option<StorageTier>,
    pub serial_number: String,
    pub arrival_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkUnitsRequest {
    pub group_id: GroupId,
    pub items: Vec<pmd_engine::BulkUnit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferRequest {
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignRequest {
    pub reservation_id: ReservationId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentStatusRequest {
    pub document_status: DocumentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreOrderRequest {
    #[serde(default)]
    pub pre_order_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceRequest {
    pub model: String,
    pub color: String,
}

// ---------------------------------------------------------------------------
// Query params
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct GroupScope {
    pub group_id: GroupId,
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default)]
    pub matched: Option<bool>,
}
