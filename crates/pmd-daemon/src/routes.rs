//! Axum router and all HTTP handlers for pmd-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. All handlers are `pub(crate)` so the scenario tests in
//! `tests/` can compose the router directly.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{delete, get, post},
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;

use pmd_engine::{inventory, manual, matching, reports, reservations, reversal, EngineError};
use pmd_schemas::{Group, GroupId, InventoryId, Reservation, ReservationId};
use pmd_store::NewReservation;

use crate::api_types::{
    AssignRequest, BulkUnitsRequest, CreateGroupRequest, CreateReservationRequest,
    CreateUnitRequest, DeviceRequest, DocumentStatusRequest, ErrorBody, GroupScope,
    HealthResponse, PreOrderRequest, StatusResponse, TransferRequest,
};
use crate::state::{AppState, BusMsg};

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Engine error carried to the wire: 404 for missing records, 409 for
/// domain-rule violations, body is always `{"error": "..."}`.
pub(crate) struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::CONFLICT
        };
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/status", get(status_handler))
        .route("/v1/stream", get(stream))
        .route("/v1/groups", get(list_groups).post(create_group))
        .route(
            "/v1/reservations",
            get(list_reservations).post(create_reservation),
        )
        .route("/v1/reservations/overview", get(demand_overview))
        .route("/v1/reservations/:id", delete(remove_reservation))
        .route("/v1/reservations/:id/cancel", post(cancel_reservation))
        .route("/v1/reservations/:id/unmatch", post(unmatch_reservation))
        .route("/v1/reservations/:id/document-status", post(set_document_status))
        .route("/v1/reservations/:id/pre-order", post(set_pre_order))
        .route("/v1/reservations/:id/device", post(change_device))
        .route("/v1/inventory", get(list_inventory).post(create_unit))
        .route("/v1/inventory/bulk", post(create_units_bulk))
        .route("/v1/inventory/overview", get(stock_overview))
        .route("/v1/inventory/:id", delete(remove_unit))
        .route("/v1/inventory/:id/transfer", post(transfer_unit))
        .route("/v1/inventory/:id/unmatch", post(unmatch_unit))
        .route("/v1/inventory/:id/assignable", get(assignable))
        .route("/v1/inventory/:id/assign", post(assign))
        .route("/v1/matching/:group_id/preview", get(matching_preview))
        .route("/v1/matching/:group_id/execute", post(matching_execute))
        .route("/v1/matching/:group_id/reset", post(matching_reset))
        .route("/v1/reports/recruiters", get(recruiter_ranking))
        .route("/v1/reports/stores", get(store_ranking))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Health / status / stream
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        ok: true,
        service: st.build.service,
        version: st.build.version,
    })
}

pub(crate) async fn status_handler(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let snap = st.store.read();
    Json(StatusResponse {
        service: st.build.service.to_string(),
        version: st.build.version.to_string(),
        uptime_secs: st.uptime_secs(),
        config_hash: st.config_hash.clone(),
        groups: snap.groups().len(),
        reservations: snap.reservation_count(),
        inventory_units: snap.inventory_count(),
    })
}

pub(crate) async fn stream(
    State(st): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = st.bus.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => Event::default().json_data(&m).ok().map(Ok),
            // Lagged receiver: drop the gap, keep streaming.
            Err(_) => None,
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

pub(crate) async fn create_group(
    State(st): State<Arc<AppState>>,
    Json(req): Json<CreateGroupRequest>,
) -> ApiResult<Group> {
    Ok(Json(st.store.write().insert_group(&req.name)))
}

pub(crate) async fn list_groups(State(st): State<Arc<AppState>>) -> ApiResult<Vec<Group>> {
    Ok(Json(st.store.read().groups()))
}

// ---------------------------------------------------------------------------
// Reservations
// ---------------------------------------------------------------------------

pub(crate) async fn create_reservation(
    State(st): State<Arc<AppState>>,
    Json(req): Json<CreateReservationRequest>,
) -> ApiResult<Reservation> {
    let r = reservations::register_reservation(
        &st.store,
        NewReservation {
            group_id: req.group_id,
            store_name: req.store_name,
            recruiter: req.recruiter,
            subscription_type: req.subscription_type,
            customer_name: req.customer_name,
            product_number: req.product_number,
            model: req.model,
            color: req.color,
            storage: req.storage,
            activation_timing: req.activation_timing,
            pre_order_number: req.pre_order_number,
        },
    )?;
    Ok(Json(r))
}

pub(crate) async fn list_reservations(
    State(st): State<Arc<AppState>>,
    Query(scope): Query<GroupScope>,
) -> ApiResult<Vec<Reservation>> {
    let out = reservations::list_reservations(&st.store, scope.group_id, scope.store_name.as_deref())?;
    Ok(Json(out))
}

pub(crate) async fn demand_overview(
    State(st): State<Arc<AppState>>,
    Query(scope): Query<GroupScope>,
) -> ApiResult<Vec<pmd_engine::DemandRow>> {
    Ok(Json(reservations::demand_overview(&st.store, scope.group_id)?))
}

pub(crate) async fn cancel_reservation(
    State(st): State<Arc<AppState>>,
    Path(id): Path<ReservationId>,
) -> ApiResult<Reservation> {
    Ok(Json(reservations::cancel_reservation(&st.store, id)?))
}

pub(crate) async fn unmatch_reservation(
    State(st): State<Arc<AppState>>,
    Path(id): Path<ReservationId>,
) -> ApiResult<Reservation> {
    Ok(Json(reversal::unmatch_reservation(&st.store, id)?))
}

pub(crate) async fn remove_reservation(
    State(st): State<Arc<AppState>>,
    Path(id): Path<ReservationId>,
) -> ApiResult<Reservation> {
    Ok(Json(reversal::remove_reservation(&st.store, id)?))
}

pub(crate) async fn set_document_status(
    State(st): State<Arc<AppState>>,
    Path(id): Path<ReservationId>,
    Json(req): Json<DocumentStatusRequest>,
) -> ApiResult<Reservation> {
    Ok(Json(reservations::set_document_status(
        &st.store,
        id,
        req.document_status,
    )?))
}

pub(crate) async fn set_pre_order(
    State(st): State<Arc<AppState>>,
    Path(id): Path<ReservationId>,
    Json(req): Json<PreOrderRequest>,
) -> ApiResult<Reservation> {
    Ok(Json(reservations::set_pre_order_number(
        &st.store,
        id,
        req.pre_order_number,
    )?))
}

pub(crate) async fn change_device(
    State(st): State<Arc<AppState>>,
    Path(id): Path<ReservationId>,
    Json(req): Json<DeviceRequest>,
) -> ApiResult<Reservation> {
    Ok(Json(reservations::change_device(
        &st.store, id, req.model, req.color,
    )?))
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

pub(crate) async fn create_unit(
    State(st): State<Arc<AppState>>,
    Json(req): Json<CreateUnitRequest>,
) -> ApiResult<pmd_schemas::InventoryUnit> {
    let u = inventory::register_unit(
        &st.store,
        pmd_store::NewInventoryUnit {
            group_id: req.group_id,
            model: req.model,
            color: req.color,
            storage: req.storage,
            serial_number: req.serial_number,
            arrival_date: req.arrival_date,
        },
    )?;
    Ok(Json(u))
}

pub(crate) async fn create_units_bulk(
    State(st): State<Arc<AppState>>,
    Json(req): Json<BulkUnitsRequest>,
) -> ApiResult<Vec<pmd_schemas::InventoryUnit>> {
    Ok(Json(inventory::register_bulk(
        &st.store,
        req.group_id,
        req.items,
    )?))
}

pub(crate) async fn list_inventory(
    State(st): State<Arc<AppState>>,
    Query(scope): Query<GroupScope>,
) -> ApiResult<Vec<pmd_engine::ListedUnit>> {
    Ok(Json(inventory::list_units(
        &st.store,
        scope.group_id,
        scope.matched,
    )?))
}

pub(crate) async fn stock_overview(
    State(st): State<Arc<AppState>>,
    Query(scope): Query<GroupScope>,
) -> ApiResult<Vec<pmd_engine::StockRow>> {
    Ok(Json(inventory::stock_overview(&st.store, scope.group_id)?))
}

pub(crate) async fn transfer_unit(
    State(st): State<Arc<AppState>>,
    Path(id): Path<InventoryId>,
    Json(req): Json<TransferRequest>,
) -> ApiResult<pmd_schemas::InventoryUnit> {
    Ok(Json(inventory::transfer_unit(&st.store, id, req.note)?))
}

pub(crate) async fn unmatch_unit(
    State(st): State<Arc<AppState>>,
    Path(id): Path<InventoryId>,
) -> ApiResult<pmd_schemas::InventoryUnit> {
    Ok(Json(reversal::unmatch_unit(&st.store, id)?))
}

pub(crate) async fn remove_unit(
    State(st): State<Arc<AppState>>,
    Path(id): Path<InventoryId>,
) -> ApiResult<pmd_schemas::InventoryUnit> {
    Ok(Json(reversal::remove_unit(&st.store, id)?))
}

// ---------------------------------------------------------------------------
// Manual override
// ---------------------------------------------------------------------------

pub(crate) async fn assignable(
    State(st): State<Arc<AppState>>,
    Path(id): Path<InventoryId>,
) -> ApiResult<Vec<Reservation>> {
    Ok(Json(manual::assignable_reservations(&st.store, id)?))
}

pub(crate) async fn assign(
    State(st): State<Arc<AppState>>,
    Path(id): Path<InventoryId>,
    Json(req): Json<AssignRequest>,
) -> ApiResult<Reservation> {
    let r = manual::manual_match(&st.store, id, req.reservation_id)?;
    let _ = st.bus.send(BusMsg::ManualMatch {
        reservation_id: r.id,
        serial_number: r.matched_serial_number.clone().unwrap_or_default(),
    });
    Ok(Json(r))
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

pub(crate) async fn matching_preview(
    State(st): State<Arc<AppState>>,
    Path(group_id): Path<GroupId>,
) -> ApiResult<pmd_engine::MatchPreview> {
    Ok(Json(matching::preview(&st.store, group_id)?))
}

pub(crate) async fn matching_execute(
    State(st): State<Arc<AppState>>,
    Path(group_id): Path<GroupId>,
) -> ApiResult<pmd_engine::MatchReport> {
    let report = matching::execute(&st.store, group_id)?;
    let _ = st.bus.send(BusMsg::MatchingExecuted {
        group_id,
        matched: report.matched,
        remaining: report.remaining,
        total_pending: report.total_pending,
    });
    Ok(Json(report))
}

pub(crate) async fn matching_reset(
    State(st): State<Arc<AppState>>,
    Path(group_id): Path<GroupId>,
) -> ApiResult<pmd_engine::ResetReport> {
    let report = reversal::reset_group(&st.store, group_id)?;
    let _ = st.bus.send(BusMsg::MatchingReset {
        group_id,
        reset_count: report.reset_count,
    });
    Ok(Json(report))
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

pub(crate) async fn recruiter_ranking(
    State(st): State<Arc<AppState>>,
    Query(scope): Query<GroupScope>,
) -> ApiResult<Vec<pmd_engine::RecruiterRow>> {
    Ok(Json(reports::recruiter_ranking(&st.store, scope.group_id)?))
}

pub(crate) async fn store_ranking(
    State(st): State<Arc<AppState>>,
    Query(scope): Query<GroupScope>,
) -> ApiResult<Vec<pmd_engine::StoreRow>> {
    Ok(Json(reports::store_ranking(&st.store, scope.group_id)?))
}
