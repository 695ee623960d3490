//! Shared runtime state for pmd-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The Entity Store does
//! its own locking; nothing here is async-mutable except the broadcast bus.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pmd_schemas::{GroupId, ReservationId};
use pmd_store::EntityStore;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// BusMsg — SSE event bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast over the internal event bus and surfaced as SSE
/// events, so a dashboard can refresh without polling.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat {
        ts_millis: i64,
    },
    MatchingExecuted {
        group_id: GroupId,
        matched: usize,
        remaining: usize,
        total_pending: usize,
    },
    MatchingReset {
        group_id: GroupId,
        reset_count: usize,
    },
    ManualMatch {
        reservation_id: ReservationId,
        serial_number: String,
    },
}

/// Static build metadata included in health / status responses.
#[derive(Clone, Copy, Debug)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Cloneable (Arc) handle shared across all Axum handlers.
pub struct AppState {
    pub store: Arc<EntityStore>,
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    pub build: BuildInfo,
    /// Hash of the effective config this daemon booted with.
    pub config_hash: String,
    started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<EntityStore>, config_hash: String) -> Self {
        let (bus, _) = broadcast::channel(256);
        Self {
            store,
            bus,
            build: BuildInfo {
                service: "pmd-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            config_hash,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Periodic heartbeat onto the bus; keeps SSE connections warm.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, every: Duration) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        loop {
            tick.tick().await;
            let _ = bus.send(BusMsg::Heartbeat {
                ts_millis: chrono::Utc::now().timestamp_millis(),
            });
        }
    });
}
