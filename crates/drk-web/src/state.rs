//! Shared runtime state for drk-web.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The pool, the probed
//! schema capabilities, the typed config and the staff pass key are fixed at
//! startup; the only moving part is the broadcast bus feeding `/admin/stream`.

use std::time::Duration;

use drk_config::ShopConfig;
use drk_db::SchemaCapabilities;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::broadcast;

use crate::staff_pass::StaffKey;

// ---------------------------------------------------------------------------
// BusMsg: SSE event bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat {
        ts_millis: i64,
    },
    OrderPlaced {
        order_id: i32,
        store_id: Option<i32>,
        order_code: Option<String>,
        total_amount: i64,
    },
    OrderCompleted {
        order_id: i32,
        store_id: Option<i32>,
    },
}

impl BusMsg {
    /// SSE `event:` name.
    pub fn event_name(&self) -> &'static str {
        match self {
            BusMsg::Heartbeat { .. } => "heartbeat",
            BusMsg::OrderPlaced { .. } => "order_placed",
            BusMsg::OrderCompleted { .. } => "order_completed",
        }
    }

    /// Store an order event belongs to. Heartbeats belong to every store.
    pub fn store_id(&self) -> Option<i32> {
        match self {
            BusMsg::Heartbeat { .. } => None,
            BusMsg::OrderPlaced { store_id, .. } | BusMsg::OrderCompleted { store_id, .. } => {
                *store_id
            }
        }
    }
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Optional `order` columns present in the connected database.
    pub caps: SchemaCapabilities,
    pub config: ShopConfig,
    /// Signs and checks staff passes.
    pub staff_key: StaffKey,
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    pub build: BuildInfo,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        caps: SchemaCapabilities,
        config: ShopConfig,
        staff_key: StaffKey,
    ) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);

        Self {
            pool,
            caps,
            config,
            staff_key,
            bus,
            build: BuildInfo {
                service: "drk-web",
                version: env!("CARGO_PKG_VERSION"),
            },
        }
    }

    /// Send on the bus; having no subscribers is not an error.
    pub fn publish(&self, msg: BusMsg) {
        let _ = self.bus.send(msg);
    }
}

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}
