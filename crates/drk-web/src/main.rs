//! drk-web entry point.
//!
//! This file is intentionally thin: it loads config, connects and migrates
//! the database, probes the schema, resolves the staff pass key, wires
//! middleware, and starts the HTTP server. All route handlers live in `routes.rs`; shared state lives in
//! `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use drk_config::UnusedKeyPolicy;
use drk_web::{routes, staff_pass::StaffKey, state};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};

const ENV_ADDR: &str = "DRK_ADDR";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience). Silent if missing.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let loaded = drk_config::load_from_env()?;
    let unused = drk_config::report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !unused.is_clean() {
        warn!(keys = ?unused.unused_leaf_pointers, "config has keys nothing reads");
    }
    let config = loaded.shop()?;
    info!(config_hash = %loaded.config_hash, "config loaded");

    let secret = drk_config::resolve_database_url(&config)?;
    let pool = drk_db::connect(&secret.url, config.database.max_connections).await?;
    drk_db::migrate(&pool).await?;

    let caps = drk_db::probe_capabilities(&pool).await?;
    if caps != drk_db::SchemaCapabilities::full() {
        warn!(?caps, "order/item tables are missing optional columns; running degraded");
    }

    let staff_key = match drk_config::resolve_staff_key(&config) {
        Some(secret) => StaffKey::from_secret(secret.key.as_bytes())?,
        None => {
            warn!(
                env = %config.staff.pass_key_env,
                "staff pass key not set; using a per-process key"
            );
            StaffKey::random()?
        }
    };

    let addr = bind_addr(&config.server.bind_addr)?;
    let shared = Arc::new(state::AppState::new(pool, caps, config, staff_key));

    state::spawn_heartbeat(shared.bus.clone(), Duration::from_secs(15));

    let app = routes::build_router(Arc::clone(&shared)).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    info!("drk-web listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// `DRK_ADDR` wins over `server.bind_addr`.
fn bind_addr(configured: &str) -> anyhow::Result<SocketAddr> {
    let raw = std::env::var(ENV_ADDR).unwrap_or_else(|_| configured.to_string());
    raw.parse()
        .with_context(|| format!("invalid bind address: {raw}"))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
