//! pmd-daemon entry point.
//!
//! Intentionally thin: config, tracing, optional seed, shared state, wire
//! middleware, serve. All route handlers live in `routes.rs`; all shared
//! state types live in `state.rs`.

use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::HeaderValue;
use pmd_config::DeskConfig;
use pmd_daemon::{routes, state};
use pmd_store::EntityStore;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience). Silent if the file does
    // not exist — production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    let cfg = load_config()?;
    init_tracing(&cfg.log_filter);
    let config_hash = cfg.config_hash().context("hash config")?;

    let store = Arc::new(EntityStore::new());
    seed_store(&store, &cfg).context("seed store")?;

    let shared = Arc::new(state::AppState::new(Arc::clone(&store), config_hash));
    state::spawn_heartbeat(shared.bus.clone(), Duration::from_secs(1));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr: SocketAddr = cfg
        .bind_addr
        .parse()
        .with_context(|| format!("bad bind_addr '{}'", cfg.bind_addr))?;
    info!("pmd-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .await
        .context("server crashed")?;

    Ok(())
}

/// PMD_CONFIG points at a YAML file; without it, defaults + env overrides.
fn load_config() -> anyhow::Result<DeskConfig> {
    match std::env::var("PMD_CONFIG") {
        Ok(path) => DeskConfig::load(Path::new(&path)),
        Err(_) => Ok(DeskConfig::from_env()),
    }
}

fn init_tracing(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .init();
}

/// Dev/demo bootstrap: create the seed group and load its inventory
/// manifest into the fresh store.
fn seed_store(store: &EntityStore, cfg: &DeskConfig) -> anyhow::Result<()> {
    let (Some(csv), Some(group_name)) = (&cfg.seed_csv, &cfg.seed_group) else {
        return Ok(());
    };
    let group = store.write().insert_group(group_name);
    let rows = pmd_testkit::load_units_csv(Path::new(csv), group.id)?;
    let count = rows.len();
    let mut w = store.write();
    for row in rows {
        w.insert_unit(row)
            .with_context(|| "duplicate serial in seed manifest")?;
    }
    info!(group = %group.name, units = count, "seeded store from manifest");
    Ok(())
}

/// CORS: allow only localhost origins (the desk UI runs next to the daemon).
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}
