//! Gatehouse gateway binary.
//!
//! - Config: `GATEHOUSE_CONFIG` (default `gatehouse.yaml`, defaults if absent)
//! - Environment: `GATEHOUSE_ENV` / `APP_ENV` override `gateway.environment`
//! - Admission middleware in front of every route

use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

use gatehouse_core::error::GatehouseError;
use gatehouse_gateway::{app_state, config, router};

#[tokio::main]
async fn main() -> Result<(), GatehouseError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var(config::CONFIG_PATH_VAR).unwrap_or_else(|_| "gatehouse.yaml".into());
    let mut cfg = config::load_or_default(&path)?;
    config::apply_environment_override(&mut cfg, &config::environment_signals());

    let listen: SocketAddr = cfg.gateway.listen.parse().map_err(|e| {
        GatehouseError::BadRequest(format!("gateway.listen must be a valid SocketAddr: {e}"))
    })?;

    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state);

    tracing::info!(%listen, "gatehouse-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| GatehouseError::Internal(format!("failed to bind {listen}: {e}")))?;

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|e| GatehouseError::Internal(format!("server failed: {e}")))
}
