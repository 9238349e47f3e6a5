use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Router,
        extract::{RawQuery, State},
        http::StatusCode,
        response::{IntoResponse, Json},
        routing::get,
    },
    tower_http::trace::TraceLayer,
    tracing::{debug, error, info},
};

use courier_config::CourierConfig;

use crate::{
    pipeline::{Relay, RelayOutcome, RelayStage},
    services::RelayServices,
};

// ── Shared app state ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

/// Build the router: the relay route (GET and POST) plus `/health`.
pub fn build_app(relay: Arc<Relay>, route: &str) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(route, get(relay_handler).post(relay_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { relay })
}

/// Wire production services from `config` and serve until the process exits.
pub async fn start_server(config: &CourierConfig) -> anyhow::Result<()> {
    let services = RelayServices::from_config(config)?;
    let relay = Arc::new(services.relay(config));
    let app = build_app(relay, &config.server.route);

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, route = %config.server.route, "courier listening");
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Webhooks arrive as a form body; a bodiless GET carries the form in the
/// query string instead.
async fn relay_handler(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    body: String,
) -> StatusCode {
    let payload = if body.is_empty() {
        query.unwrap_or_default()
    } else {
        body
    };

    let status = match state.relay.handle(&payload).await {
        Ok(RelayOutcome::Rejected { reason }) => {
            info!(%reason, "webhook rejected");
            StatusCode::BAD_REQUEST
        },
        Ok(RelayOutcome::NotFound { .. } | RelayOutcome::Relayed { .. }) => StatusCode::OK,
        Err(e) => {
            error!(error = %e, "relay failed");
            StatusCode::INTERNAL_SERVER_ERROR
        },
    };
    debug!(stage = %RelayStage::Responded, status = status.as_u16());
    status
}
