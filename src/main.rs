//! Marketplace Backend - Authentication & Session Authorization Core
//! Mission: Gate every marketplace request behind verified, revocable identity

use anyhow::{Context, Result};
use axum::{
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use dotenv::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marketplace_backend::{
    auth::{api as auth_api, auth_middleware, optional_auth_middleware, AuthGate, AuthService,
        AuthState, RevocationStore, SqliteAccountStore, TokenCodec},
    config::Config,
    middleware::request_logging,
};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    init_tracing();

    let config = Config::from_env();
    info!("🔐 Marketplace auth core starting");

    let repo = Arc::new(SqliteAccountStore::new(&config.db_path)?);
    let codec = Arc::new(TokenCodec::new(config.jwt_secret.clone()));
    let revocations = RevocationStore::new();

    let service = Arc::new(AuthService::new(
        repo,
        codec.clone(),
        revocations.clone(),
    ));
    let auth_state = AuthState::new(service);
    let gate = AuthGate::new(codec, revocations);

    let app = build_router(auth_state, gate);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("🎯 API server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Assemble public and protected routes. Route-level role policy beyond
/// "authenticated" lives with the handlers.
fn build_router(auth_state: AuthState, gate: AuthGate) -> Router {
    // Public routes pass anonymously, but a valid token still attaches its
    // claims for handlers that care.
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/user/signup", post(auth_api::signup))
        .route("/api/user/login", post(auth_api::login))
        .route_layer(middleware::from_fn_with_state(
            gate.clone(),
            optional_auth_middleware,
        ))
        .with_state(auth_state.clone());

    let protected_routes = Router::new()
        .route("/api/user/logout", post(auth_api::logout))
        .route("/api/user/delete", delete(auth_api::delete_account))
        .route("/api/user/me", get(auth_api::me))
        .route_layer(middleware::from_fn_with_state(gate, auth_middleware))
        .with_state(auth_state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketplace_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
