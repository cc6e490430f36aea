//! Route configuration and setup

use crate::auth::middleware::{
    admin_auth_middleware, customer_auth_middleware, sdk_auth_middleware, AuthState,
};
use crate::constants::{ADMIN_API_PREFIX, CUSTOMER_API_PREFIX, MAX_BODY_BYTES, SDK_API_PREFIX};
use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use licentra_core::AppConfig;
use std::sync::Arc;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(config: &AppConfig, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    let auth_state = Arc::new(AuthState {
        tokens: state.tokens.clone(),
        principals: state.principals.clone(),
        customers: state.customers.clone(),
        api_keys: state.api_keys.clone(),
    });

    // Public routes (no authentication required)
    let public_routes = public_routes(state.clone());

    // Role-gated route groups
    let admin_routes = admin_routes(state.clone()).layer(axum::middleware::from_fn_with_state(
        auth_state.clone(),
        admin_auth_middleware,
    ));
    let customer_routes =
        customer_routes(state.clone()).layer(axum::middleware::from_fn_with_state(
            auth_state.clone(),
            customer_auth_middleware,
        ));
    let sdk_routes = sdk_routes(state.clone()).layer(axum::middleware::from_fn_with_state(
        auth_state,
        sdk_auth_middleware,
    ));

    // Server-level concurrency limit to protect against resource exhaustion under extreme load
    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let app = public_routes
        .merge(admin_routes)
        .merge(customer_routes)
        .merge(sdk_routes)
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &AppConfig) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            config.cors_origins.iter().map(|o| o.parse()).collect();

        CorsLayer::new()
            .allow_origin(origins.unwrap_or_default())
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}

/// Public routes (no authentication required)
fn public_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/live", get(liveness_check))
        .route("/ready", get(readiness_check))
        .route("/api/login", post(handlers::admin_auth::admin_login))
        .route(
            "/api/customer/login",
            post(handlers::customer_auth::customer_login),
        )
        .route(
            "/api/customer/signup",
            post(handlers::customer_auth::customer_signup),
        )
        .route("/sdk/auth/login", post(handlers::sdk_auth::sdk_login))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::ApiDoc::openapi()) }),
        )
        .with_state(state)
}

/// Admin routes (bearer token + admin role)
fn admin_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/dashboard", ADMIN_API_PREFIX),
            get(handlers::dashboard::get_dashboard),
        )
        .route(
            &format!("{}/customers", ADMIN_API_PREFIX),
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route(
            &format!("{}/customers/{{id}}", ADMIN_API_PREFIX),
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
        .route(
            &format!("{}/customers/{{id}}/assign-subscription", ADMIN_API_PREFIX),
            post(handlers::subscriptions::assign_subscription),
        )
        .route(
            &format!("{}/subscription-packs", ADMIN_API_PREFIX),
            get(handlers::packs::list_packs).post(handlers::packs::create_pack),
        )
        .route(
            &format!("{}/subscription-packs/{{id}}", ADMIN_API_PREFIX),
            get(handlers::packs::get_pack)
                .put(handlers::packs::update_pack)
                .delete(handlers::packs::delete_pack),
        )
        .route(
            &format!("{}/subscriptions", ADMIN_API_PREFIX),
            get(handlers::subscriptions::list_subscriptions),
        )
        .route(
            &format!("{}/subscriptions/{{id}}/approve", ADMIN_API_PREFIX),
            post(handlers::subscriptions::approve_subscription),
        )
        .with_state(state)
}

/// Customer routes (bearer token + customer role)
fn customer_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/subscription-packs", CUSTOMER_API_PREFIX),
            get(handlers::customer_subscription::list_packs),
        )
        .route(
            &format!("{}/subscription", CUSTOMER_API_PREFIX),
            get(handlers::customer_subscription::get_subscription)
                .post(handlers::customer_subscription::request_subscription)
                .delete(handlers::customer_subscription::deactivate_subscription),
        )
        .route(
            &format!("{}/subscription-history", CUSTOMER_API_PREFIX),
            get(handlers::customer_subscription::subscription_history),
        )
        .with_state(state)
}

/// SDK routes (X-API-Key header)
fn sdk_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/subscription", SDK_API_PREFIX),
            get(handlers::sdk_subscription::get_subscription)
                .post(handlers::sdk_subscription::request_subscription)
                .delete(handlers::sdk_subscription::deactivate_subscription),
        )
        .route(
            &format!("{}/subscription-history", SDK_API_PREFIX),
            get(handlers::sdk_subscription::subscription_history),
        )
        .with_state(state)
}

/// Liveness probe - simple check that process is running
/// Always returns 200 if process can respond
async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "alive"
        })),
    )
}

/// Readiness probe - checks if service can accept traffic
/// Checks critical dependencies (database)
async fn readiness_check(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> impl IntoResponse {
    const TIMEOUT: Duration = Duration::from_secs(5);

    let mut response = serde_json::json!({
        "status": "ready",
        "database": "unknown"
    });

    let mut overall_ready = true;

    // Check database with timeout
    match tokio::time::timeout(TIMEOUT, sqlx::query("SELECT 1").execute(&state.db_pool)).await {
        Ok(Ok(_)) => {
            response["database"] = serde_json::json!("ready");
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Database readiness check failed");
            response["database"] = serde_json::json!(format!("not_ready: {}", e));
            overall_ready = false;
        }
        Err(_) => {
            tracing::error!("Database readiness check timed out");
            response["database"] = serde_json::json!("timeout");
            overall_ready = false;
        }
    }

    let status_code = if overall_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

async fn health_check(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> impl IntoResponse {
    const TIMEOUT: Duration = Duration::from_secs(5);

    let mut response = serde_json::json!({
        "status": "healthy",
        "database": "unknown"
    });

    let mut overall_healthy = true;

    // Check database using the pool directly with timeout
    match tokio::time::timeout(TIMEOUT, sqlx::query("SELECT 1").execute(&state.db_pool)).await {
        Ok(Ok(_)) => {
            response["database"] = serde_json::json!("healthy");
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Database health check failed");
            response["database"] = serde_json::json!(format!("unhealthy: {}", e));
            overall_healthy = false;
        }
        Err(_) => {
            tracing::error!("Database health check timed out");
            response["database"] = serde_json::json!("timeout");
            overall_healthy = false;
        }
    }

    let status_code = if overall_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
