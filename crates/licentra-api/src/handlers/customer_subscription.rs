//! Customer subscription surface: catalog browse, current subscription,
//! request, deactivation, history.

use crate::auth::models::CustomerIdentity;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::{default_limit, default_page};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use licentra_core::models::{PageParams, Pagination, SubscriptionStatus};
use licentra_core::AppError;
use licentra_db::SubscriptionWithPack;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct PackSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sku: String,
    pub price: f64,
    pub validity_months: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PackCatalogResponse {
    pub success: bool,
    pub subscription_packs: Vec<PackSummary>,
}

/// Current subscription as reported to the customer.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionDetail {
    pub id: Uuid,
    pub pack_name: String,
    pub pack_sku: String,
    pub price: f64,
    pub status: SubscriptionStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_valid: bool,
}

impl SubscriptionDetail {
    fn from_current(current: SubscriptionWithPack) -> Self {
        Self {
            id: current.id,
            pack_name: current.pack_name,
            pack_sku: current.pack_sku,
            price: current.price,
            status: current.status,
            requested_at: current.requested_at,
            approved_at: current.approved_at,
            assigned_at: current.assigned_at,
            expires_at: current.expires_at,
            is_valid: current.status.is_current(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionResponse {
    pub success: bool,
    pub subscription: SubscriptionDetail,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubscriptionRequestBody {
    pub sku: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RequestedSubscription {
    pub id: Uuid,
    pub pack_name: String,
    pub pack_sku: String,
    pub price: f64,
    pub status: SubscriptionStatus,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionRequestedResponse {
    pub success: bool,
    pub message: String,
    pub subscription: RequestedSubscription,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeactivatedResponse {
    pub success: bool,
    pub message: String,
    pub deactivated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub pack_name: String,
    pub pack_sku: String,
    pub price: f64,
    pub status: SubscriptionStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<SubscriptionWithPack> for HistoryEntry {
    fn from(entry: SubscriptionWithPack) -> Self {
        Self {
            id: entry.id,
            pack_name: entry.pack_name,
            pack_sku: entry.pack_sku,
            price: entry.price,
            status: entry.status,
            requested_at: entry.requested_at,
            approved_at: entry.approved_at,
            assigned_at: entry.assigned_at,
            expires_at: entry.expires_at,
            deactivated_at: entry.deactivated_at,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub success: bool,
    pub history: Vec<HistoryEntry>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[utoipa::path(
    get,
    path = "/api/v1/customer/subscription-packs",
    tag = "customer",
    responses(
        (status = 200, description = "Available subscription packs", body = PackCatalogResponse),
        (status = 403, description = "Customer access required", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, _ctx))]
pub async fn list_packs(
    State(state): State<Arc<AppState>>,
    _ctx: CustomerIdentity,
) -> Result<impl IntoResponse, HttpAppError> {
    let packs = state.packs.list_active().await?;

    let subscription_packs = packs
        .into_iter()
        .map(|pack| PackSummary {
            id: pack.id,
            name: pack.name,
            description: pack.description,
            sku: pack.sku,
            price: pack.price,
            validity_months: pack.validity_months,
        })
        .collect();

    Ok(Json(PackCatalogResponse {
        success: true,
        subscription_packs,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/customer/subscription",
    tag = "customer",
    responses(
        (status = 200, description = "Current subscription", body = SubscriptionResponse),
        (status = 404, description = "No active subscription", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx), fields(customer_id = %ctx.customer.id))]
pub async fn get_subscription(
    State(state): State<Arc<AppState>>,
    ctx: CustomerIdentity,
) -> Result<impl IntoResponse, HttpAppError> {
    let current = state
        .subscriptions
        .get_current(ctx.customer.id)
        .await?
        .ok_or_else(|| AppError::NotFound("No active subscription found".to_string()))?;

    Ok(Json(SubscriptionResponse {
        success: true,
        subscription: SubscriptionDetail::from_current(current),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/customer/subscription",
    tag = "customer",
    request_body = SubscriptionRequestBody,
    responses(
        (status = 200, description = "Subscription requested", body = SubscriptionRequestedResponse),
        (status = 404, description = "Subscription pack not found", body = ErrorResponse),
        (status = 409, description = "An open subscription already exists", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx, request), fields(customer_id = %ctx.customer.id))]
pub async fn request_subscription(
    State(state): State<Arc<AppState>>,
    ctx: CustomerIdentity,
    ValidatedJson(request): ValidatedJson<SubscriptionRequestBody>,
) -> Result<impl IntoResponse, HttpAppError> {
    // Conflict takes precedence over an unknown SKU; the conditional insert
    // below still decides under concurrency.
    if state.subscriptions.has_open(ctx.customer.id).await? {
        return Err(AppError::Conflict(
            "You already have an active or pending subscription".to_string(),
        )
        .into());
    }

    let pack = state
        .packs
        .get_by_sku(&request.sku)
        .await?
        .ok_or_else(|| AppError::NotFound("Subscription pack not found".to_string()))?;

    let subscription = state
        .subscriptions
        .create_requested(ctx.customer.id, pack.id)
        .await?;

    Ok(Json(SubscriptionRequestedResponse {
        success: true,
        message: "Subscription request submitted successfully".to_string(),
        subscription: RequestedSubscription {
            id: subscription.id,
            pack_name: pack.name,
            pack_sku: pack.sku,
            price: pack.price,
            status: subscription.status,
            requested_at: subscription.requested_at,
        },
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/customer/subscription",
    tag = "customer",
    responses(
        (status = 200, description = "Subscription deactivated", body = DeactivatedResponse),
        (status = 404, description = "No active subscription", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx), fields(customer_id = %ctx.customer.id))]
pub async fn deactivate_subscription(
    State(state): State<Arc<AppState>>,
    ctx: CustomerIdentity,
) -> Result<impl IntoResponse, HttpAppError> {
    let subscription = state
        .subscriptions
        .deactivate_current(ctx.customer.id)
        .await?;

    Ok(Json(DeactivatedResponse {
        success: true,
        message: "Subscription deactivated successfully".to_string(),
        deactivated_at: subscription.deactivated_at,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/customer/subscription-history",
    tag = "customer",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Subscription history", body = HistoryResponse),
        (status = 403, description = "Customer access required", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx, query), fields(customer_id = %ctx.customer.id))]
pub async fn subscription_history(
    State(state): State<Arc<AppState>>,
    ctx: CustomerIdentity,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let params = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .normalized();

    let history = state
        .subscriptions
        .list_for_customer(ctx.customer.id, params.limit, params.offset(), true)
        .await?
        .into_iter()
        .map(HistoryEntry::from)
        .collect();
    let total = state
        .subscriptions
        .count_for_customer(ctx.customer.id)
        .await?;

    Ok(Json(HistoryResponse {
        success: true,
        history,
        pagination: Pagination::new(params, total),
    }))
}
