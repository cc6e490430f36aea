//! Admin subscription management: listing, approval, direct assignment.

use crate::auth::models::AdminIdentity;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::{default_limit, default_page, SuccessResponse};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use licentra_core::models::{expiry_after, PageParams, Pagination, SubscriptionStatus};
use licentra_core::AppError;
use licentra_db::AdminSubscriptionRow;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SubscriptionListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Filter by lifecycle status
    pub status: Option<SubscriptionStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionListResponse {
    pub success: bool,
    #[schema(value_type = Vec<Object>)]
    pub subscriptions: Vec<AdminSubscriptionRow>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignSubscriptionRequest {
    pub pack_id: Uuid,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/subscriptions",
    tag = "admin-subscriptions",
    params(SubscriptionListQuery),
    responses(
        (status = 200, description = "List of subscriptions", body = SubscriptionListResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, _admin, query))]
pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
    Query(query): Query<SubscriptionListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let params = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .normalized();

    let subscriptions = state
        .subscriptions
        .list_all(query.status, params.limit, params.offset())
        .await?;
    let total = state.subscriptions.count_all(query.status).await?;

    Ok(Json(SubscriptionListResponse {
        success: true,
        subscriptions,
        pagination: Pagination::new(params, total),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/subscriptions/{id}/approve",
    tag = "admin-subscriptions",
    params(("id" = Uuid, Path, description = "Subscription ID")),
    responses(
        (status = 200, description = "Subscription approved", body = SuccessResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse),
        (status = 409, description = "Customer already has an active subscription", body = ErrorResponse),
        (status = 412, description = "Subscription is not in the requested state", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, _admin))]
pub async fn approve_subscription(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.subscriptions.approve(id).await?;

    Ok(Json(SuccessResponse::new(
        "Subscription approved successfully",
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/customers/{id}/assign-subscription",
    tag = "admin-subscriptions",
    params(("id" = Uuid, Path, description = "Customer ID")),
    request_body = AssignSubscriptionRequest,
    responses(
        (status = 200, description = "Subscription assigned", body = SuccessResponse),
        (status = 404, description = "Customer or pack not found", body = ErrorResponse),
        (status = 409, description = "Customer already has an active subscription", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, _admin, request))]
pub async fn assign_subscription(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
    Path(customer_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AssignSubscriptionRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let customer = state
        .customers
        .get_by_id(customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

    let pack = state
        .packs
        .get_by_id(request.pack_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Subscription pack not found".to_string()))?;

    let assigned_at = Utc::now();
    let expires_at = expiry_after(assigned_at, pack.validity_months);

    state
        .subscriptions
        .create_assigned(customer.id, pack.id, assigned_at, expires_at)
        .await?;

    Ok(Json(SuccessResponse::new(
        "Subscription assigned successfully",
    )))
}
