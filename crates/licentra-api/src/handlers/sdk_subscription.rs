//! SDK subscription surface, authenticated by API key.

use crate::auth::models::SdkIdentity;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::customer_subscription::DeactivatedResponse;
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

/// Current subscription as reported to SDK clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct SdkSubscriptionDetail {
    pub id: Uuid,
    pub pack_name: String,
    pub pack_sku: String,
    pub price: f64,
    pub status: SubscriptionStatus,
    pub assigned_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_valid: bool,
}

impl SdkSubscriptionDetail {
    fn from_current(current: SubscriptionWithPack) -> Self {
        Self {
            id: current.id,
            pack_name: current.pack_name,
            pack_sku: current.pack_sku,
            price: current.price,
            status: current.status,
            assigned_at: current.assigned_at,
            expires_at: current.expires_at,
            is_valid: current.status.is_current(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SdkSubscriptionResponse {
    pub success: bool,
    pub subscription: SdkSubscriptionDetail,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SdkSubscriptionRequestBody {
    pub pack_sku: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SdkRequestedSubscription {
    pub id: Uuid,
    pub status: SubscriptionStatus,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SdkSubscriptionRequestedResponse {
    pub success: bool,
    pub message: String,
    pub subscription: SdkRequestedSubscription,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SdkHistoryEntry {
    pub id: Uuid,
    pub pack_name: String,
    pub status: SubscriptionStatus,
    pub assigned_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SdkHistoryResponse {
    pub success: bool,
    pub history: Vec<SdkHistoryEntry>,
    pub pagination: Pagination,
}

fn default_sort() -> String {
    "desc".to_string()
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SdkHistoryQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Creation-time sort order: "asc" or "desc"
    #[serde(default = "default_sort")]
    pub sort: String,
}

#[utoipa::path(
    get,
    path = "/sdk/v1/subscription",
    tag = "sdk",
    responses(
        (status = 200, description = "Current subscription", body = SdkSubscriptionResponse),
        (status = 401, description = "Invalid API key", body = ErrorResponse),
        (status = 404, description = "No active subscription", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, identity), fields(customer_id = %identity.customer.id))]
pub async fn get_subscription(
    State(state): State<Arc<AppState>>,
    identity: SdkIdentity,
) -> Result<impl IntoResponse, HttpAppError> {
    let current = state
        .subscriptions
        .get_current(identity.customer.id)
        .await?
        .ok_or_else(|| AppError::NotFound("No active subscription found".to_string()))?;

    Ok(Json(SdkSubscriptionResponse {
        success: true,
        subscription: SdkSubscriptionDetail::from_current(current),
    }))
}

#[utoipa::path(
    post,
    path = "/sdk/v1/subscription",
    tag = "sdk",
    request_body = SdkSubscriptionRequestBody,
    responses(
        (status = 200, description = "Subscription requested", body = SdkSubscriptionRequestedResponse),
        (status = 400, description = "pack_sku is required", body = ErrorResponse),
        (status = 404, description = "Subscription pack not found", body = ErrorResponse),
        (status = 409, description = "An open subscription already exists", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, identity, request), fields(customer_id = %identity.customer.id))]
pub async fn request_subscription(
    State(state): State<Arc<AppState>>,
    identity: SdkIdentity,
    ValidatedJson(request): ValidatedJson<SdkSubscriptionRequestBody>,
) -> Result<impl IntoResponse, HttpAppError> {
    let pack_sku = request
        .pack_sku
        .as_deref()
        .map(str::trim)
        .filter(|sku| !sku.is_empty())
        .ok_or_else(|| AppError::BadRequest("pack_sku is required".to_string()))?;

    if state.subscriptions.has_open(identity.customer.id).await? {
        return Err(AppError::Conflict(
            "You already have an active or pending subscription".to_string(),
        )
        .into());
    }

    let pack = state
        .packs
        .get_by_sku(pack_sku)
        .await?
        .ok_or_else(|| AppError::NotFound("Subscription pack not found".to_string()))?;

    let subscription = state
        .subscriptions
        .create_requested(identity.customer.id, pack.id)
        .await?;

    Ok(Json(SdkSubscriptionRequestedResponse {
        success: true,
        message: "Subscription request submitted successfully".to_string(),
        subscription: SdkRequestedSubscription {
            id: subscription.id,
            status: subscription.status,
            requested_at: subscription.requested_at,
        },
    }))
}

#[utoipa::path(
    delete,
    path = "/sdk/v1/subscription",
    tag = "sdk",
    responses(
        (status = 200, description = "Subscription deactivated", body = DeactivatedResponse),
        (status = 401, description = "Invalid API key", body = ErrorResponse),
        (status = 404, description = "No active subscription", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, identity), fields(customer_id = %identity.customer.id))]
pub async fn deactivate_subscription(
    State(state): State<Arc<AppState>>,
    identity: SdkIdentity,
) -> Result<impl IntoResponse, HttpAppError> {
    let subscription = state
        .subscriptions
        .deactivate_current(identity.customer.id)
        .await?;

    Ok(Json(DeactivatedResponse {
        success: true,
        message: "Subscription deactivated successfully".to_string(),
        deactivated_at: subscription.deactivated_at,
    }))
}

#[utoipa::path(
    get,
    path = "/sdk/v1/subscription-history",
    tag = "sdk",
    params(SdkHistoryQuery),
    responses(
        (status = 200, description = "Subscription history", body = SdkHistoryResponse),
        (status = 400, description = "Invalid sort order", body = ErrorResponse),
        (status = 401, description = "Invalid API key", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, identity, query), fields(customer_id = %identity.customer.id))]
pub async fn subscription_history(
    State(state): State<Arc<AppState>>,
    identity: SdkIdentity,
    Query(query): Query<SdkHistoryQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let descending = match query.sort.as_str() {
        "desc" => true,
        "asc" => false,
        _ => {
            return Err(
                AppError::BadRequest("sort must be 'asc' or 'desc'".to_string()).into(),
            )
        }
    };

    let params = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .normalized();

    let history = state
        .subscriptions
        .list_for_customer(identity.customer.id, params.limit, params.offset(), descending)
        .await?
        .into_iter()
        .map(|entry| SdkHistoryEntry {
            id: entry.id,
            pack_name: entry.pack_name,
            status: entry.status,
            assigned_at: entry.assigned_at,
            expires_at: entry.expires_at,
        })
        .collect();
    let total = state
        .subscriptions
        .count_for_customer(identity.customer.id)
        .await?;

    Ok(Json(SdkHistoryResponse {
        success: true,
        history,
        pagination: Pagination::new(params, total),
    }))
}
