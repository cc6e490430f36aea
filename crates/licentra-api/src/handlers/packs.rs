//! Admin subscription pack management.

use crate::auth::models::AdminIdentity;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::{default_limit, default_page, SuccessResponse};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use licentra_core::models::{PageParams, Pagination, SubscriptionPack};
use licentra_core::AppError;
use licentra_db::{NewSubscriptionPack, UpdateSubscriptionPack};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, IntoParams)]
pub struct PackListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Case-insensitive substring match on name or SKU
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PackListResponse {
    pub success: bool,
    pub subscription_packs: Vec<SubscriptionPack>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PackResponse {
    pub success: bool,
    pub subscription_pack: SubscriptionPack,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PackCreateRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub sku: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(range(min = 1, max = 12))]
    pub validity_months: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PackUpdateRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub sku: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[validate(range(min = 1, max = 12))]
    pub validity_months: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/subscription-packs",
    tag = "admin-packs",
    params(PackListQuery),
    responses(
        (status = 200, description = "List of subscription packs", body = PackListResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, _admin, query))]
pub async fn list_packs(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
    Query(query): Query<PackListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let params = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .normalized();
    let search = query.search.as_deref().filter(|s| !s.trim().is_empty());

    let packs = state.packs.list(search, params.limit, params.offset()).await?;
    let total = state.packs.count(search).await?;

    Ok(Json(PackListResponse {
        success: true,
        subscription_packs: packs,
        pagination: Pagination::new(params, total),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/subscription-packs",
    tag = "admin-packs",
    request_body = PackCreateRequest,
    responses(
        (status = 200, description = "Pack created", body = PackResponse),
        (status = 409, description = "SKU already exists", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, _admin, request))]
pub async fn create_pack(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
    ValidatedJson(request): ValidatedJson<PackCreateRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let pack = state
        .packs
        .create(&NewSubscriptionPack {
            name: request.name,
            description: request.description,
            sku: request.sku,
            price: request.price,
            validity_months: request.validity_months,
        })
        .await?;

    Ok(Json(PackResponse {
        success: true,
        subscription_pack: pack,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/subscription-packs/{id}",
    tag = "admin-packs",
    params(("id" = Uuid, Path, description = "Pack ID")),
    responses(
        (status = 200, description = "Pack found", body = PackResponse),
        (status = 404, description = "Pack not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, _admin))]
pub async fn get_pack(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let pack = state
        .packs
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Subscription pack not found".to_string()))?;

    Ok(Json(PackResponse {
        success: true,
        subscription_pack: pack,
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/subscription-packs/{id}",
    tag = "admin-packs",
    params(("id" = Uuid, Path, description = "Pack ID")),
    request_body = PackUpdateRequest,
    responses(
        (status = 200, description = "Pack updated", body = PackResponse),
        (status = 404, description = "Pack not found", body = ErrorResponse),
        (status = 409, description = "SKU already exists", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, _admin, request))]
pub async fn update_pack(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<PackUpdateRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let pack = state
        .packs
        .update(
            id,
            &UpdateSubscriptionPack {
                name: request.name,
                description: request.description,
                sku: request.sku,
                price: request.price,
                validity_months: request.validity_months,
            },
        )
        .await?;

    Ok(Json(PackResponse {
        success: true,
        subscription_pack: pack,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/subscription-packs/{id}",
    tag = "admin-packs",
    params(("id" = Uuid, Path, description = "Pack ID")),
    responses(
        (status = 200, description = "Pack deleted", body = SuccessResponse),
        (status = 404, description = "Pack not found", body = ErrorResponse),
        (status = 409, description = "Pack has active subscriptions", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, _admin))]
pub async fn delete_pack(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.packs.soft_delete(id).await?;

    Ok(Json(SuccessResponse::new(
        "Subscription pack deleted successfully",
    )))
}
