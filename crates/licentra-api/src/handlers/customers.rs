//! Admin customer management.

use crate::auth::models::AdminIdentity;
use crate::auth::password::{generate_temp_password, hash_password};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::{default_limit, default_page, SuccessResponse};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use licentra_core::models::{Customer, PageParams, Pagination};
use licentra_core::AppError;
use licentra_db::UpdateCustomer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, IntoParams)]
pub struct CustomerListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Case-insensitive substring match on name or email
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerListResponse {
    pub success: bool,
    pub customers: Vec<Customer>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    pub success: bool,
    pub customer: Customer,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerCreatedResponse {
    pub success: bool,
    pub customer: Customer,
    /// Carries the one-time temporary password for the new account.
    pub message: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CustomerCreateRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 10, max = 20))]
    pub phone: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CustomerUpdateRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 10, max = 20))]
    pub phone: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/customers",
    tag = "admin-customers",
    params(CustomerListQuery),
    responses(
        (status = 200, description = "List of customers", body = CustomerListResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, _admin, query))]
pub async fn list_customers(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
    Query(query): Query<CustomerListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let params = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .normalized();
    let search = query.search.as_deref().filter(|s| !s.trim().is_empty());

    let customers = state
        .customers
        .list(search, params.limit, params.offset())
        .await?;
    let total = state.customers.count(search).await?;

    Ok(Json(CustomerListResponse {
        success: true,
        customers,
        pagination: Pagination::new(params, total),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/customers",
    tag = "admin-customers",
    request_body = CustomerCreateRequest,
    responses(
        (status = 200, description = "Customer created", body = CustomerCreatedResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, _admin, request))]
pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
    ValidatedJson(request): ValidatedJson<CustomerCreateRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    // Admin-created accounts start with a generated temporary password,
    // returned once in the response message.
    let temp_password = generate_temp_password();
    let password_hash = hash_password(&temp_password)?;

    let (_principal, customer) = state
        .customers
        .create_with_principal(&request.name, &request.email, &request.phone, &password_hash)
        .await?;

    Ok(Json(CustomerCreatedResponse {
        success: true,
        customer,
        message: format!(
            "Customer created successfully. Temporary password: {}",
            temp_password
        ),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/customers/{id}",
    tag = "admin-customers",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer found", body = CustomerResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, _admin))]
pub async fn get_customer(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let customer = state
        .customers
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

    Ok(Json(CustomerResponse {
        success: true,
        customer,
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/customers/{id}",
    tag = "admin-customers",
    params(("id" = Uuid, Path, description = "Customer ID")),
    request_body = CustomerUpdateRequest,
    responses(
        (status = 200, description = "Customer updated", body = CustomerResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, _admin, request))]
pub async fn update_customer(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CustomerUpdateRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let changes = UpdateCustomer {
        name: request.name,
        email: request.email,
        phone: request.phone,
    };

    let customer = state.customers.update(id, &changes).await?;

    Ok(Json(CustomerResponse {
        success: true,
        customer,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/customers/{id}",
    tag = "admin-customers",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer deleted", body = SuccessResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, _admin))]
pub async fn delete_customer(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let deleted = state.customers.soft_delete(id).await?;

    if !deleted {
        return Err(AppError::NotFound("Customer not found".to_string()).into());
    }

    Ok(Json(SuccessResponse::new("Customer deleted successfully")))
}
