//! Customer login and signup.

use crate::auth::password::hash_password;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::verify_login_credential;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use licentra_core::models::UserRole;
use licentra_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CustomerLoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerLoginResponse {
    pub success: bool,
    pub token: String,
    pub name: String,
    pub phone: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CustomerSignupRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 10, max = 20))]
    pub phone: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerSignupResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub name: String,
    pub phone: String,
    pub expires_in: i64,
}

#[utoipa::path(
    post,
    path = "/api/customer/login",
    tag = "auth",
    request_body = CustomerLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = CustomerLoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 404, description = "Customer profile not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn customer_login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CustomerLoginRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let principal = state
        .principals
        .get_by_email(&request.email)
        .await?
        .filter(|principal| principal.role == UserRole::Customer)
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    verify_login_credential(&state, &principal, &request.password).await?;

    if !principal.is_active {
        return Err(AppError::BadRequest("User account is disabled".to_string()).into());
    }

    let customer = state
        .customers
        .get_by_principal(principal.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer profile not found".to_string()))?;

    let token = state.tokens.issue(&principal.email, principal.role)?;

    tracing::info!(customer_id = %customer.id, "Customer logged in");

    Ok(Json(CustomerLoginResponse {
        success: true,
        token,
        name: customer.name,
        phone: customer.phone,
        expires_in: state.tokens.expires_in_secs(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/customer/signup",
    tag = "auth",
    request_body = CustomerSignupRequest,
    responses(
        (status = 200, description = "Account created", body = CustomerSignupResponse),
        (status = 400, description = "Invalid signup data", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn customer_signup(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CustomerSignupRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let password_hash = hash_password(&request.password)?;

    let (principal, customer) = state
        .customers
        .create_with_principal(&request.name, &request.email, &request.phone, &password_hash)
        .await?;

    let token = state.tokens.issue(&principal.email, principal.role)?;

    tracing::info!(customer_id = %customer.id, "Customer signed up");

    Ok(Json(CustomerSignupResponse {
        success: true,
        message: "Account created successfully".to_string(),
        token,
        name: customer.name,
        phone: customer.phone,
        expires_in: state.tokens.expires_in_secs(),
    }))
}
