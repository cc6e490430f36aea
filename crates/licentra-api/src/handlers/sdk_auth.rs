//! SDK authentication: email/password login that returns the customer's
//! API key for subsequent non-interactive requests.

use crate::auth::api_key::generate_api_key;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::customer_auth::CustomerLoginRequest;
use crate::handlers::verify_login_credential;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use licentra_core::models::UserRole;
use licentra_core::AppError;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct SdkAuthResponse {
    pub success: bool,
    pub api_key: String,
    pub token: String,
    pub name: String,
    pub phone: String,
    pub expires_in: i64,
}

#[utoipa::path(
    post,
    path = "/sdk/auth/login",
    tag = "sdk",
    request_body = CustomerLoginRequest,
    responses(
        (status = 200, description = "Authenticated; API key returned", body = SdkAuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 404, description = "Customer profile not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn sdk_login(
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

    // Reuse the existing active key rather than minting a new one per login.
    let api_key = match state.api_keys.get_active_for_customer(customer.id).await? {
        Some(existing) => existing.key,
        None => {
            let key = generate_api_key(&state.config.auth.api_key_prefix);
            state.api_keys.create(customer.id, &key).await?;
            key
        }
    };

    // Bearer token for clients that prefer it over the API key.
    let token = state.tokens.issue(&principal.email, principal.role)?;

    tracing::info!(customer_id = %customer.id, "SDK login");

    Ok(Json(SdkAuthResponse {
        success: true,
        api_key,
        token,
        name: customer.name,
        phone: customer.phone,
        expires_in: state.tokens.expires_in_secs(),
    }))
}
