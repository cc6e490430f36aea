//! Admin login.

use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::verify_login_credential;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Form, Json};
use licentra_core::models::UserRole;
use licentra_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Form-encoded login body. The username field carries the admin email.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminLoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminLoginResponse {
    pub success: bool,
    pub token: String,
    pub email: String,
    pub expires_in: i64,
}

#[utoipa::path(
    post,
    path = "/api/login",
    tag = "auth",
    request_body(content = AdminLoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Login successful", body = AdminLoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, form))]
pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<AdminLoginForm>,
) -> Result<impl IntoResponse, HttpAppError> {
    let principal = state
        .principals
        .get_by_email(&form.username)
        .await?
        .filter(|principal| principal.role == UserRole::Admin)
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    verify_login_credential(&state, &principal, &form.password).await?;

    let token = state.tokens.issue(&principal.email, principal.role)?;

    tracing::info!(email = %principal.email, "Admin logged in");

    Ok(Json(AdminLoginResponse {
        success: true,
        token,
        email: principal.email,
        expires_in: state.tokens.expires_in_secs(),
    }))
}
