//! Request authentication gates.
//!
//! Bearer tokens gate the admin and customer surfaces; the `X-API-Key`
//! header gates the SDK surface. Resolution is pure read + context
//! attachment: nothing is persisted here. Unexpected storage errors during
//! resolution surface as Unauthorized so internal detail never leaks
//! through the auth boundary.

use crate::auth::models::{AdminIdentity, CustomerIdentity, SdkIdentity};
use crate::auth::token::TokenSigner;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use licentra_core::models::{Principal, UserRole};
use licentra_core::AppError;
use licentra_db::{ApiKeyRepository, CustomerRepository, PrincipalRepository};
use std::sync::Arc;

const API_KEY_HEADER: &str = "X-API-Key";
const INVALID_CREDENTIALS: &str = "Could not validate credentials";

#[derive(Clone)]
pub struct AuthState {
    pub tokens: TokenSigner,
    pub principals: PrincipalRepository,
    pub customers: CustomerRepository,
    pub api_keys: ApiKeyRepository,
}

/// Normalize storage failures during identity resolution to Unauthorized.
fn resolution_error(err: AppError) -> AppError {
    tracing::debug!(error = %err, "Identity resolution failed");
    AppError::Unauthorized(INVALID_CREDENTIALS.to_string())
}

impl AuthState {
    /// Resolve the bearer principal from the Authorization header.
    ///
    /// Takes the header value as an owned `String` (extracted by the caller)
    /// rather than borrowing the `!Sync` `Request`: a borrow of the request
    /// captured in this future would make it `!Send` and fail axum's
    /// `from_fn` Service bound.
    async fn resolve_principal(&self, auth_header: Option<String>) -> Result<Principal, AppError> {
        let auth_header = auth_header.ok_or_else(|| {
            AppError::Unauthorized("Missing authorization header".to_string())
        })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthorized("Invalid authorization header format".to_string())
        })?;

        let claims = self.tokens.verify(token)?;

        let principal = self
            .principals
            .get_by_email(&claims.sub)
            .await
            .map_err(resolution_error)?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

        if !principal.is_active {
            return Err(AppError::Unauthorized("Inactive user".to_string()));
        }

        Ok(principal)
    }

    /// Resolve the SDK customer from an API key.
    async fn resolve_sdk_customer(&self, key: &str) -> Result<SdkIdentity, AppError> {
        let api_key = self
            .api_keys
            .get_active_by_key(key)
            .await
            .map_err(resolution_error)?
            .ok_or_else(|| AppError::Unauthorized("Invalid API key".to_string()))?;

        if api_key.is_expired(Utc::now()) {
            return Err(AppError::Unauthorized("API key has expired".to_string()));
        }

        let customer = self
            .customers
            .get_by_id(api_key.customer_id)
            .await
            .map_err(resolution_error)?
            .ok_or_else(|| {
                AppError::Unauthorized("Customer not found or inactive".to_string())
            })?;

        Ok(SdkIdentity { customer })
    }
}

/// Gate for the admin surface: bearer token + admin role.
pub async fn admin_auth_middleware(
    State(auth): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .map(|h| h.to_string());
    let principal = match auth.resolve_principal(auth_header).await {
        Ok(principal) => principal,
        Err(e) => return HttpAppError(e).into_response(),
    };

    if principal.role != UserRole::Admin {
        return HttpAppError(AppError::Forbidden("Admin access required".to_string()))
            .into_response();
    }

    request.extensions_mut().insert(AdminIdentity { principal });
    next.run(request).await
}

/// Gate for the customer surface: bearer token + customer role + profile.
pub async fn customer_auth_middleware(
    State(auth): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .map(|h| h.to_string());
    let principal = match auth.resolve_principal(auth_header).await {
        Ok(principal) => principal,
        Err(e) => return HttpAppError(e).into_response(),
    };

    if principal.role != UserRole::Customer {
        return HttpAppError(AppError::Forbidden("Customer access required".to_string()))
            .into_response();
    }

    let customer = match auth.customers.get_by_principal(principal.id).await {
        Ok(Some(customer)) => customer,
        Ok(None) => {
            return HttpAppError(AppError::NotFound(
                "Customer profile not found".to_string(),
            ))
            .into_response()
        }
        Err(e) => return HttpAppError(resolution_error(e)).into_response(),
    };

    request
        .extensions_mut()
        .insert(CustomerIdentity { principal, customer });
    next.run(request).await
}

/// Gate for the SDK surface: header-supplied API key.
pub async fn sdk_auth_middleware(
    State(auth): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let key = match request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
    {
        Some(key) => key.to_string(),
        None => {
            return HttpAppError(AppError::Unauthorized("API key required".to_string()))
                .into_response()
        }
    };

    let identity = match auth.resolve_sdk_customer(&key).await {
        Ok(identity) => identity,
        Err(e) => return HttpAppError(e).into_response(),
    };

    request.extensions_mut().insert(identity);
    next.run(request).await
}
