//! HTTP handlers, one module per resource.

pub mod admin_auth;
pub mod customer_auth;
pub mod customer_subscription;
pub mod customers;
pub mod dashboard;
pub mod packs;
pub mod sdk_auth;
pub mod sdk_subscription;
pub mod subscriptions;

use crate::auth::password::{hash_password, CredentialHash};
use crate::state::AppState;
use licentra_core::models::Principal;
use licentra_core::AppError;
use serde::Serialize;
use utoipa::ToSchema;

/// Message-only success envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

pub(crate) fn default_page() -> i64 {
    licentra_core::models::DEFAULT_PAGE
}

pub(crate) fn default_limit() -> i64 {
    licentra_core::models::DEFAULT_LIMIT
}

/// Verify a login credential against the stored hash. On a successful login
/// with a legacy digest, the credential is rehashed with the strong scheme
/// and persisted before the login completes.
pub(crate) async fn verify_login_credential(
    state: &AppState,
    principal: &Principal,
    password: &str,
) -> Result<(), AppError> {
    let stored = CredentialHash::parse(&principal.password_hash);

    if !stored.verify(password) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    if stored.needs_rehash() {
        let upgraded = hash_password(password)?;
        state
            .principals
            .update_password_hash(principal.id, &upgraded)
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response_shape() {
        let response = SuccessResponse::new("Subscription approved successfully");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json.get("success").and_then(|v| v.as_bool()), Some(true));
        assert_eq!(
            json.get("message").and_then(|v| v.as_str()),
            Some("Subscription approved successfully")
        );
    }
}
