//! Startup provisioning.

use crate::auth::password::hash_password;
use crate::state::AppState;
use anyhow::Result;
use licentra_core::models::UserRole;
use licentra_core::AppError;

/// Ensure the configured admin principal exists so a fresh deployment can be
/// administered immediately. A concurrent instance winning the insert is fine.
pub async fn ensure_default_admin(state: &AppState) -> Result<()> {
    let email = &state.config.bootstrap_admin_email;

    if state.principals.get_by_email(email).await?.is_some() {
        return Ok(());
    }

    let password_hash = hash_password(&state.config.bootstrap_admin_password)?;

    match state
        .principals
        .create(email, &password_hash, UserRole::Admin)
        .await
    {
        Ok(_) => {
            tracing::info!(email = %email, "Default admin created");
            Ok(())
        }
        Err(AppError::Conflict(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
