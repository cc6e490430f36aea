//! Identity contexts attached to requests by the auth middleware.
//!
//! Each gate inserts its context into request extensions; handlers extract
//! them via `FromRequestParts`.

use crate::error::ErrorResponse;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use licentra_core::models::{Customer, Principal};

/// Admin identity attached by the admin gate.
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub principal: Principal,
}

/// Customer identity attached by the customer gate; carries the resolved
/// customer profile alongside the login principal.
#[derive(Debug, Clone)]
pub struct CustomerIdentity {
    pub principal: Principal,
    pub customer: Customer,
}

/// SDK identity attached by the API-key gate.
#[derive(Debug, Clone)]
pub struct SdkIdentity {
    pub customer: Customer,
}

fn missing_context() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(
            "Missing authentication context",
            "MISSING_AUTH_CONTEXT",
        )),
    )
}

impl<S> FromRequestParts<S> for AdminIdentity
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminIdentity>()
            .cloned()
            .ok_or_else(missing_context)
    }
}

impl<S> FromRequestParts<S> for CustomerIdentity
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CustomerIdentity>()
            .cloned()
            .ok_or_else(missing_context)
    }
}

impl<S> FromRequestParts<S> for SdkIdentity
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SdkIdentity>()
            .cloned()
            .ok_or_else(missing_context)
    }
}
