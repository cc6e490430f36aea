//! Admin dashboard aggregates.

use crate::auth::models::AdminIdentity;
use crate::constants::RECENT_ACTIVITY_LIMIT;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityEntry {
    /// Event kind, e.g. "subscription_requested"
    #[serde(rename = "type")]
    pub kind: String,
    pub customer: String,
    pub pack: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardData {
    pub total_customers: i64,
    pub active_subscriptions: i64,
    pub pending_requests: i64,
    pub total_revenue: f64,
    pub recent_activities: Vec<ActivityEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub success: bool,
    pub data: DashboardData,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/dashboard",
    tag = "admin",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, _admin))]
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
) -> Result<impl IntoResponse, HttpAppError> {
    let total_customers = state.reporting.count_active_customers().await?;
    let active_subscriptions = state.reporting.count_current_subscriptions().await?;
    let pending_requests = state.reporting.count_pending_requests().await?;
    let total_revenue = state.reporting.total_revenue().await?;

    let recent_activities = state
        .reporting
        .recent_activity(RECENT_ACTIVITY_LIMIT)
        .await?
        .into_iter()
        .map(|activity| ActivityEntry {
            kind: format!("subscription_{}", activity.status),
            customer: activity.customer,
            pack: activity.pack,
            timestamp: activity.timestamp,
        })
        .collect();

    Ok(Json(DashboardResponse {
        success: true,
        data: DashboardData {
            total_customers,
            active_subscriptions,
            pending_requests,
            total_revenue,
            recent_activities,
        },
    }))
}
