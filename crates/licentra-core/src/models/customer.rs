use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Customer profile, 1:1 linked to a login principal. Soft-deleted via
/// `is_active`; inactive customers are excluded from all lookups.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: Uuid,
    pub principal_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
