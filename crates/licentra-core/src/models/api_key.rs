use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// API key for non-interactive (SDK) authentication. Tied to one customer,
/// looked up by exact match, never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ApiKey {
    pub id: Uuid,
    pub customer_id: Uuid,
    #[serde(skip_serializing)]
    pub key: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ApiKey {
    /// Check if the key has passed its optional expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn api_key(expires_at: Option<DateTime<Utc>>) -> ApiKey {
        ApiKey {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            key: "sk-sdk-test".to_string(),
            is_active: true,
            expires_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_expired_with_expired_key() {
        let key = api_key(Some(Utc::now() - Duration::days(1)));
        assert!(key.is_expired(Utc::now()));
    }

    #[test]
    fn test_is_expired_with_valid_key() {
        let key = api_key(Some(Utc::now() + Duration::days(1)));
        assert!(!key.is_expired(Utc::now()));
    }

    #[test]
    fn test_is_expired_with_no_expiration() {
        let key = api_key(None);
        assert!(!key.is_expired(Utc::now()));
    }
}
