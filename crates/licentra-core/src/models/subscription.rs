//! Subscription lifecycle model.
//!
//! A customer holds at most one subscription in an open state
//! (requested/approved/active) at any time. Expiry is computed as a
//! 30-day-per-month approximation and applied lazily on read.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

/// Days counted per validity month. Validity is a 30-day-per-month
/// approximation, not calendar months.
pub const DAYS_PER_VALIDITY_MONTH: i64 = 30;

/// Subscription lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "subscription_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Requested,
    Approved,
    Active,
    Inactive,
    Expired,
}

impl SubscriptionStatus {
    /// Open statuses count against the one-subscription-per-customer rule.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Requested | SubscriptionStatus::Approved | SubscriptionStatus::Active
        )
    }

    /// Current statuses grant entitlement and are subject to expiry.
    pub fn is_current(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Approved | SubscriptionStatus::Active
        )
    }

    /// Whether an approval transition is allowed from this status.
    pub fn can_approve(&self) -> bool {
        matches!(self, SubscriptionStatus::Requested)
    }
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SubscriptionStatus::Requested => write!(f, "requested"),
            SubscriptionStatus::Approved => write!(f, "approved"),
            SubscriptionStatus::Active => write!(f, "active"),
            SubscriptionStatus::Inactive => write!(f, "inactive"),
            SubscriptionStatus::Expired => write!(f, "expired"),
        }
    }
}

/// Expiry timestamp for a subscription starting at `start`.
pub fn expiry_after(start: DateTime<Utc>, validity_months: i32) -> DateTime<Utc> {
    start + Duration::days(i64::from(validity_months) * DAYS_PER_VALIDITY_MONTH)
}

/// Subscription row. Joins a customer and a pack; never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Subscription {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub pack_id: Uuid,
    pub status: SubscriptionStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// A current subscription whose expiry has passed. Such rows must be
    /// persisted as expired before being returned to any caller.
    pub fn has_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.status.is_current() && self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(status: SubscriptionStatus, expires_at: Option<DateTime<Utc>>) -> Subscription {
        let now = Utc::now();
        Subscription {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            pack_id: Uuid::new_v4(),
            status,
            requested_at: now,
            approved_at: None,
            assigned_at: None,
            expires_at,
            deactivated_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_open_statuses() {
        assert!(SubscriptionStatus::Requested.is_open());
        assert!(SubscriptionStatus::Approved.is_open());
        assert!(SubscriptionStatus::Active.is_open());
        assert!(!SubscriptionStatus::Inactive.is_open());
        assert!(!SubscriptionStatus::Expired.is_open());
    }

    #[test]
    fn test_current_statuses() {
        assert!(!SubscriptionStatus::Requested.is_current());
        assert!(SubscriptionStatus::Approved.is_current());
        assert!(SubscriptionStatus::Active.is_current());
        assert!(!SubscriptionStatus::Inactive.is_current());
        assert!(!SubscriptionStatus::Expired.is_current());
    }

    #[test]
    fn test_only_requested_can_be_approved() {
        assert!(SubscriptionStatus::Requested.can_approve());
        assert!(!SubscriptionStatus::Approved.can_approve());
        assert!(!SubscriptionStatus::Active.can_approve());
        assert!(!SubscriptionStatus::Inactive.can_approve());
        assert!(!SubscriptionStatus::Expired.can_approve());
    }

    #[test]
    fn test_expiry_uses_thirty_day_months() {
        let start = Utc::now();
        assert_eq!(expiry_after(start, 1), start + Duration::days(30));
        assert_eq!(expiry_after(start, 6), start + Duration::days(180));
        assert_eq!(expiry_after(start, 12), start + Duration::days(360));
    }

    #[test]
    fn test_has_lapsed_for_past_expiry() {
        let now = Utc::now();
        let sub = subscription(SubscriptionStatus::Active, Some(now - Duration::hours(1)));
        assert!(sub.has_lapsed(now));

        let sub = subscription(SubscriptionStatus::Approved, Some(now - Duration::days(2)));
        assert!(sub.has_lapsed(now));
    }

    #[test]
    fn test_has_lapsed_ignores_future_or_missing_expiry() {
        let now = Utc::now();
        let sub = subscription(SubscriptionStatus::Active, Some(now + Duration::hours(1)));
        assert!(!sub.has_lapsed(now));

        let sub = subscription(SubscriptionStatus::Requested, None);
        assert!(!sub.has_lapsed(now));
    }

    #[test]
    fn test_has_lapsed_ignores_terminal_statuses() {
        let now = Utc::now();
        let past = Some(now - Duration::hours(1));
        assert!(!subscription(SubscriptionStatus::Inactive, past).has_lapsed(now));
        assert!(!subscription(SubscriptionStatus::Expired, past).has_lapsed(now));
    }

    #[test]
    fn test_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&SubscriptionStatus::Requested).unwrap(),
            "\"requested\""
        );
        let status: SubscriptionStatus = serde_json::from_str("\"expired\"").unwrap();
        assert_eq!(status, SubscriptionStatus::Expired);
    }
}
