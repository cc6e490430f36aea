//! Subscription lifecycle persistence.
//!
//! Every lifecycle mutation is a single conditional statement or one
//! row-locked transaction, so the single-open-subscription rule cannot be
//! broken by concurrent requests. The partial unique index on open statuses
//! is the backstop; violations surface as Conflict.

use chrono::{DateTime, Utc};
use licentra_core::models::{expiry_after, Subscription, SubscriptionStatus};
use licentra_core::AppError;
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

/// Subscription joined with the pack fields callers report alongside it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubscriptionWithPack {
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
    pub pack_name: String,
    pub pack_sku: String,
    pub price: f64,
    pub validity_months: i32,
}

impl SubscriptionWithPack {
    /// A current subscription whose expiry has passed.
    pub fn has_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.status.is_current() && self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

/// Admin listing row: subscription with customer and pack identity.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AdminSubscriptionRow {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub pack_name: String,
    pub pack_sku: String,
    pub price: f64,
    pub status: SubscriptionStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

const WITH_PACK_COLUMNS: &str = r#"
    s.id, s.customer_id, s.pack_id, s.status,
    s.requested_at, s.approved_at, s.assigned_at, s.expires_at, s.deactivated_at,
    s.created_at, s.updated_at,
    p.name AS pack_name, p.sku AS pack_sku, p.price, p.validity_months
"#;

/// Repository for subscription rows. Rows are never hard-deleted.
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

fn open_conflict(e: sqlx::Error, message: &str) -> AppError {
    let err = AppError::Database(e);
    if err.is_unique_violation() {
        AppError::Conflict(message.to_string())
    } else {
        tracing::error!(error = %err, "Failed to create subscription");
        err
    }
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a customer-requested subscription, atomically refusing when any
    /// open (requested/approved/active) subscription already exists.
    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "insert"))]
    pub async fn create_requested(
        &self,
        customer_id: Uuid,
        pack_id: Uuid,
    ) -> Result<Subscription, AppError> {
        let subscription = sqlx::query_as::<Postgres, Subscription>(
            r#"
            INSERT INTO subscriptions (customer_id, pack_id, status, requested_at)
            SELECT $1, $2, 'requested', NOW()
            WHERE NOT EXISTS (
                SELECT 1 FROM subscriptions
                WHERE customer_id = $1
                  AND status IN ('requested', 'approved', 'active')
            )
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(pack_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| open_conflict(e, "You already have an active or pending subscription"))?
        .ok_or_else(|| {
            AppError::Conflict("You already have an active or pending subscription".to_string())
        })?;

        tracing::info!(
            subscription_id = %subscription.id,
            customer_id = %customer_id,
            pack_id = %pack_id,
            "Subscription requested"
        );

        Ok(subscription)
    }

    /// Whether the customer holds any open (requested/approved/active)
    /// subscription. Used to report Conflict ahead of other lookups; the
    /// conditional insert remains the authoritative check.
    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "select"))]
    pub async fn has_open(&self, customer_id: Uuid) -> Result<bool, AppError> {
        sqlx::query_scalar::<Postgres, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM subscriptions
                WHERE customer_id = $1
                  AND status IN ('requested', 'approved', 'active')
            )
            "#,
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, customer_id = %customer_id, "Failed to check open subscriptions");
            AppError::Database(e)
        })
    }

    /// Admin direct assignment: creates an active subscription, skipping the
    /// request/approval steps, under the same single-open rule.
    /// `expires_at` must be `assigned_at + validity`, computed by the caller.
    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "insert"))]
    pub async fn create_assigned(
        &self,
        customer_id: Uuid,
        pack_id: Uuid,
        assigned_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Subscription, AppError> {
        let subscription = sqlx::query_as::<Postgres, Subscription>(
            r#"
            INSERT INTO subscriptions (customer_id, pack_id, status, assigned_at, expires_at)
            SELECT $1, $2, 'active', $3, $4
            WHERE NOT EXISTS (
                SELECT 1 FROM subscriptions
                WHERE customer_id = $1
                  AND status IN ('requested', 'approved', 'active')
            )
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(pack_id)
        .bind(assigned_at)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| open_conflict(e, "Customer already has an active subscription"))?
        .ok_or_else(|| {
            AppError::Conflict("Customer already has an active subscription".to_string())
        })?;

        tracing::info!(
            subscription_id = %subscription.id,
            customer_id = %customer_id,
            pack_id = %pack_id,
            "Subscription assigned"
        );

        Ok(subscription)
    }

    /// Approve a requested subscription. The status check, the sibling check,
    /// and the update run in one transaction under a row lock, so two admins
    /// cannot approve competing requests for the same customer.
    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "update"))]
    pub async fn approve(&self, id: Uuid) -> Result<Subscription, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let subscription = sqlx::query_as::<Postgres, Subscription>(
            r#"
            SELECT * FROM subscriptions
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, subscription_id = %id, "Failed to lock subscription");
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))?;

        if !subscription.status.can_approve() {
            return Err(AppError::PreconditionFailed(
                "Only requested subscriptions can be approved".to_string(),
            ));
        }

        let sibling_open = sqlx::query_scalar::<Postgres, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM subscriptions
                WHERE customer_id = $1
                  AND id <> $2
                  AND status IN ('approved', 'active')
            )
            "#,
        )
        .bind(subscription.customer_id)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, subscription_id = %id, "Failed to check sibling subscriptions");
            AppError::Database(e)
        })?;

        if sibling_open {
            return Err(AppError::Conflict(
                "Customer already has an active subscription".to_string(),
            ));
        }

        let validity_months = sqlx::query_scalar::<Postgres, i32>(
            r#"
            SELECT validity_months FROM subscription_packs
            WHERE id = $1
            "#,
        )
        .bind(subscription.pack_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, pack_id = %subscription.pack_id, "Failed to read pack validity");
            AppError::Database(e)
        })?;

        let approved_at = Utc::now();
        let expires_at = expiry_after(approved_at, validity_months);

        let approved = sqlx::query_as::<Postgres, Subscription>(
            r#"
            UPDATE subscriptions
            SET status = 'approved', approved_at = $2, expires_at = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(approved_at)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, subscription_id = %id, "Failed to approve subscription");
            AppError::Database(e)
        })?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            subscription_id = %id,
            customer_id = %approved.customer_id,
            "Subscription approved"
        );

        Ok(approved)
    }

    /// Current (active/approved) subscription for a customer. A row past its
    /// expiry is persisted as expired before being returned; the write is
    /// conditional on the current status, so re-reads are idempotent. All
    /// readers (admin, customer, SDK) go through this path.
    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "select"))]
    pub async fn get_current(
        &self,
        customer_id: Uuid,
    ) -> Result<Option<SubscriptionWithPack>, AppError> {
        let query = format!(
            r#"
            SELECT {WITH_PACK_COLUMNS}
            FROM subscriptions s
            JOIN subscription_packs p ON p.id = s.pack_id
            WHERE s.customer_id = $1
              AND s.status IN ('active', 'approved')
            LIMIT 1
            "#
        );

        let Some(mut current) = sqlx::query_as::<Postgres, SubscriptionWithPack>(&query)
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, customer_id = %customer_id, "Failed to get current subscription");
                AppError::Database(e)
            })?
        else {
            return Ok(None);
        };

        if current.has_lapsed(Utc::now()) {
            self.mark_expired(current.id).await?;
            current.status = SubscriptionStatus::Expired;
        }

        Ok(Some(current))
    }

    /// Persist the lazy expiry transition. Conditional on the row still being
    /// current, so concurrent readers race harmlessly.
    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "update"))]
    async fn mark_expired(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = 'expired', updated_at = NOW()
            WHERE id = $1 AND status IN ('active', 'approved')
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, subscription_id = %id, "Failed to expire subscription");
            AppError::Database(e)
        })?;

        if result.rows_affected() > 0 {
            tracing::info!(subscription_id = %id, "Subscription expired");
        }

        Ok(())
    }

    /// Deactivate the customer's current subscription. Single conditional
    /// update; NotFound when nothing is active or approved.
    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "update"))]
    pub async fn deactivate_current(&self, customer_id: Uuid) -> Result<Subscription, AppError> {
        let subscription = sqlx::query_as::<Postgres, Subscription>(
            r#"
            UPDATE subscriptions
            SET status = 'inactive', deactivated_at = NOW(), updated_at = NOW()
            WHERE customer_id = $1
              AND status IN ('active', 'approved')
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, customer_id = %customer_id, "Failed to deactivate subscription");
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("No active subscription found".to_string()))?;

        tracing::info!(
            subscription_id = %subscription.id,
            customer_id = %customer_id,
            "Subscription deactivated"
        );

        Ok(subscription)
    }

    /// Full subscription history for a customer, terminal states included,
    /// ordered by creation time.
    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "select"))]
    pub async fn list_for_customer(
        &self,
        customer_id: Uuid,
        limit: i64,
        offset: i64,
        descending: bool,
    ) -> Result<Vec<SubscriptionWithPack>, AppError> {
        let order = if descending { "DESC" } else { "ASC" };
        let query = format!(
            r#"
            SELECT {WITH_PACK_COLUMNS}
            FROM subscriptions s
            JOIN subscription_packs p ON p.id = s.pack_id
            WHERE s.customer_id = $1
            ORDER BY s.created_at {order}
            LIMIT $2 OFFSET $3
            "#
        );

        let subscriptions = sqlx::query_as::<Postgres, SubscriptionWithPack>(&query)
            .bind(customer_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, customer_id = %customer_id, "Failed to list subscription history");
                AppError::Database(e)
            })?;

        Ok(subscriptions)
    }

    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "select"))]
    pub async fn count_for_customer(&self, customer_id: Uuid) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<Postgres, i64>(
            r#"
            SELECT COUNT(*) FROM subscriptions
            WHERE customer_id = $1
            "#,
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, customer_id = %customer_id, "Failed to count subscriptions");
            AppError::Database(e)
        })?;

        Ok(total)
    }

    /// Admin listing across all customers with an optional status filter.
    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "select"))]
    pub async fn list_all(
        &self,
        status: Option<SubscriptionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AdminSubscriptionRow>, AppError> {
        let rows = sqlx::query_as::<Postgres, AdminSubscriptionRow>(
            r#"
            SELECT
                s.id, c.name AS customer_name, c.email AS customer_email,
                p.name AS pack_name, p.sku AS pack_sku, p.price,
                s.status, s.requested_at, s.approved_at, s.assigned_at,
                s.expires_at, s.created_at
            FROM subscriptions s
            JOIN customers c ON c.id = s.customer_id
            JOIN subscription_packs p ON p.id = s.pack_id
            WHERE ($1::subscription_status IS NULL OR s.status = $1)
            ORDER BY s.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list subscriptions");
            AppError::Database(e)
        })?;

        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "select"))]
    pub async fn count_all(&self, status: Option<SubscriptionStatus>) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<Postgres, i64>(
            r#"
            SELECT COUNT(*) FROM subscriptions
            WHERE ($1::subscription_status IS NULL OR status = $1)
            "#,
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to count subscriptions");
            AppError::Database(e)
        })?;

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn with_pack(status: SubscriptionStatus, expires_at: Option<DateTime<Utc>>) -> SubscriptionWithPack {
        let now = Utc::now();
        SubscriptionWithPack {
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
            pack_name: "Basic".to_string(),
            pack_sku: "basic-plan".to_string(),
            price: 9.99,
            validity_months: 1,
        }
    }

    #[test]
    fn test_has_lapsed_only_for_current_past_expiry() {
        let now = Utc::now();
        let past = Some(now - Duration::minutes(1));
        let future = Some(now + Duration::minutes(1));

        assert!(with_pack(SubscriptionStatus::Active, past).has_lapsed(now));
        assert!(with_pack(SubscriptionStatus::Approved, past).has_lapsed(now));
        assert!(!with_pack(SubscriptionStatus::Active, future).has_lapsed(now));
        assert!(!with_pack(SubscriptionStatus::Requested, past).has_lapsed(now));
        assert!(!with_pack(SubscriptionStatus::Expired, past).has_lapsed(now));
    }
}
