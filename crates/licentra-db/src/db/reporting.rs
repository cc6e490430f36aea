//! Dashboard aggregates derived from lifecycle state.
//!
//! Pure reads, snapshot-at-query-time; no caching.

use chrono::{DateTime, Utc};
use licentra_core::models::SubscriptionStatus;
use licentra_core::AppError;
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres};

/// A recent subscription event for the dashboard feed.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RecentActivity {
    pub status: SubscriptionStatus,
    pub customer: String,
    pub pack: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ReportingRepository {
    pool: PgPool,
}

impl ReportingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "customers", db.operation = "select"))]
    pub async fn count_active_customers(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<Postgres, i64>(
            r#"
            SELECT COUNT(*) FROM customers
            WHERE is_active = TRUE
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to count active customers");
            AppError::Database(e)
        })
    }

    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "select"))]
    pub async fn count_current_subscriptions(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<Postgres, i64>(
            r#"
            SELECT COUNT(*) FROM subscriptions
            WHERE status IN ('active', 'approved')
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to count current subscriptions");
            AppError::Database(e)
        })
    }

    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "select"))]
    pub async fn count_pending_requests(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<Postgres, i64>(
            r#"
            SELECT COUNT(*) FROM subscriptions
            WHERE status = 'requested'
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to count pending requests");
            AppError::Database(e)
        })
    }

    /// Sum of pack prices over current (active/approved) subscriptions.
    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "select"))]
    pub async fn total_revenue(&self) -> Result<f64, AppError> {
        sqlx::query_scalar::<Postgres, f64>(
            r#"
            SELECT COALESCE(SUM(p.price), 0)
            FROM subscriptions s
            JOIN subscription_packs p ON p.id = s.pack_id
            WHERE s.status IN ('active', 'approved')
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to sum revenue");
            AppError::Database(e)
        })
    }

    /// Most recent subscription events, newest first.
    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "select"))]
    pub async fn recent_activity(&self, limit: i64) -> Result<Vec<RecentActivity>, AppError> {
        sqlx::query_as::<Postgres, RecentActivity>(
            r#"
            SELECT s.status, c.name AS customer, p.name AS pack, s.created_at AS timestamp
            FROM subscriptions s
            JOIN customers c ON c.id = s.customer_id
            JOIN subscription_packs p ON p.id = s.pack_id
            ORDER BY s.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load recent activity");
            AppError::Database(e)
        })
    }
}
