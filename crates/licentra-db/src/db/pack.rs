use licentra_core::models::SubscriptionPack;
use licentra_core::AppError;
use serde::Deserialize;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Fields for creating a subscription pack.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSubscriptionPack {
    pub name: String,
    pub description: Option<String>,
    pub sku: String,
    pub price: f64,
    pub validity_months: i32,
}

/// Partial update of a subscription pack; only provided fields change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSubscriptionPack {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Option<f64>,
    pub validity_months: Option<i32>,
}

/// Repository for the subscription pack catalog. Packs are soft-deleted via
/// `is_active` and excluded from lookups afterwards.
#[derive(Clone)]
pub struct PackRepository {
    pool: PgPool,
}

fn conflict_on_unique(e: sqlx::Error, context: &str) -> AppError {
    let err = AppError::Database(e);
    if err.is_unique_violation() {
        AppError::Conflict("SKU already exists".to_string())
    } else {
        tracing::error!(error = %err, "{}", context);
        err
    }
}

impl PackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a pack. SKU uniqueness violations surface as Conflict.
    #[tracing::instrument(skip(self, pack), fields(db.table = "subscription_packs", db.operation = "insert"))]
    pub async fn create(&self, pack: &NewSubscriptionPack) -> Result<SubscriptionPack, AppError> {
        let created = sqlx::query_as::<Postgres, SubscriptionPack>(
            r#"
            INSERT INTO subscription_packs (name, description, sku, price, validity_months)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&pack.name)
        .bind(&pack.description)
        .bind(&pack.sku)
        .bind(pack.price)
        .bind(pack.validity_months)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Failed to create subscription pack"))?;

        tracing::info!(pack_id = %created.id, sku = %created.sku, "Subscription pack created");

        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "subscription_packs", db.operation = "select"))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<SubscriptionPack>, AppError> {
        let pack = sqlx::query_as::<Postgres, SubscriptionPack>(
            r#"
            SELECT * FROM subscription_packs
            WHERE id = $1 AND is_active = TRUE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, pack_id = %id, "Failed to get subscription pack");
            AppError::Database(e)
        })?;

        Ok(pack)
    }

    #[tracing::instrument(skip(self), fields(db.table = "subscription_packs", db.operation = "select"))]
    pub async fn get_by_sku(&self, sku: &str) -> Result<Option<SubscriptionPack>, AppError> {
        let pack = sqlx::query_as::<Postgres, SubscriptionPack>(
            r#"
            SELECT * FROM subscription_packs
            WHERE sku = $1 AND is_active = TRUE
            "#,
        )
        .bind(sku)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, sku = %sku, "Failed to get subscription pack by SKU");
            AppError::Database(e)
        })?;

        Ok(pack)
    }

    /// List active packs, optionally filtered by a case-insensitive substring
    /// match on name or SKU.
    #[tracing::instrument(skip(self), fields(db.table = "subscription_packs", db.operation = "select"))]
    pub async fn list(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SubscriptionPack>, AppError> {
        let pattern = search.map(|s| format!("%{}%", s));

        let packs = sqlx::query_as::<Postgres, SubscriptionPack>(
            r#"
            SELECT * FROM subscription_packs
            WHERE is_active = TRUE
              AND ($1::text IS NULL OR name ILIKE $1 OR sku ILIKE $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list subscription packs");
            AppError::Database(e)
        })?;

        Ok(packs)
    }

    #[tracing::instrument(skip(self), fields(db.table = "subscription_packs", db.operation = "select"))]
    pub async fn count(&self, search: Option<&str>) -> Result<i64, AppError> {
        let pattern = search.map(|s| format!("%{}%", s));

        let total = sqlx::query_scalar::<Postgres, i64>(
            r#"
            SELECT COUNT(*) FROM subscription_packs
            WHERE is_active = TRUE
              AND ($1::text IS NULL OR name ILIKE $1 OR sku ILIKE $1)
            "#,
        )
        .bind(pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to count subscription packs");
            AppError::Database(e)
        })?;

        Ok(total)
    }

    /// All active packs, unpaginated (customer catalog browse).
    #[tracing::instrument(skip(self), fields(db.table = "subscription_packs", db.operation = "select"))]
    pub async fn list_active(&self) -> Result<Vec<SubscriptionPack>, AppError> {
        let packs = sqlx::query_as::<Postgres, SubscriptionPack>(
            r#"
            SELECT * FROM subscription_packs
            WHERE is_active = TRUE
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list active subscription packs");
            AppError::Database(e)
        })?;

        Ok(packs)
    }

    /// Partial update of an active pack.
    #[tracing::instrument(skip(self, changes), fields(db.table = "subscription_packs", db.operation = "update"))]
    pub async fn update(
        &self,
        id: Uuid,
        changes: &UpdateSubscriptionPack,
    ) -> Result<SubscriptionPack, AppError> {
        let pack = sqlx::query_as::<Postgres, SubscriptionPack>(
            r#"
            UPDATE subscription_packs
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                sku = COALESCE($4, sku),
                price = COALESCE($5, price),
                validity_months = COALESCE($6, validity_months),
                updated_at = NOW()
            WHERE id = $1 AND is_active = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.sku.as_deref())
        .bind(changes.price)
        .bind(changes.validity_months)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Failed to update subscription pack"))?
        .ok_or_else(|| AppError::NotFound("Subscription pack not found".to_string()))?;

        Ok(pack)
    }

    /// Soft delete. Refused while open subscriptions still reference the
    /// pack; the check and the update run under a row lock.
    #[tracing::instrument(skip(self), fields(db.table = "subscription_packs", db.operation = "update"))]
    pub async fn soft_delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let locked = sqlx::query_scalar::<Postgres, Uuid>(
            r#"
            SELECT id FROM subscription_packs
            WHERE id = $1 AND is_active = TRUE
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, pack_id = %id, "Failed to lock subscription pack");
            AppError::Database(e)
        })?;

        if locked.is_none() {
            return Err(AppError::NotFound("Subscription pack not found".to_string()));
        }

        let in_use = sqlx::query_scalar::<Postgres, i64>(
            r#"
            SELECT COUNT(*) FROM subscriptions
            WHERE pack_id = $1 AND status IN ('active', 'approved')
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, pack_id = %id, "Failed to count pack subscriptions");
            AppError::Database(e)
        })?;

        if in_use > 0 {
            return Err(AppError::Conflict(
                "Cannot delete pack with active subscriptions".to_string(),
            ));
        }

        sqlx::query(
            r#"
            UPDATE subscription_packs
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, pack_id = %id, "Failed to delete subscription pack");
            AppError::Database(e)
        })?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(pack_id = %id, "Subscription pack soft-deleted");

        Ok(())
    }
}
