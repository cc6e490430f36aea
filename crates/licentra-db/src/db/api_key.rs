use licentra_core::models::ApiKey;
use licentra_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Repository for SDK API keys. Keys are stored verbatim and looked up by
/// exact match; rows are never hard-deleted.
#[derive(Clone)]
pub struct ApiKeyRepository {
    pool: PgPool,
}

impl ApiKeyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, key), fields(db.table = "api_keys", db.operation = "insert"))]
    pub async fn create(&self, customer_id: Uuid, key: &str) -> Result<ApiKey, AppError> {
        let api_key = sqlx::query_as::<Postgres, ApiKey>(
            r#"
            INSERT INTO api_keys (customer_id, key)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, customer_id = %customer_id, "Failed to create API key");
            AppError::Database(e)
        })?;

        tracing::info!(api_key_id = %api_key.id, customer_id = %customer_id, "API key created");

        Ok(api_key)
    }

    /// Existing active key for a customer; SDK login reuses this instead of
    /// minting a new key.
    #[tracing::instrument(skip(self), fields(db.table = "api_keys", db.operation = "select"))]
    pub async fn get_active_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Option<ApiKey>, AppError> {
        let api_key = sqlx::query_as::<Postgres, ApiKey>(
            r#"
            SELECT * FROM api_keys
            WHERE customer_id = $1 AND is_active = TRUE
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, customer_id = %customer_id, "Failed to get API key for customer");
            AppError::Database(e)
        })?;

        Ok(api_key)
    }

    /// Exact-match lookup of an active key.
    #[tracing::instrument(skip(self, key), fields(db.table = "api_keys", db.operation = "select"))]
    pub async fn get_active_by_key(&self, key: &str) -> Result<Option<ApiKey>, AppError> {
        let api_key = sqlx::query_as::<Postgres, ApiKey>(
            r#"
            SELECT * FROM api_keys
            WHERE key = $1 AND is_active = TRUE
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to get API key");
            AppError::Database(e)
        })?;

        Ok(api_key)
    }
}
