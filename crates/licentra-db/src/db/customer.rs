use licentra_core::models::{Customer, Principal, UserRole};
use licentra_core::AppError;
use serde::Deserialize;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Partial update of a customer profile; only provided fields change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Repository for customer profiles. Customers are soft-deleted via
/// `is_active` and excluded from every lookup afterwards.
#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

fn conflict_on_unique(e: sqlx::Error, context: &str) -> AppError {
    let err = AppError::Database(e);
    if err.is_unique_violation() {
        AppError::Conflict("Email already registered".to_string())
    } else {
        tracing::error!(error = %err, "{}", context);
        err
    }
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a login principal and its customer profile in one transaction.
    /// Either both rows exist afterwards or neither does.
    #[tracing::instrument(skip(self, password_hash), fields(db.table = "customers", db.operation = "insert"))]
    pub async fn create_with_principal(
        &self,
        name: &str,
        email: &str,
        phone: &str,
        password_hash: &str,
    ) -> Result<(Principal, Customer), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let principal = sqlx::query_as::<Postgres, Principal>(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(UserRole::Customer)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "Failed to create principal for customer"))?;

        let customer = sqlx::query_as::<Postgres, Customer>(
            r#"
            INSERT INTO customers (principal_id, name, email, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(principal.id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "Failed to create customer profile"))?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(customer_id = %customer.id, principal_id = %principal.id, "Customer created");

        Ok((principal, customer))
    }

    #[tracing::instrument(skip(self), fields(db.table = "customers", db.operation = "select"))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<Postgres, Customer>(
            r#"
            SELECT * FROM customers
            WHERE id = $1 AND is_active = TRUE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, customer_id = %id, "Failed to get customer");
            AppError::Database(e)
        })?;

        Ok(customer)
    }

    #[tracing::instrument(skip(self), fields(db.table = "customers", db.operation = "select"))]
    pub async fn get_by_principal(&self, principal_id: Uuid) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<Postgres, Customer>(
            r#"
            SELECT * FROM customers
            WHERE principal_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(principal_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, principal_id = %principal_id, "Failed to get customer by principal");
            AppError::Database(e)
        })?;

        Ok(customer)
    }

    /// List active customers, optionally filtered by a case-insensitive
    /// substring match on name or email.
    #[tracing::instrument(skip(self), fields(db.table = "customers", db.operation = "select"))]
    pub async fn list(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Customer>, AppError> {
        let pattern = search.map(|s| format!("%{}%", s));

        let customers = sqlx::query_as::<Postgres, Customer>(
            r#"
            SELECT * FROM customers
            WHERE is_active = TRUE
              AND ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1)
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
            tracing::error!(error = %e, "Failed to list customers");
            AppError::Database(e)
        })?;

        Ok(customers)
    }

    #[tracing::instrument(skip(self), fields(db.table = "customers", db.operation = "select"))]
    pub async fn count(&self, search: Option<&str>) -> Result<i64, AppError> {
        let pattern = search.map(|s| format!("%{}%", s));

        let total = sqlx::query_scalar::<Postgres, i64>(
            r#"
            SELECT COUNT(*) FROM customers
            WHERE is_active = TRUE
              AND ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1)
            "#,
        )
        .bind(pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to count customers");
            AppError::Database(e)
        })?;

        Ok(total)
    }

    /// Partial update. An email change also rewrites the linked principal's
    /// email inside the same transaction so login and profile stay in sync.
    #[tracing::instrument(skip(self, changes), fields(db.table = "customers", db.operation = "update"))]
    pub async fn update(&self, id: Uuid, changes: &UpdateCustomer) -> Result<Customer, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let current = sqlx::query_as::<Postgres, Customer>(
            r#"
            SELECT * FROM customers
            WHERE id = $1 AND is_active = TRUE
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, customer_id = %id, "Failed to lock customer for update");
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

        if let Some(email) = changes.email.as_deref() {
            if email != current.email {
                sqlx::query(
                    r#"
                    UPDATE users
                    SET email = $2, updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(current.principal_id)
                .bind(email)
                .execute(&mut *tx)
                .await
                .map_err(|e| conflict_on_unique(e, "Failed to update principal email"))?;
            }
        }

        let customer = sqlx::query_as::<Postgres, Customer>(
            r#"
            UPDATE customers
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.phone.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "Failed to update customer"))?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(customer)
    }

    /// Soft delete. Returns false when no active customer matched.
    #[tracing::instrument(skip(self), fields(db.table = "customers", db.operation = "update"))]
    pub async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND is_active = TRUE
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, customer_id = %id, "Failed to delete customer");
            AppError::Database(e)
        })?;

        let deleted = result.rows_affected() > 0;

        if deleted {
            tracing::info!(customer_id = %id, "Customer soft-deleted");
        }

        Ok(deleted)
    }
}
