use licentra_core::models::{Principal, UserRole};
use licentra_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Repository for login principals (the `users` table).
#[derive(Clone)]
pub struct PrincipalRepository {
    pool: PgPool,
}

impl PrincipalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new principal. Email uniqueness violations surface as Conflict.
    #[tracing::instrument(skip(self, password_hash), fields(db.table = "users", db.operation = "insert"))]
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        role: UserRole,
    ) -> Result<Principal, AppError> {
        let principal = sqlx::query_as::<Postgres, Principal>(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let err = AppError::Database(e);
            if err.is_unique_violation() {
                AppError::Conflict("Email already registered".to_string())
            } else {
                tracing::error!(error = %err, "Failed to create principal");
                err
            }
        })?;

        tracing::info!(principal_id = %principal.id, role = %role, "Principal created");

        Ok(principal)
    }

    /// Look up a principal by email, regardless of role or active flag.
    /// Callers decide how inactive or wrong-role principals are rejected.
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn get_by_email(&self, email: &str) -> Result<Option<Principal>, AppError> {
        let principal = sqlx::query_as::<Postgres, Principal>(
            r#"
            SELECT * FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to get principal by email");
            AppError::Database(e)
        })?;

        Ok(principal)
    }

    /// Replace a stored credential hash. Used to upgrade legacy digests to
    /// the strong scheme after a successful login.
    #[tracing::instrument(skip(self, password_hash), fields(db.table = "users", db.operation = "update"))]
    pub async fn update_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, principal_id = %id, "Failed to update password hash");
            AppError::Database(e)
        })?;

        tracing::info!(principal_id = %id, "Credential hash upgraded");

        Ok(())
    }
}
