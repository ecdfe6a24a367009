/// User model and database operations
///
/// A user belongs to exactly one company and has exactly one role and one
/// profile. Email is the identity key: unique across all live users of all
/// companies, compared by exact (case-sensitive) equality.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(320) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     company_id UUID NOT NULL REFERENCES companies(id),
///     role_id UUID NOT NULL REFERENCES user_roles(id),
///     profile_id UUID NOT NULL REFERENCES user_profiles(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// CREATE UNIQUE INDEX users_email_key ON users (email) WHERE deleted_at IS NULL;
/// ```
///
/// # Example
///
/// ```no_run
/// use embrace_shared::models::user::User;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// if let Some(user) = User::find_by_email(&pool, "a@acme.com").await? {
///     println!("user {} belongs to company {}", user.id, user.company_id);
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// User account
///
/// The password hash is skipped when serializing so it can never be echoed
/// back to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address (exact, case-sensitive identity key)
    pub email: String,

    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Owning company
    pub company_id: Uuid,

    /// Assigned role (scoped to `company_id`)
    pub role_id: Uuid,

    /// Owned profile
    pub profile_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a user
///
/// `password_hash` must already be hashed; plaintext never reaches this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub company_id: Uuid,
    pub role_id: Uuid,
    pub profile_id: Uuid,
}

impl User {
    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `users_email_key` when a live user
    /// already has the email.
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, company_id, role_id, profile_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, company_id, role_id, profile_id,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.company_id)
        .bind(data.role_id)
        .bind(data.profile_id)
        .fetch_one(executor)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, company_id, role_id, profile_id,
                   created_at, updated_at, deleted_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Finds a live user by email
    ///
    /// Plain `=` comparison: `%` and `_` in the input are literal characters,
    /// not wildcards.
    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, company_id, role_id, profile_id,
                   created_at, updated_at, deleted_at
            FROM users
            WHERE email = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Lists live users of a company, oldest first
    pub async fn list_by_company<'e, E>(
        executor: E,
        company_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, company_id, role_id, profile_id,
                   created_at, updated_at, deleted_at
            FROM users
            WHERE company_id = $1 AND deleted_at IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(executor)
        .await?;

        Ok(users)
    }

    /// Finds the first live user of a company holding the given role
    pub async fn find_by_role_and_company<'e, E>(
        executor: E,
        role_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, company_id, role_id, profile_id,
                   created_at, updated_at, deleted_at
            FROM users
            WHERE role_id = $1 AND company_id = $2 AND deleted_at IS NULL
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(role_id)
        .bind(company_id)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Counts live users of a company
    pub async fn count_by_company<'e, E>(executor: E, company_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users WHERE company_id = $1 AND deleted_at IS NULL",
        )
        .bind(company_id)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }

    pub async fn soft_delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
