/// User role model
///
/// Roles are scoped to a company; the name is unique per company. Roles with
/// `internal_usage` set are managed by the system (the `admin` role created
/// during provisioning) and cannot be deleted by users.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE user_roles (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     company_id UUID NOT NULL REFERENCES companies(id),
///     name VARCHAR(100) NOT NULL,
///     internal_usage BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Name of the system-reserved role given to a tenant's first user
pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRole {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,

    /// System-managed role; not user-deletable
    pub internal_usage: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UserRole {
    /// Whether a user may delete this role
    pub fn is_user_deletable(&self) -> bool {
        !self.internal_usage
    }
}

/// Input for creating a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRole {
    pub company_id: Uuid,
    pub name: String,
    pub internal_usage: bool,
}

impl CreateUserRole {
    /// The internal admin role for a freshly provisioned company
    pub fn admin_for(company_id: Uuid) -> Self {
        CreateUserRole {
            company_id,
            name: ADMIN_ROLE.to_string(),
            internal_usage: true,
        }
    }
}

impl UserRole {
    pub async fn create<'e, E>(executor: E, data: CreateUserRole) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let role = sqlx::query_as::<_, UserRole>(
            r#"
            INSERT INTO user_roles (company_id, name, internal_usage)
            VALUES ($1, $2, $3)
            RETURNING id, company_id, name, internal_usage, created_at, updated_at, deleted_at
            "#,
        )
        .bind(data.company_id)
        .bind(data.name)
        .bind(data.internal_usage)
        .fetch_one(executor)
        .await?;

        Ok(role)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let role = sqlx::query_as::<_, UserRole>(
            r#"
            SELECT id, company_id, name, internal_usage, created_at, updated_at, deleted_at
            FROM user_roles
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(role)
    }

    /// Lists live roles of a company, oldest first
    pub async fn list_by_company<'e, E>(
        executor: E,
        company_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let roles = sqlx::query_as::<_, UserRole>(
            r#"
            SELECT id, company_id, name, internal_usage, created_at, updated_at, deleted_at
            FROM user_roles
            WHERE company_id = $1 AND deleted_at IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(executor)
        .await?;

        Ok(roles)
    }

    pub async fn count_by_company<'e, E>(executor: E, company_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM user_roles WHERE company_id = $1 AND deleted_at IS NULL",
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
            "UPDATE user_roles SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
