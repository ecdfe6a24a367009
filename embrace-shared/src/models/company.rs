/// Company model and database operations
///
/// A company is the tenancy root: users, roles, quotas and time entry types
/// all belong to exactly one company.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE companies (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     website VARCHAR(512) NOT NULL DEFAULT '',
///     primary_email VARCHAR(320) NOT NULL,
///     timezone VARCHAR(64) NOT NULL DEFAULT 'UTC',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// CREATE UNIQUE INDEX companies_name_key ON companies (name) WHERE deleted_at IS NULL;
/// CREATE UNIQUE INDEX companies_primary_email_key ON companies (primary_email) WHERE deleted_at IS NULL;
/// ```
///
/// Rows are never removed; [`Company::soft_delete`] sets the `deleted_at`
/// tombstone and every lookup ignores tombstoned rows.
///
/// # Example
///
/// ```no_run
/// use embrace_shared::models::company::{Company, CreateCompany};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let company = Company::create(&pool, CreateCompany {
///     name: "Acme".to_string(),
///     description: String::new(),
///     website: "https://acme.example".to_string(),
///     primary_email: "a@acme.com".to_string(),
///     timezone: "Europe/Berlin".to_string(),
/// })
/// .await?;
///
/// let found = Company::find_by_name(&pool, "Acme").await?;
/// assert_eq!(found.map(|c| c.id), Some(company.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Company (tenant) record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    /// Unique company ID (UUID v4)
    pub id: Uuid,

    /// Company name, unique among live companies
    pub name: String,

    /// Free-form description
    pub description: String,

    /// Company website
    pub website: String,

    /// Primary contact email, unique among live companies
    pub primary_email: String,

    /// IANA timezone used for quota reset boundaries
    pub timezone: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Tombstone; `Some` once the company has been deleted
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Company {
    /// Parses the stored timezone
    ///
    /// Returns `None` when the stored value is not a known IANA zone.
    pub fn reference_timezone(&self) -> Option<Tz> {
        self.timezone.parse::<Tz>().ok()
    }
}

/// Input for creating a new company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCompany {
    pub name: String,
    pub description: String,
    pub website: String,
    pub primary_email: String,
    pub timezone: String,
}

/// Input for updating a company
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCompany {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub primary_email: Option<String>,
    pub timezone: Option<String>,
}

impl Company {
    /// Inserts a new company
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `companies_name_key` or
    /// `companies_primary_email_key` when a live company already uses the
    /// name or contact email.
    pub async fn create<'e, E>(executor: E, data: CreateCompany) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (name, description, website, primary_email, timezone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, website, primary_email, timezone,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.website)
        .bind(data.primary_email)
        .bind(data.timezone)
        .fetch_one(executor)
        .await?;

        Ok(company)
    }

    /// Finds a live company by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let company = sqlx::query_as::<_, Company>(
            r#"
            SELECT id, name, description, website, primary_email, timezone,
                   created_at, updated_at, deleted_at
            FROM companies
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(company)
    }

    /// Finds a live company by exact name
    pub async fn find_by_name<'e, E>(executor: E, name: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let company = sqlx::query_as::<_, Company>(
            r#"
            SELECT id, name, description, website, primary_email, timezone,
                   created_at, updated_at, deleted_at
            FROM companies
            WHERE name = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(name)
        .fetch_optional(executor)
        .await?;

        Ok(company)
    }

    /// Finds the company a user belongs to
    pub async fn find_by_user_id<'e, E>(
        executor: E,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let company = sqlx::query_as::<_, Company>(
            r#"
            SELECT c.id, c.name, c.description, c.website, c.primary_email, c.timezone,
                   c.created_at, c.updated_at, c.deleted_at
            FROM companies c
            JOIN users u ON u.company_id = c.id
            WHERE u.id = $1 AND u.deleted_at IS NULL AND c.deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(company)
    }

    /// Updates a live company
    ///
    /// Returns `None` if no live company has the given ID.
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        data: UpdateCompany,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let mut query = String::from("UPDATE companies SET updated_at = NOW()");
        let mut bind_count = 1;

        for (column, present) in [
            ("name", data.name.is_some()),
            ("description", data.description.is_some()),
            ("website", data.website.is_some()),
            ("primary_email", data.primary_email.is_some()),
            ("timezone", data.timezone.is_some()),
        ] {
            if present {
                bind_count += 1;
                query.push_str(&format!(", {} = ${}", column, bind_count));
            }
        }

        query.push_str(
            " WHERE id = $1 AND deleted_at IS NULL \
             RETURNING id, name, description, website, primary_email, timezone, \
             created_at, updated_at, deleted_at",
        );

        let mut q = sqlx::query_as::<_, Company>(&query).bind(id);

        for value in [
            data.name,
            data.description,
            data.website,
            data.primary_email,
            data.timezone,
        ]
        .into_iter()
        .flatten()
        {
            q = q.bind(value);
        }

        let company = q.fetch_optional(executor).await?;

        Ok(company)
    }

    /// Tombstones a live company
    ///
    /// Returns true if a live row was tombstoned.
    pub async fn soft_delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE companies SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Company {
        Company {
            id: Uuid::new_v4(),
            name: "Acme".to_string(),
            description: String::new(),
            website: String::new(),
            primary_email: "a@acme.com".to_string(),
            timezone: "Europe/Berlin".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_reference_timezone() {
        let company = sample();
        assert_eq!(company.reference_timezone(), Some(chrono_tz::Europe::Berlin));
    }

    #[test]
    fn test_reference_timezone_unknown() {
        let mut company = sample();
        company.timezone = "Mars/Olympus_Mons".to_string();
        assert!(company.reference_timezone().is_none());
    }

    #[test]
    fn test_update_company_default() {
        let update = UpdateCompany::default();
        assert!(update.name.is_none());
        assert!(update.primary_email.is_none());
        assert!(update.timezone.is_none());
    }
}
