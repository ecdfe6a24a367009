/// Quota model and database operations
///
/// A quota belongs to one company and defines a consumption ceiling (`count`)
/// together with the cadence at which per-user consumption returns to zero.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE quotas (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     company_id UUID NOT NULL REFERENCES companies(id),
///     name VARCHAR(100) NOT NULL,
///     count INTEGER NOT NULL CHECK (count >= 0),
///     reset_at VARCHAR(16) NOT NULL DEFAULT 'firstOfYear',
///     ...
/// );
/// CREATE UNIQUE INDEX quotas_company_name_key ON quotas (company_id, name) WHERE deleted_at IS NULL;
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Cadence at which user consumption of a quota resets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuotaResetAt {
    /// January 1st, 00:00 local time
    FirstOfYear,

    /// 1st of each month, 00:00 local time
    FirstOfMonth,

    /// Monday, 00:00 local time
    FirstOfWeek,
}

impl QuotaResetAt {
    /// Converts cadence to its stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaResetAt::FirstOfYear => "firstOfYear",
            QuotaResetAt::FirstOfMonth => "firstOfMonth",
            QuotaResetAt::FirstOfWeek => "firstOfWeek",
        }
    }

    /// Parses cadence from its stored representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "firstOfYear" => Some(QuotaResetAt::FirstOfYear),
            "firstOfMonth" => Some(QuotaResetAt::FirstOfMonth),
            "firstOfWeek" => Some(QuotaResetAt::FirstOfWeek),
            _ => None,
        }
    }
}

impl Default for QuotaResetAt {
    fn default() -> Self {
        QuotaResetAt::FirstOfYear
    }
}

/// Quota definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Quota {
    pub id: Uuid,
    pub company_id: Uuid,

    /// Name referenced by `TimeEntryType::quota_name`
    pub name: String,

    /// Consumption ceiling per user and period
    pub count: i32,

    /// Stored cadence; see [`Quota::reset_cadence`]
    pub reset_at: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Quota {
    /// Gets the parsed reset cadence
    pub fn reset_cadence(&self) -> Option<QuotaResetAt> {
        QuotaResetAt::from_str(&self.reset_at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuota {
    pub company_id: Uuid,
    pub name: String,
    pub count: i32,
    #[serde(default)]
    pub reset_at: QuotaResetAt,
}

impl Quota {
    pub async fn create<'e, E>(executor: E, data: CreateQuota) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let quota = sqlx::query_as::<_, Quota>(
            r#"
            INSERT INTO quotas (company_id, name, count, reset_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, company_id, name, count, reset_at, created_at, updated_at, deleted_at
            "#,
        )
        .bind(data.company_id)
        .bind(data.name)
        .bind(data.count)
        .bind(data.reset_at.as_str())
        .fetch_one(executor)
        .await?;

        Ok(quota)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let quota = sqlx::query_as::<_, Quota>(
            r#"
            SELECT id, company_id, name, count, reset_at, created_at, updated_at, deleted_at
            FROM quotas
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(quota)
    }

    /// Finds a live quota by name within a company
    pub async fn find_by_company_and_name<'e, E>(
        executor: E,
        company_id: Uuid,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let quota = sqlx::query_as::<_, Quota>(
            r#"
            SELECT id, company_id, name, count, reset_at, created_at, updated_at, deleted_at
            FROM quotas
            WHERE company_id = $1 AND name = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(company_id)
        .bind(name)
        .fetch_optional(executor)
        .await?;

        Ok(quota)
    }

    pub async fn list_by_company<'e, E>(
        executor: E,
        company_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let quotas = sqlx::query_as::<_, Quota>(
            r#"
            SELECT id, company_id, name, count, reset_at, created_at, updated_at, deleted_at
            FROM quotas
            WHERE company_id = $1 AND deleted_at IS NULL
            ORDER BY name ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(executor)
        .await?;

        Ok(quotas)
    }

    pub async fn count_by_company<'e, E>(executor: E, company_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM quotas WHERE company_id = $1 AND deleted_at IS NULL",
        )
        .bind(company_id)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_at_as_str() {
        assert_eq!(QuotaResetAt::FirstOfYear.as_str(), "firstOfYear");
        assert_eq!(QuotaResetAt::FirstOfMonth.as_str(), "firstOfMonth");
        assert_eq!(QuotaResetAt::FirstOfWeek.as_str(), "firstOfWeek");
    }

    #[test]
    fn test_reset_at_from_str() {
        assert_eq!(QuotaResetAt::from_str("firstOfMonth"), Some(QuotaResetAt::FirstOfMonth));
        assert_eq!(QuotaResetAt::from_str("first_of_month"), None);
    }

    #[test]
    fn test_reset_at_serde_matches_storage() {
        let json = serde_json::to_string(&QuotaResetAt::FirstOfWeek).unwrap();
        assert_eq!(json, "\"firstOfWeek\"");

        let parsed: QuotaResetAt = serde_json::from_str("\"firstOfYear\"").unwrap();
        assert_eq!(parsed, QuotaResetAt::FirstOfYear);
    }

    #[test]
    fn test_reset_at_default() {
        assert_eq!(QuotaResetAt::default(), QuotaResetAt::FirstOfYear);
    }
}
