/// Time entry type model
///
/// Types are defined per company. Two independent flags decide how entries of
/// a type are treated: `is_billable` (invoicing) and `is_quota_relevant`
/// (entries consume the company quota named by `quota_name`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimeEntryType {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub is_billable: bool,
    pub is_quota_relevant: bool,

    /// Quota consumed by entries of this type; set whenever `is_quota_relevant`
    pub quota_name: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TimeEntryType {
    /// Quota name to charge, if entries of this type count against a quota
    pub fn charged_quota(&self) -> Option<&str> {
        if self.is_quota_relevant {
            self.quota_name.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTimeEntryType {
    pub company_id: Uuid,
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub is_billable: bool,
    pub is_quota_relevant: bool,
    pub quota_name: Option<String>,
}

impl TimeEntryType {
    pub async fn create<'e, E>(executor: E, data: CreateTimeEntryType) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let entry_type = sqlx::query_as::<_, TimeEntryType>(
            r#"
            INSERT INTO time_entry_types
                (company_id, name, color, icon, description, is_billable, is_quota_relevant, quota_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, company_id, name, color, icon, description, is_billable,
                      is_quota_relevant, quota_name, created_at, updated_at, deleted_at
            "#,
        )
        .bind(data.company_id)
        .bind(data.name)
        .bind(data.color)
        .bind(data.icon)
        .bind(data.description)
        .bind(data.is_billable)
        .bind(data.is_quota_relevant)
        .bind(data.quota_name)
        .fetch_one(executor)
        .await?;

        Ok(entry_type)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let entry_type = sqlx::query_as::<_, TimeEntryType>(
            r#"
            SELECT id, company_id, name, color, icon, description, is_billable,
                   is_quota_relevant, quota_name, created_at, updated_at, deleted_at
            FROM time_entry_types
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(entry_type)
    }

    pub async fn list_by_company<'e, E>(
        executor: E,
        company_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let entry_types = sqlx::query_as::<_, TimeEntryType>(
            r#"
            SELECT id, company_id, name, color, icon, description, is_billable,
                   is_quota_relevant, quota_name, created_at, updated_at, deleted_at
            FROM time_entry_types
            WHERE company_id = $1 AND deleted_at IS NULL
            ORDER BY name ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(executor)
        .await?;

        Ok(entry_types)
    }

    pub async fn count_by_company<'e, E>(executor: E, company_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM time_entry_types WHERE company_id = $1 AND deleted_at IS NULL",
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

    fn vacation() -> TimeEntryType {
        TimeEntryType {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            name: "Vacation".to_string(),
            color: "#00aa00".to_string(),
            icon: None,
            description: None,
            is_billable: false,
            is_quota_relevant: true,
            quota_name: Some("pto".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_charged_quota_when_relevant() {
        assert_eq!(vacation().charged_quota(), Some("pto"));
    }

    #[test]
    fn test_charged_quota_ignores_name_when_not_relevant() {
        let entry_type = TimeEntryType {
            is_quota_relevant: false,
            ..vacation()
        };
        assert_eq!(entry_type.charged_quota(), None);
    }
}
