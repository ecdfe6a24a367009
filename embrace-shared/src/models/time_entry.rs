/// Time entry model
///
/// A logged span of work (or absence) for one user, classified by a
/// [`TimeEntryType`](super::time_entry_type::TimeEntryType). The end time is
/// optional for entries that are still running.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimeEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub time_entry_type_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,

    /// Length in hours, derived from start/end when both are known
    pub duration: Option<f64>,

    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTimeEntry {
    pub user_id: Uuid,
    pub time_entry_type_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<f64>,
    pub note: String,
}

/// Hours between two instants
pub fn duration_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / 3600.0
}

impl TimeEntry {
    pub async fn create<'e, E>(executor: E, data: CreateTimeEntry) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let entry = sqlx::query_as::<_, TimeEntry>(
            r#"
            INSERT INTO time_entries (user_id, time_entry_type_id, start_time, end_time, duration, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, time_entry_type_id, start_time, end_time, duration, note,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.time_entry_type_id)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(data.duration)
        .bind(data.note)
        .fetch_one(executor)
        .await?;

        Ok(entry)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let entry = sqlx::query_as::<_, TimeEntry>(
            r#"
            SELECT id, user_id, time_entry_type_id, start_time, end_time, duration, note,
                   created_at, updated_at, deleted_at
            FROM time_entries
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_duration_hours() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        let end = start + Duration::minutes(90);
        assert!((duration_hours(start, end) - 1.5).abs() < f64::EPSILON);
    }
}
