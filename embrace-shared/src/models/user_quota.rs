/// Per-user quota consumption
///
/// Links one user to one quota with a running `count`. Unique per
/// (user, quota). `updated_at` is the last time the counter was touched and
/// drives period resets.
///
/// # Concurrency
///
/// Counters are shared between concurrent time-entry submissions. Writers go
/// through [`UserQuota::lock`], which makes sure the row exists and then takes
/// a row lock (`FOR UPDATE`) for the rest of the surrounding transaction, so
/// the read-modify-write in [`UserQuota::store_count`] cannot lose updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserQuota {
    pub id: Uuid,
    pub user_id: Uuid,
    pub quota_id: Uuid,

    /// Units consumed in the current period
    pub count: i32,

    pub created_at: DateTime<Utc>,

    /// Last time `count` was written
    pub updated_at: DateTime<Utc>,
}

impl UserQuota {
    /// Ensures the (user, quota) row exists and locks it
    ///
    /// A missing row is created with `count = 0` and `updated_at = now`.
    /// Returns `None` when the user and quota do not belong to the same
    /// company; no row is created then. Must run inside a transaction for the
    /// lock to be meaningful.
    pub async fn lock(
        conn: &mut PgConnection,
        user_id: Uuid,
        quota_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO user_quotas (user_id, quota_id, count, created_at, updated_at)
            SELECT u.id, q.id, 0, $3, $3
            FROM users u
            JOIN quotas q ON q.company_id = u.company_id
            WHERE u.id = $1 AND q.id = $2
            ON CONFLICT (user_id, quota_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(quota_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        let user_quota = sqlx::query_as::<_, UserQuota>(
            r#"
            SELECT uq.id, uq.user_id, uq.quota_id, uq.count, uq.created_at, uq.updated_at
            FROM user_quotas uq
            JOIN users u ON u.id = uq.user_id
            JOIN quotas q ON q.id = uq.quota_id
            WHERE uq.user_id = $1 AND uq.quota_id = $2 AND q.company_id = u.company_id
            FOR UPDATE OF uq
            "#,
        )
        .bind(user_id)
        .bind(quota_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(user_quota)
    }

    /// Writes a new counter value and touch time
    pub async fn store_count<'e, E>(
        executor: E,
        id: Uuid,
        count: i32,
        now: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user_quota = sqlx::query_as::<_, UserQuota>(
            r#"
            UPDATE user_quotas
            SET count = $2, updated_at = $3
            WHERE id = $1
            RETURNING id, user_id, quota_id, count, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(count)
        .bind(now)
        .fetch_one(executor)
        .await?;

        Ok(user_quota)
    }

    pub async fn find_by_user_and_quota<'e, E>(
        executor: E,
        user_id: Uuid,
        quota_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user_quota = sqlx::query_as::<_, UserQuota>(
            r#"
            SELECT id, user_id, quota_id, count, created_at, updated_at
            FROM user_quotas
            WHERE user_id = $1 AND quota_id = $2
            "#,
        )
        .bind(user_id)
        .bind(quota_id)
        .fetch_optional(executor)
        .await?;

        Ok(user_quota)
    }

    pub async fn list_by_user<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user_quotas = sqlx::query_as::<_, UserQuota>(
            r#"
            SELECT id, user_id, quota_id, count, created_at, updated_at
            FROM user_quotas
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;

        Ok(user_quotas)
    }

    pub async fn count_by_user<'e, E>(executor: E, user_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM user_quotas WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(executor)
                .await?;

        Ok(count)
    }
}
