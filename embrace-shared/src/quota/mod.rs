/// Quota accounting
///
/// Each quota-relevant time entry consumes one unit of the company quota
/// named by its type. Consumption is tracked per user in a
/// [`UserQuota`](crate::models::user_quota::UserQuota) counter that returns
/// to zero at the start of every reset period (see [`period`]).
///
/// Exceeding a quota never goes unnoticed: [`QuotaConsumption::exceeded`] is
/// always reported. Whether the entry is kept is decided by the
/// [`ExceedancePolicy`].
///
/// # Example
///
/// ```no_run
/// use embrace_shared::db::{Gateway, MemoryGateway, QuotaStore, UnitOfWork};
/// use embrace_shared::quota::consume;
/// use chrono::Utc;
/// use uuid::Uuid;
///
/// # async fn example(user_id: Uuid, quota_id: Uuid) -> Result<(), embrace_shared::error::ServiceError> {
/// let gateway = MemoryGateway::new();
/// let mut uow = gateway.begin().await?;
///
/// let quota = uow.quota_by_id(quota_id).await?;
/// let consumption = consume(&mut uow, user_id, &quota, chrono_tz::UTC, Utc::now()).await?;
/// if consumption.exceeded {
///     println!("{} over limit: {}/{}", consumption.quota_name, consumption.count, consumption.limit);
/// }
///
/// uow.commit().await?;
/// # Ok(())
/// # }
/// ```

pub mod period;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::db::{QuotaStore, UserStore};
use crate::error::ServiceError;
use crate::models::quota::{Quota, QuotaResetAt};

pub use period::{needs_reset, period_start};

/// What happens to an entry that pushes a counter past its ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExceedancePolicy {
    /// Keep the entry and report the exceedance
    #[default]
    Allow,

    /// Roll the entry back with `QuotaExceeded`
    Deny,
}

impl ExceedancePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExceedancePolicy::Allow => "allow",
            ExceedancePolicy::Deny => "deny",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "allow" => Some(ExceedancePolicy::Allow),
            "deny" => Some(ExceedancePolicy::Deny),
            _ => None,
        }
    }
}

/// Outcome of consuming one unit of a quota
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaConsumption {
    pub quota_id: Uuid,
    pub quota_name: String,
    pub user_quota_id: Uuid,

    /// Counter after this consumption
    pub count: i32,

    /// Ceiling defined by the quota
    pub limit: i32,

    /// Whether the counter was reset before incrementing
    pub reset_applied: bool,

    /// `count > limit`
    pub exceeded: bool,
}

/// Counter value after consuming one unit
///
/// Returns the new count and whether a period reset was applied first.
pub fn next_count(
    current: i32,
    last_touched: DateTime<Utc>,
    now: DateTime<Utc>,
    cadence: QuotaResetAt,
    tz: Tz,
) -> (i32, bool) {
    if needs_reset(last_touched, now, cadence, tz) {
        (1, true)
    } else {
        (current.saturating_add(1), false)
    }
}

/// Consumes one unit of `quota` for `user_id`
///
/// Locks the user's counter for the rest of the unit of work, applies a
/// pending period reset and stores the incremented value. The caller commits
/// or rolls back.
///
/// # Errors
///
/// `QuotaConfiguration` when the quota's reset cadence is not recognised or
/// the quota belongs to another company than the user; persistence failures
/// otherwise.
pub async fn consume<S>(
    store: &mut S,
    user_id: Uuid,
    quota: &Quota,
    tz: Tz,
    now: DateTime<Utc>,
) -> Result<QuotaConsumption, ServiceError>
where
    S: QuotaStore + UserStore + ?Sized,
{
    let cadence = quota.reset_cadence().ok_or_else(|| {
        ServiceError::QuotaConfiguration(format!(
            "quota '{}' has unknown reset cadence '{}'",
            quota.name, quota.reset_at
        ))
    })?;

    let user = store.user_by_id(user_id).await?;
    if user.company_id != quota.company_id {
        return Err(ServiceError::QuotaConfiguration(format!(
            "quota '{}' does not belong to the user's company",
            quota.name
        )));
    }

    let user_quota = store.lock_user_quota(user_id, quota.id, now).await?;
    let (count, reset_applied) = next_count(user_quota.count, user_quota.updated_at, now, cadence, tz);
    let stored = store.store_user_quota_count(user_quota.id, count, now).await?;

    debug!(
        quota_id = %quota.id,
        user_id = %user_id,
        count = stored.count,
        limit = quota.count,
        reset_applied,
        "Consumed quota unit"
    );

    Ok(QuotaConsumption {
        quota_id: quota.id,
        quota_name: quota.name.clone(),
        user_quota_id: stored.id,
        count: stored.count,
        limit: quota.count,
        reset_applied,
        exceeded: stored.count > quota.count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::UTC;

    #[test]
    fn test_next_count_increments_within_period() {
        let last = Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 2, 3, 8, 0, 0).unwrap();

        assert_eq!(next_count(4, last, now, QuotaResetAt::FirstOfYear, UTC), (5, false));
    }

    #[test]
    fn test_next_count_resets_to_one() {
        let last = Utc.with_ymd_and_hms(2024, 12, 20, 8, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 8, 0, 0).unwrap();

        assert_eq!(next_count(4, last, now, QuotaResetAt::FirstOfYear, UTC), (1, true));
    }

    #[test]
    fn test_next_count_saturates() {
        let now = Utc::now();
        assert_eq!(
            next_count(i32::MAX, now, now, QuotaResetAt::FirstOfYear, UTC),
            (i32::MAX, false)
        );
    }

    #[test]
    fn test_exceedance_policy_parsing() {
        assert_eq!(ExceedancePolicy::from_str("deny"), Some(ExceedancePolicy::Deny));
        assert_eq!(ExceedancePolicy::from_str("ALLOW"), Some(ExceedancePolicy::Allow));
        assert_eq!(ExceedancePolicy::from_str("warn"), None);
        assert_eq!(ExceedancePolicy::default(), ExceedancePolicy::Allow);
        assert_eq!(ExceedancePolicy::Deny.as_str(), "deny");
    }
}
