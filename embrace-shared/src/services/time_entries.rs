/// Time entry recording
///
/// Persists a time entry and, when its type is quota-relevant, consumes one
/// unit of the named company quota in the same unit of work. Either both are
/// stored or neither is.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{CompanyStore, Gateway, QuotaStore, TimeEntryStore, UnitOfWork, UserStore};
use crate::error::ServiceError;
use crate::models::time_entry::{duration_hours, CreateTimeEntry, TimeEntry};
use crate::quota::{self, ExceedancePolicy, QuotaConsumption};

/// Time entry submission
#[derive(Debug, Clone, Deserialize)]
pub struct RecordTimeEntry {
    pub user_id: Uuid,
    pub time_entry_type_id: Uuid,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordedTimeEntry {
    pub entry: TimeEntry,

    /// Present when the entry's type is quota-relevant
    pub consumption: Option<QuotaConsumption>,
}

#[derive(Debug, Clone)]
pub struct TimeEntryRecorder<G> {
    gateway: G,
    policy: ExceedancePolicy,
    default_timezone: Tz,
}

impl<G: Gateway> TimeEntryRecorder<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            policy: ExceedancePolicy::default(),
            default_timezone: Tz::UTC,
        }
    }

    pub fn with_policy(mut self, policy: ExceedancePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Zone used when a company's stored timezone does not parse
    pub fn with_default_timezone(mut self, timezone: Tz) -> Self {
        self.default_timezone = timezone;
        self
    }

    pub async fn record(&self, request: RecordTimeEntry) -> Result<RecordedTimeEntry, ServiceError> {
        self.record_at(request, Utc::now()).await
    }

    /// Records an entry as of `now`
    ///
    /// `now` decides which reset period the quota counter falls into.
    ///
    /// # Errors
    ///
    /// - `Validation` when `end_time` precedes `start_time`
    /// - `NotFound` for an unknown user, or for a type that is unknown or
    ///   belongs to another company
    /// - `QuotaConfiguration` when the type names a quota the company lacks
    /// - `QuotaExceeded` under the deny policy; nothing is persisted
    #[tracing::instrument(
        skip(self, request, now),
        fields(user_id = %request.user_id, time_entry_type_id = %request.time_entry_type_id)
    )]
    pub async fn record_at(
        &self,
        request: RecordTimeEntry,
        now: DateTime<Utc>,
    ) -> Result<RecordedTimeEntry, ServiceError> {
        if request.end_time.is_some_and(|end| end < request.start_time) {
            return Err(ServiceError::invalid("end_time", "before_start"));
        }

        let mut uow = self.gateway.begin().await?;

        let user = uow.user_by_id(request.user_id).await?;
        let entry_type = uow.time_entry_type_by_id(request.time_entry_type_id).await?;
        if entry_type.company_id != user.company_id {
            warn!(
                user_company_id = %user.company_id,
                type_company_id = %entry_type.company_id,
                "Rejected time entry type from another company"
            );
            return Err(ServiceError::NotFound {
                entity: "time entry type",
            });
        }

        let entry = uow
            .create_time_entry(CreateTimeEntry {
                user_id: user.id,
                time_entry_type_id: entry_type.id,
                start_time: request.start_time,
                end_time: request.end_time,
                duration: request
                    .end_time
                    .map(|end| duration_hours(request.start_time, end)),
                note: request.note,
            })
            .await?;

        let consumption = match entry_type.charged_quota() {
            None => None,
            Some(quota_name) => {
                let company = uow.company_by_id(user.company_id).await?;
                let tz = company.reference_timezone().unwrap_or(self.default_timezone);

                let quota = uow
                    .find_quota_by_name(company.id, quota_name)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::QuotaConfiguration(format!(
                            "time entry type '{}' refers to unknown quota '{}'",
                            entry_type.name, quota_name
                        ))
                    })?;

                Some(quota::consume(&mut uow, user.id, &quota, tz, now).await?)
            }
        };

        if let Some(consumption) = consumption.as_ref().filter(|c| c.exceeded) {
            warn!(
                quota_id = %consumption.quota_id,
                count = consumption.count,
                limit = consumption.limit,
                policy = self.policy.as_str(),
                "Quota exceeded"
            );

            if self.policy == ExceedancePolicy::Deny {
                uow.rollback().await?;
                return Err(ServiceError::QuotaExceeded {
                    quota: consumption.quota_name.clone(),
                    count: consumption.count,
                    limit: consumption.limit,
                });
            }
        }

        uow.commit().await?;

        info!(
            time_entry_id = %entry.id,
            quota_count = consumption.as_ref().map(|c| c.count),
            "Time entry recorded"
        );

        Ok(RecordedTimeEntry { entry, consumption })
    }
}
