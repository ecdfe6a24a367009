/// Tenant lifecycle and catalog administration
///
/// Everything a company administrator configures after provisioning: quotas,
/// time entry types, and the removal of users, roles and the company itself.
///
/// Removal follows two lifecycle rules:
/// - internal roles (such as `admin`) cannot be deleted, and neither can a
///   role still assigned to a live user
/// - a company cannot be deleted while any live user belongs to it

use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{CompanyStore, Gateway, QuotaStore, RoleStore, TimeEntryStore, UnitOfWork, UserStore};
use crate::error::{FieldError, ServiceError};
use crate::models::quota::{CreateQuota, Quota};
use crate::models::time_entry_type::{CreateTimeEntryType, TimeEntryType};
use crate::models::user_role::{CreateUserRole, UserRole};

#[derive(Debug, Clone)]
pub struct TenantAdmin<G> {
    gateway: G,
}

impl<G: Gateway> TenantAdmin<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Defines a quota for a company
    ///
    /// # Errors
    ///
    /// `Validation` for an empty name or negative ceiling, `Conflict` when the
    /// company already has a live quota with that name.
    pub async fn define_quota(&self, data: CreateQuota) -> Result<Quota, ServiceError> {
        let mut errors = Vec::new();
        if data.name.trim().is_empty() {
            errors.push(FieldError::new("name", "required"));
        }
        if data.count < 0 {
            errors.push(FieldError::new("count", "range").with_message("count must not be negative"));
        }
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }

        let mut uow = self.gateway.begin().await?;
        uow.company_by_id(data.company_id).await?;
        let quota = uow.create_quota(data).await?;
        uow.commit().await?;

        info!(
            quota_id = %quota.id,
            company_id = %quota.company_id,
            limit = quota.count,
            reset_at = %quota.reset_at,
            "Quota defined"
        );
        Ok(quota)
    }

    /// Defines a time entry type for a company
    ///
    /// A quota-relevant type must name a quota. The quota itself is resolved
    /// only when entries are recorded.
    pub async fn define_time_entry_type(
        &self,
        data: CreateTimeEntryType,
    ) -> Result<TimeEntryType, ServiceError> {
        let mut errors = Vec::new();
        if data.name.trim().is_empty() {
            errors.push(FieldError::new("name", "required"));
        }
        if data.is_quota_relevant
            && data.quota_name.as_deref().map_or(true, |name| name.trim().is_empty())
        {
            errors.push(
                FieldError::new("quota_name", "required")
                    .with_message("quota-relevant types must name a quota"),
            );
        }
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }

        let mut uow = self.gateway.begin().await?;
        uow.company_by_id(data.company_id).await?;
        let entry_type = uow.create_time_entry_type(data).await?;
        uow.commit().await?;

        info!(
            time_entry_type_id = %entry_type.id,
            company_id = %entry_type.company_id,
            is_billable = entry_type.is_billable,
            is_quota_relevant = entry_type.is_quota_relevant,
            "Time entry type defined"
        );
        Ok(entry_type)
    }

    /// Adds a user-managed role to a company
    pub async fn define_role(&self, company_id: Uuid, name: &str) -> Result<UserRole, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::invalid("name", "required"));
        }

        let mut uow = self.gateway.begin().await?;
        uow.company_by_id(company_id).await?;
        let role = uow
            .create_role(CreateUserRole {
                company_id,
                name: name.to_string(),
                internal_usage: false,
            })
            .await?;
        uow.commit().await?;

        Ok(role)
    }

    /// Deletes a user-managed role
    ///
    /// # Errors
    ///
    /// `Conflict` for internal roles and for roles still held by a live user.
    pub async fn delete_role(&self, role_id: Uuid) -> Result<(), ServiceError> {
        let mut uow = self.gateway.begin().await?;

        let role = uow.role_by_id(role_id).await?;
        if !role.is_user_deletable() {
            warn!(role_id = %role.id, role_name = %role.name, "Refused to delete internal role");
            return Err(ServiceError::Conflict(format!(
                "role '{}' is managed by the system and cannot be deleted",
                role.name
            )));
        }

        if uow
            .find_user_by_role_and_company(role.id, role.company_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(format!(
                "role '{}' is still assigned to users",
                role.name
            )));
        }

        uow.delete_role(role.id).await?;
        uow.commit().await?;

        info!(role_id = %role.id, company_id = %role.company_id, "Role deleted");
        Ok(())
    }

    /// Tombstones a user
    pub async fn remove_user(&self, user_id: Uuid) -> Result<(), ServiceError> {
        let mut uow = self.gateway.begin().await?;
        uow.delete_user(user_id).await?;
        uow.commit().await?;

        info!(user_id = %user_id, "User removed");
        Ok(())
    }

    /// Tombstones a company with no remaining live users
    ///
    /// # Errors
    ///
    /// `Conflict` while any live user belongs to the company; nothing cascades.
    pub async fn decommission_company(&self, company_id: Uuid) -> Result<(), ServiceError> {
        let mut uow = self.gateway.begin().await?;

        let company = uow.company_by_id(company_id).await?;
        let active_users = uow.count_users_by_company(company.id).await?;
        if active_users > 0 {
            warn!(
                company_id = %company.id,
                active_users,
                "Refused to delete company with active users"
            );
            return Err(ServiceError::Conflict(format!(
                "company '{}' still has {} active user(s)",
                company.name, active_users
            )));
        }

        uow.delete_company(company.id).await?;
        uow.commit().await?;

        info!(company_id = %company.id, "Company decommissioned");
        Ok(())
    }
}
