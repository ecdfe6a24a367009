/// In-memory gateway
///
/// Backs tests and local runs without PostgreSQL. The whole dataset sits
/// behind one async mutex: [`MemoryGateway::begin`] takes the lock and works
/// on a private copy, [`UnitOfWork::commit`] writes the copy back. Units of
/// work are therefore fully serialized, and a dropped unit leaves no trace.
///
/// Uniqueness, foreign-key and check constraints mirror the SQL schema and
/// report the same constraint names, so services see identical errors on
/// either backend.
///
/// Failures can be injected per operation with [`MemoryGateway::fail_on`].
///
/// Do not hold a unit of work while calling another gateway method on the
/// same task; the second call waits for the first unit to finish.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

use super::error::PersistenceError;
use super::repository::{
    CompanyStore, ProfileStore, QuotaStore, RoleStore, StoreResult, TimeEntryStore, UserStore,
};
use super::unit_of_work::{Gateway, UnitOfWork};
use crate::models::company::{Company, CreateCompany, UpdateCompany};
use crate::models::quota::{CreateQuota, Quota};
use crate::models::time_entry::{CreateTimeEntry, TimeEntry};
use crate::models::time_entry_type::{CreateTimeEntryType, TimeEntryType};
use crate::models::user::{CreateUser, User};
use crate::models::user_profile::{CreateUserProfile, UserProfile};
use crate::models::user_quota::UserQuota;
use crate::models::user_role::{CreateUserRole, UserRole};

/// Operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateCompany,
    CreateRole,
    CreateProfile,
    CreateUser,
    CreateQuota,
    LockUserQuota,
    StoreUserQuota,
    CreateTimeEntryType,
    CreateTimeEntry,
    Commit,
}

/// Number of stored rows per table, tombstoned rows included
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub companies: usize,
    pub roles: usize,
    pub profiles: usize,
    pub users: usize,
    pub quotas: usize,
    pub user_quotas: usize,
    pub time_entry_types: usize,
    pub time_entries: usize,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    companies: HashMap<Uuid, Company>,
    roles: HashMap<Uuid, UserRole>,
    profiles: HashMap<Uuid, UserProfile>,
    users: HashMap<Uuid, User>,
    quotas: HashMap<Uuid, Quota>,
    user_quotas: HashMap<Uuid, UserQuota>,
    time_entry_types: HashMap<Uuid, TimeEntryType>,
    time_entries: HashMap<Uuid, TimeEntry>,
}

#[derive(Debug, Default)]
struct Shared {
    state: MemoryState,
    faults: HashSet<Operation>,
}

/// Gateway over process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call of `operation` fail with a storage error
    pub async fn fail_on(&self, operation: Operation) {
        self.shared.lock().await.faults.insert(operation);
    }

    /// Removes all injected failures
    pub async fn clear_faults(&self) {
        self.shared.lock().await.faults.clear();
    }

    /// Committed row counts
    pub async fn row_counts(&self) -> RowCounts {
        let shared = self.shared.lock().await;
        let state = &shared.state;

        RowCounts {
            companies: state.companies.len(),
            roles: state.roles.len(),
            profiles: state.profiles.len(),
            users: state.users.len(),
            quotas: state.quotas.len(),
            user_quotas: state.user_quotas.len(),
            time_entry_types: state.time_entry_types.len(),
            time_entries: state.time_entries.len(),
        }
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    type Unit = MemoryUnitOfWork;

    async fn begin(&self) -> Result<MemoryUnitOfWork, PersistenceError> {
        let guard = self.shared.clone().lock_owned().await;
        let working = guard.state.clone();

        Ok(MemoryUnitOfWork { guard, working })
    }
}

/// Open in-memory unit of work
pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Shared>,
    working: MemoryState,
}

impl MemoryUnitOfWork {
    fn check(&self, operation: Operation) -> StoreResult<()> {
        if self.guard.faults.contains(&operation) {
            debug!(?operation, "Injected storage failure");
            return Err(PersistenceError::Storage(format!(
                "injected failure: {:?}",
                operation
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self) -> Result<(), PersistenceError> {
        self.check(Operation::Commit)?;

        let MemoryUnitOfWork { mut guard, working } = self;
        guard.state = working;
        Ok(())
    }

    async fn rollback(self) -> Result<(), PersistenceError> {
        Ok(())
    }
}

fn unique_violation(constraint: &str) -> PersistenceError {
    PersistenceError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

fn foreign_key_violation(constraint: &str) -> PersistenceError {
    PersistenceError::ForeignKeyViolation {
        constraint: constraint.to_string(),
    }
}

fn check_violation(constraint: &str) -> PersistenceError {
    PersistenceError::Storage(format!("check constraint violated: {}", constraint))
}

fn live<T: Clone>(
    rows: &HashMap<Uuid, T>,
    id: Uuid,
    deleted_at: impl Fn(&T) -> Option<DateTime<Utc>>,
    entity: &'static str,
) -> StoreResult<T> {
    rows.get(&id)
        .filter(|row| deleted_at(row).is_none())
        .cloned()
        .ok_or_else(|| PersistenceError::not_found(entity))
}

fn sorted_by<T, K: Ord>(mut rows: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    rows.sort_by_key(|row| key(row));
    rows
}

#[async_trait]
impl CompanyStore for MemoryUnitOfWork {
    async fn create_company(&mut self, data: CreateCompany) -> StoreResult<Company> {
        self.check(Operation::CreateCompany)?;

        let companies = self.working.companies.values().filter(|c| c.deleted_at.is_none());
        for company in companies {
            if company.name == data.name {
                return Err(unique_violation("companies_name_key"));
            }
            if company.primary_email == data.primary_email {
                return Err(unique_violation("companies_primary_email_key"));
            }
        }

        let now = Utc::now();
        let company = Company {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            website: data.website,
            primary_email: data.primary_email,
            timezone: data.timezone,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.working.companies.insert(company.id, company.clone());
        Ok(company)
    }

    async fn company_by_id(&mut self, id: Uuid) -> StoreResult<Company> {
        live(&self.working.companies, id, |c| c.deleted_at, "company")
    }

    async fn find_company_by_name(&mut self, name: &str) -> StoreResult<Option<Company>> {
        Ok(self
            .working
            .companies
            .values()
            .find(|c| c.deleted_at.is_none() && c.name == name)
            .cloned())
    }

    async fn company_by_user_id(&mut self, user_id: Uuid) -> StoreResult<Company> {
        let user = live(&self.working.users, user_id, |u| u.deleted_at, "company")?;
        live(&self.working.companies, user.company_id, |c| c.deleted_at, "company")
    }

    async fn update_company(&mut self, id: Uuid, data: UpdateCompany) -> StoreResult<Company> {
        let current = live(&self.working.companies, id, |c| c.deleted_at, "company")?;

        let others = self
            .working
            .companies
            .values()
            .filter(|c| c.deleted_at.is_none() && c.id != id);
        for other in others {
            if data.name.as_deref() == Some(other.name.as_str()) {
                return Err(unique_violation("companies_name_key"));
            }
            if data.primary_email.as_deref() == Some(other.primary_email.as_str()) {
                return Err(unique_violation("companies_primary_email_key"));
            }
        }

        let company = Company {
            name: data.name.unwrap_or(current.name),
            description: data.description.unwrap_or(current.description),
            website: data.website.unwrap_or(current.website),
            primary_email: data.primary_email.unwrap_or(current.primary_email),
            timezone: data.timezone.unwrap_or(current.timezone),
            updated_at: Utc::now(),
            ..current
        };

        self.working.companies.insert(id, company.clone());
        Ok(company)
    }

    async fn delete_company(&mut self, id: Uuid) -> StoreResult<()> {
        match self.working.companies.get_mut(&id) {
            Some(company) if company.deleted_at.is_none() => {
                let now = Utc::now();
                company.deleted_at = Some(now);
                company.updated_at = now;
                Ok(())
            }
            _ => Err(PersistenceError::not_found("company")),
        }
    }
}

#[async_trait]
impl RoleStore for MemoryUnitOfWork {
    async fn create_role(&mut self, data: CreateUserRole) -> StoreResult<UserRole> {
        self.check(Operation::CreateRole)?;

        if !self.working.companies.contains_key(&data.company_id) {
            return Err(foreign_key_violation("user_roles_company_id_fkey"));
        }

        let taken = self.working.roles.values().any(|r| {
            r.deleted_at.is_none() && r.company_id == data.company_id && r.name == data.name
        });
        if taken {
            return Err(unique_violation("user_roles_company_name_key"));
        }

        let now = Utc::now();
        let role = UserRole {
            id: Uuid::new_v4(),
            company_id: data.company_id,
            name: data.name,
            internal_usage: data.internal_usage,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.working.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn role_by_id(&mut self, id: Uuid) -> StoreResult<UserRole> {
        live(&self.working.roles, id, |r| r.deleted_at, "user role")
    }

    async fn list_roles_by_company(&mut self, company_id: Uuid) -> StoreResult<Vec<UserRole>> {
        let roles = self
            .working
            .roles
            .values()
            .filter(|r| r.deleted_at.is_none() && r.company_id == company_id)
            .cloned()
            .collect();

        Ok(sorted_by(roles, |r: &UserRole| r.name.clone()))
    }

    async fn count_roles_by_company(&mut self, company_id: Uuid) -> StoreResult<i64> {
        Ok(self.list_roles_by_company(company_id).await?.len() as i64)
    }

    async fn delete_role(&mut self, id: Uuid) -> StoreResult<()> {
        match self.working.roles.get_mut(&id) {
            Some(role) if role.deleted_at.is_none() => {
                let now = Utc::now();
                role.deleted_at = Some(now);
                role.updated_at = now;
                Ok(())
            }
            _ => Err(PersistenceError::not_found("user role")),
        }
    }
}

#[async_trait]
impl ProfileStore for MemoryUnitOfWork {
    async fn create_profile(&mut self, data: CreateUserProfile) -> StoreResult<UserProfile> {
        self.check(Operation::CreateProfile)?;

        let taken = self
            .working
            .profiles
            .values()
            .any(|p| p.deleted_at.is_none() && p.slug == data.slug);
        if taken {
            return Err(unique_violation("user_profiles_slug_key"));
        }

        let now = Utc::now();
        let profile = UserProfile {
            id: Uuid::new_v4(),
            slug: data.slug,
            first_name: data.first_name,
            last_name: data.last_name,
            title: data.title,
            position: data.position,
            location: data.location,
            phone: data.phone,
            avatar: data.avatar,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.working.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn profile_by_id(&mut self, id: Uuid) -> StoreResult<UserProfile> {
        live(&self.working.profiles, id, |p| p.deleted_at, "user profile")
    }

    async fn find_profile_by_slug(&mut self, slug: &str) -> StoreResult<Option<UserProfile>> {
        Ok(self
            .working
            .profiles
            .values()
            .find(|p| p.deleted_at.is_none() && p.slug == slug)
            .cloned())
    }
}

#[async_trait]
impl UserStore for MemoryUnitOfWork {
    async fn create_user(&mut self, data: CreateUser) -> StoreResult<User> {
        self.check(Operation::CreateUser)?;

        if !self.working.companies.contains_key(&data.company_id) {
            return Err(foreign_key_violation("users_company_id_fkey"));
        }
        if !self.working.roles.contains_key(&data.role_id) {
            return Err(foreign_key_violation("users_role_id_fkey"));
        }
        if !self.working.profiles.contains_key(&data.profile_id) {
            return Err(foreign_key_violation("users_profile_id_fkey"));
        }

        for user in self.working.users.values() {
            if user.deleted_at.is_none() && user.email == data.email {
                return Err(unique_violation("users_email_key"));
            }
            if user.profile_id == data.profile_id {
                return Err(unique_violation("users_profile_id_key"));
            }
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            password_hash: data.password_hash,
            company_id: data.company_id,
            role_id: data.role_id,
            profile_id: data.profile_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.working.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_id(&mut self, id: Uuid) -> StoreResult<User> {
        live(&self.working.users, id, |u| u.deleted_at, "user")
    }

    async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .working
            .users
            .values()
            .find(|u| u.deleted_at.is_none() && u.email == email)
            .cloned())
    }

    async fn list_users_by_company(&mut self, company_id: Uuid) -> StoreResult<Vec<User>> {
        let users = self
            .working
            .users
            .values()
            .filter(|u| u.deleted_at.is_none() && u.company_id == company_id)
            .cloned()
            .collect();

        Ok(sorted_by(users, |u: &User| u.created_at))
    }

    async fn find_user_by_role_and_company(
        &mut self,
        role_id: Uuid,
        company_id: Uuid,
    ) -> StoreResult<Option<User>> {
        Ok(self
            .list_users_by_company(company_id)
            .await?
            .into_iter()
            .find(|u| u.role_id == role_id))
    }

    async fn count_users_by_company(&mut self, company_id: Uuid) -> StoreResult<i64> {
        Ok(self.list_users_by_company(company_id).await?.len() as i64)
    }

    async fn delete_user(&mut self, id: Uuid) -> StoreResult<()> {
        match self.working.users.get_mut(&id) {
            Some(user) if user.deleted_at.is_none() => {
                let now = Utc::now();
                user.deleted_at = Some(now);
                user.updated_at = now;
                Ok(())
            }
            _ => Err(PersistenceError::not_found("user")),
        }
    }
}

#[async_trait]
impl QuotaStore for MemoryUnitOfWork {
    async fn create_quota(&mut self, data: CreateQuota) -> StoreResult<Quota> {
        self.check(Operation::CreateQuota)?;

        if data.count < 0 {
            return Err(check_violation("quotas_count_check"));
        }
        if !self.working.companies.contains_key(&data.company_id) {
            return Err(foreign_key_violation("quotas_company_id_fkey"));
        }

        let taken = self.working.quotas.values().any(|q| {
            q.deleted_at.is_none() && q.company_id == data.company_id && q.name == data.name
        });
        if taken {
            return Err(unique_violation("quotas_company_name_key"));
        }

        let now = Utc::now();
        let quota = Quota {
            id: Uuid::new_v4(),
            company_id: data.company_id,
            name: data.name,
            count: data.count,
            reset_at: data.reset_at.as_str().to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.working.quotas.insert(quota.id, quota.clone());
        Ok(quota)
    }

    async fn quota_by_id(&mut self, id: Uuid) -> StoreResult<Quota> {
        live(&self.working.quotas, id, |q| q.deleted_at, "quota")
    }

    async fn find_quota_by_name(
        &mut self,
        company_id: Uuid,
        name: &str,
    ) -> StoreResult<Option<Quota>> {
        Ok(self
            .working
            .quotas
            .values()
            .find(|q| q.deleted_at.is_none() && q.company_id == company_id && q.name == name)
            .cloned())
    }

    async fn list_quotas_by_company(&mut self, company_id: Uuid) -> StoreResult<Vec<Quota>> {
        let quotas = self
            .working
            .quotas
            .values()
            .filter(|q| q.deleted_at.is_none() && q.company_id == company_id)
            .cloned()
            .collect();

        Ok(sorted_by(quotas, |q: &Quota| q.name.clone()))
    }

    async fn count_quotas_by_company(&mut self, company_id: Uuid) -> StoreResult<i64> {
        Ok(self.list_quotas_by_company(company_id).await?.len() as i64)
    }

    async fn lock_user_quota(
        &mut self,
        user_id: Uuid,
        quota_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<UserQuota> {
        self.check(Operation::LockUserQuota)?;

        let existing = self
            .working
            .user_quotas
            .values()
            .find(|uq| uq.user_id == user_id && uq.quota_id == quota_id)
            .cloned();
        if let Some(user_quota) = existing {
            return Ok(user_quota);
        }

        let user_company = match self.working.users.get(&user_id) {
            Some(user) => user.company_id,
            None => return Err(foreign_key_violation("user_quotas_user_id_fkey")),
        };
        let quota_company = match self.working.quotas.get(&quota_id) {
            Some(quota) => quota.company_id,
            None => return Err(foreign_key_violation("user_quotas_quota_id_fkey")),
        };
        if user_company != quota_company {
            return Err(PersistenceError::not_found("user quota"));
        }

        let user_quota = UserQuota {
            id: Uuid::new_v4(),
            user_id,
            quota_id,
            count: 0,
            created_at: now,
            updated_at: now,
        };

        self.working.user_quotas.insert(user_quota.id, user_quota.clone());
        Ok(user_quota)
    }

    async fn store_user_quota_count(
        &mut self,
        id: Uuid,
        count: i32,
        now: DateTime<Utc>,
    ) -> StoreResult<UserQuota> {
        self.check(Operation::StoreUserQuota)?;

        let user_quota = self
            .working
            .user_quotas
            .get_mut(&id)
            .ok_or_else(|| PersistenceError::not_found("user quota"))?;

        user_quota.count = count;
        user_quota.updated_at = now;
        Ok(user_quota.clone())
    }

    async fn list_user_quotas_by_user(&mut self, user_id: Uuid) -> StoreResult<Vec<UserQuota>> {
        let user_quotas = self
            .working
            .user_quotas
            .values()
            .filter(|uq| uq.user_id == user_id)
            .cloned()
            .collect();

        Ok(sorted_by(user_quotas, |uq: &UserQuota| uq.created_at))
    }

    async fn count_user_quotas_by_user(&mut self, user_id: Uuid) -> StoreResult<i64> {
        Ok(self.list_user_quotas_by_user(user_id).await?.len() as i64)
    }
}

#[async_trait]
impl TimeEntryStore for MemoryUnitOfWork {
    async fn create_time_entry_type(
        &mut self,
        data: CreateTimeEntryType,
    ) -> StoreResult<TimeEntryType> {
        self.check(Operation::CreateTimeEntryType)?;

        if data.is_quota_relevant && data.quota_name.is_none() {
            return Err(check_violation("time_entry_types_quota_name_check"));
        }
        if !self.working.companies.contains_key(&data.company_id) {
            return Err(foreign_key_violation("time_entry_types_company_id_fkey"));
        }

        let taken = self.working.time_entry_types.values().any(|t| {
            t.deleted_at.is_none() && t.company_id == data.company_id && t.name == data.name
        });
        if taken {
            return Err(unique_violation("time_entry_types_company_name_key"));
        }

        let now = Utc::now();
        let entry_type = TimeEntryType {
            id: Uuid::new_v4(),
            company_id: data.company_id,
            name: data.name,
            color: data.color,
            icon: data.icon,
            description: data.description,
            is_billable: data.is_billable,
            is_quota_relevant: data.is_quota_relevant,
            quota_name: data.quota_name,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.working
            .time_entry_types
            .insert(entry_type.id, entry_type.clone());
        Ok(entry_type)
    }

    async fn time_entry_type_by_id(&mut self, id: Uuid) -> StoreResult<TimeEntryType> {
        live(&self.working.time_entry_types, id, |t| t.deleted_at, "time entry type")
    }

    async fn list_time_entry_types_by_company(
        &mut self,
        company_id: Uuid,
    ) -> StoreResult<Vec<TimeEntryType>> {
        let entry_types = self
            .working
            .time_entry_types
            .values()
            .filter(|t| t.deleted_at.is_none() && t.company_id == company_id)
            .cloned()
            .collect();

        Ok(sorted_by(entry_types, |t: &TimeEntryType| t.name.clone()))
    }

    async fn count_time_entry_types_by_company(&mut self, company_id: Uuid) -> StoreResult<i64> {
        Ok(self.list_time_entry_types_by_company(company_id).await?.len() as i64)
    }

    async fn create_time_entry(&mut self, data: CreateTimeEntry) -> StoreResult<TimeEntry> {
        self.check(Operation::CreateTimeEntry)?;

        if !self.working.users.contains_key(&data.user_id) {
            return Err(foreign_key_violation("time_entries_user_id_fkey"));
        }
        if !self.working.time_entry_types.contains_key(&data.time_entry_type_id) {
            return Err(foreign_key_violation("time_entries_time_entry_type_id_fkey"));
        }
        if data.end_time.is_some_and(|end| end < data.start_time) {
            return Err(check_violation("time_entries_end_after_start"));
        }

        let now = Utc::now();
        let entry = TimeEntry {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            time_entry_type_id: data.time_entry_type_id,
            start_time: data.start_time,
            end_time: data.end_time,
            duration: data.duration,
            note: data.note,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.working.time_entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn time_entry_by_id(&mut self, id: Uuid) -> StoreResult<TimeEntry> {
        live(&self.working.time_entries, id, |e| e.deleted_at, "time entry")
    }
}
