/// PostgreSQL gateway
///
/// Each unit of work is one `sqlx` transaction. Dropping a [`PgUnitOfWork`]
/// without committing lets sqlx roll the transaction back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
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

/// Gateway over a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Gateway for PgGateway {
    type Unit = PgUnitOfWork;

    async fn begin(&self) -> Result<PgUnitOfWork, PersistenceError> {
        let tx = self.pool.begin().await?;
        debug!("Began database transaction");
        Ok(PgUnitOfWork { tx })
    }
}

/// Open PostgreSQL transaction
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self) -> Result<(), PersistenceError> {
        self.tx.commit().await?;
        debug!("Committed database transaction");
        Ok(())
    }

    async fn rollback(self) -> Result<(), PersistenceError> {
        self.tx.rollback().await?;
        debug!("Rolled back database transaction");
        Ok(())
    }
}

fn found<T>(row: Option<T>, entity: &'static str) -> StoreResult<T> {
    row.ok_or_else(|| PersistenceError::not_found(entity))
}

fn tombstoned(affected: bool, entity: &'static str) -> StoreResult<()> {
    if affected {
        Ok(())
    } else {
        Err(PersistenceError::not_found(entity))
    }
}

#[async_trait]
impl CompanyStore for PgUnitOfWork {
    async fn create_company(&mut self, data: CreateCompany) -> StoreResult<Company> {
        Ok(Company::create(&mut *self.tx, data).await?)
    }

    async fn company_by_id(&mut self, id: Uuid) -> StoreResult<Company> {
        found(Company::find_by_id(&mut *self.tx, id).await?, "company")
    }

    async fn find_company_by_name(&mut self, name: &str) -> StoreResult<Option<Company>> {
        Ok(Company::find_by_name(&mut *self.tx, name).await?)
    }

    async fn company_by_user_id(&mut self, user_id: Uuid) -> StoreResult<Company> {
        found(Company::find_by_user_id(&mut *self.tx, user_id).await?, "company")
    }

    async fn update_company(&mut self, id: Uuid, data: UpdateCompany) -> StoreResult<Company> {
        found(Company::update(&mut *self.tx, id, data).await?, "company")
    }

    async fn delete_company(&mut self, id: Uuid) -> StoreResult<()> {
        tombstoned(Company::soft_delete(&mut *self.tx, id).await?, "company")
    }
}

#[async_trait]
impl RoleStore for PgUnitOfWork {
    async fn create_role(&mut self, data: CreateUserRole) -> StoreResult<UserRole> {
        Ok(UserRole::create(&mut *self.tx, data).await?)
    }

    async fn role_by_id(&mut self, id: Uuid) -> StoreResult<UserRole> {
        found(UserRole::find_by_id(&mut *self.tx, id).await?, "user role")
    }

    async fn list_roles_by_company(&mut self, company_id: Uuid) -> StoreResult<Vec<UserRole>> {
        Ok(UserRole::list_by_company(&mut *self.tx, company_id).await?)
    }

    async fn count_roles_by_company(&mut self, company_id: Uuid) -> StoreResult<i64> {
        Ok(UserRole::count_by_company(&mut *self.tx, company_id).await?)
    }

    async fn delete_role(&mut self, id: Uuid) -> StoreResult<()> {
        tombstoned(UserRole::soft_delete(&mut *self.tx, id).await?, "user role")
    }
}

#[async_trait]
impl ProfileStore for PgUnitOfWork {
    async fn create_profile(&mut self, data: CreateUserProfile) -> StoreResult<UserProfile> {
        Ok(UserProfile::create(&mut *self.tx, data).await?)
    }

    async fn profile_by_id(&mut self, id: Uuid) -> StoreResult<UserProfile> {
        found(UserProfile::find_by_id(&mut *self.tx, id).await?, "user profile")
    }

    async fn find_profile_by_slug(&mut self, slug: &str) -> StoreResult<Option<UserProfile>> {
        Ok(UserProfile::find_by_slug(&mut *self.tx, slug).await?)
    }
}

#[async_trait]
impl UserStore for PgUnitOfWork {
    async fn create_user(&mut self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&mut *self.tx, data).await?)
    }

    async fn user_by_id(&mut self, id: Uuid) -> StoreResult<User> {
        found(User::find_by_id(&mut *self.tx, id).await?, "user")
    }

    async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&mut *self.tx, email).await?)
    }

    async fn list_users_by_company(&mut self, company_id: Uuid) -> StoreResult<Vec<User>> {
        Ok(User::list_by_company(&mut *self.tx, company_id).await?)
    }

    async fn find_user_by_role_and_company(
        &mut self,
        role_id: Uuid,
        company_id: Uuid,
    ) -> StoreResult<Option<User>> {
        Ok(User::find_by_role_and_company(&mut *self.tx, role_id, company_id).await?)
    }

    async fn count_users_by_company(&mut self, company_id: Uuid) -> StoreResult<i64> {
        Ok(User::count_by_company(&mut *self.tx, company_id).await?)
    }

    async fn delete_user(&mut self, id: Uuid) -> StoreResult<()> {
        tombstoned(User::soft_delete(&mut *self.tx, id).await?, "user")
    }
}

#[async_trait]
impl QuotaStore for PgUnitOfWork {
    async fn create_quota(&mut self, data: CreateQuota) -> StoreResult<Quota> {
        Ok(Quota::create(&mut *self.tx, data).await?)
    }

    async fn quota_by_id(&mut self, id: Uuid) -> StoreResult<Quota> {
        found(Quota::find_by_id(&mut *self.tx, id).await?, "quota")
    }

    async fn find_quota_by_name(
        &mut self,
        company_id: Uuid,
        name: &str,
    ) -> StoreResult<Option<Quota>> {
        Ok(Quota::find_by_company_and_name(&mut *self.tx, company_id, name).await?)
    }

    async fn list_quotas_by_company(&mut self, company_id: Uuid) -> StoreResult<Vec<Quota>> {
        Ok(Quota::list_by_company(&mut *self.tx, company_id).await?)
    }

    async fn count_quotas_by_company(&mut self, company_id: Uuid) -> StoreResult<i64> {
        Ok(Quota::count_by_company(&mut *self.tx, company_id).await?)
    }

    async fn lock_user_quota(
        &mut self,
        user_id: Uuid,
        quota_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<UserQuota> {
        found(
            UserQuota::lock(&mut *self.tx, user_id, quota_id, now).await?,
            "user quota",
        )
    }

    async fn store_user_quota_count(
        &mut self,
        id: Uuid,
        count: i32,
        now: DateTime<Utc>,
    ) -> StoreResult<UserQuota> {
        Ok(UserQuota::store_count(&mut *self.tx, id, count, now).await?)
    }

    async fn list_user_quotas_by_user(&mut self, user_id: Uuid) -> StoreResult<Vec<UserQuota>> {
        Ok(UserQuota::list_by_user(&mut *self.tx, user_id).await?)
    }

    async fn count_user_quotas_by_user(&mut self, user_id: Uuid) -> StoreResult<i64> {
        Ok(UserQuota::count_by_user(&mut *self.tx, user_id).await?)
    }
}

#[async_trait]
impl TimeEntryStore for PgUnitOfWork {
    async fn create_time_entry_type(
        &mut self,
        data: CreateTimeEntryType,
    ) -> StoreResult<TimeEntryType> {
        Ok(TimeEntryType::create(&mut *self.tx, data).await?)
    }

    async fn time_entry_type_by_id(&mut self, id: Uuid) -> StoreResult<TimeEntryType> {
        found(TimeEntryType::find_by_id(&mut *self.tx, id).await?, "time entry type")
    }

    async fn list_time_entry_types_by_company(
        &mut self,
        company_id: Uuid,
    ) -> StoreResult<Vec<TimeEntryType>> {
        Ok(TimeEntryType::list_by_company(&mut *self.tx, company_id).await?)
    }

    async fn count_time_entry_types_by_company(&mut self, company_id: Uuid) -> StoreResult<i64> {
        Ok(TimeEntryType::count_by_company(&mut *self.tx, company_id).await?)
    }

    async fn create_time_entry(&mut self, data: CreateTimeEntry) -> StoreResult<TimeEntry> {
        Ok(TimeEntry::create(&mut *self.tx, data).await?)
    }

    async fn time_entry_by_id(&mut self, id: Uuid) -> StoreResult<TimeEntry> {
        found(TimeEntry::find_by_id(&mut *self.tx, id).await?, "time entry")
    }
}
