/// Store traits for the persistence gateway
///
/// Each trait covers one aggregate. Lookups by ID fail with
/// [`PersistenceError::NotFound`] when no live row exists; lookups by a
/// natural key (email, name, slug) return `Option` because a miss is an
/// expected outcome there.
///
/// Every method runs inside the unit of work that implements it, so writes
/// become visible to other units only after commit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::PersistenceError;
use crate::models::company::{Company, CreateCompany, UpdateCompany};
use crate::models::quota::{CreateQuota, Quota};
use crate::models::time_entry::{CreateTimeEntry, TimeEntry};
use crate::models::time_entry_type::{CreateTimeEntryType, TimeEntryType};
use crate::models::user::{CreateUser, User};
use crate::models::user_profile::{CreateUserProfile, UserProfile};
use crate::models::user_quota::UserQuota;
use crate::models::user_role::{CreateUserRole, UserRole};

pub type StoreResult<T> = Result<T, PersistenceError>;

#[async_trait]
pub trait CompanyStore: Send {
    async fn create_company(&mut self, data: CreateCompany) -> StoreResult<Company>;

    async fn company_by_id(&mut self, id: Uuid) -> StoreResult<Company>;

    /// Exact-match lookup among live companies
    async fn find_company_by_name(&mut self, name: &str) -> StoreResult<Option<Company>>;

    /// Company of a live user
    async fn company_by_user_id(&mut self, user_id: Uuid) -> StoreResult<Company>;

    async fn update_company(&mut self, id: Uuid, data: UpdateCompany) -> StoreResult<Company>;

    /// Tombstones the company
    async fn delete_company(&mut self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait RoleStore: Send {
    async fn create_role(&mut self, data: CreateUserRole) -> StoreResult<UserRole>;

    async fn role_by_id(&mut self, id: Uuid) -> StoreResult<UserRole>;

    async fn list_roles_by_company(&mut self, company_id: Uuid) -> StoreResult<Vec<UserRole>>;

    async fn count_roles_by_company(&mut self, company_id: Uuid) -> StoreResult<i64>;

    async fn delete_role(&mut self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait ProfileStore: Send {
    async fn create_profile(&mut self, data: CreateUserProfile) -> StoreResult<UserProfile>;

    async fn profile_by_id(&mut self, id: Uuid) -> StoreResult<UserProfile>;

    async fn find_profile_by_slug(&mut self, slug: &str) -> StoreResult<Option<UserProfile>>;
}

#[async_trait]
pub trait UserStore: Send {
    async fn create_user(&mut self, data: CreateUser) -> StoreResult<User>;

    async fn user_by_id(&mut self, id: Uuid) -> StoreResult<User>;

    /// Exact, case-sensitive lookup; no wildcard semantics
    async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<User>>;

    async fn list_users_by_company(&mut self, company_id: Uuid) -> StoreResult<Vec<User>>;

    async fn find_user_by_role_and_company(
        &mut self,
        role_id: Uuid,
        company_id: Uuid,
    ) -> StoreResult<Option<User>>;

    async fn count_users_by_company(&mut self, company_id: Uuid) -> StoreResult<i64>;

    async fn delete_user(&mut self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait QuotaStore: Send {
    async fn create_quota(&mut self, data: CreateQuota) -> StoreResult<Quota>;

    async fn quota_by_id(&mut self, id: Uuid) -> StoreResult<Quota>;

    async fn find_quota_by_name(
        &mut self,
        company_id: Uuid,
        name: &str,
    ) -> StoreResult<Option<Quota>>;

    async fn list_quotas_by_company(&mut self, company_id: Uuid) -> StoreResult<Vec<Quota>>;

    async fn count_quotas_by_company(&mut self, company_id: Uuid) -> StoreResult<i64>;

    /// Resolves or creates the (user, quota) counter and holds it exclusively
    /// until the unit of work ends
    ///
    /// Fails with `NotFound` when the user and quota belong to different
    /// companies.
    async fn lock_user_quota(
        &mut self,
        user_id: Uuid,
        quota_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<UserQuota>;

    async fn store_user_quota_count(
        &mut self,
        id: Uuid,
        count: i32,
        now: DateTime<Utc>,
    ) -> StoreResult<UserQuota>;

    async fn list_user_quotas_by_user(&mut self, user_id: Uuid) -> StoreResult<Vec<UserQuota>>;

    async fn count_user_quotas_by_user(&mut self, user_id: Uuid) -> StoreResult<i64>;
}

#[async_trait]
pub trait TimeEntryStore: Send {
    async fn create_time_entry_type(
        &mut self,
        data: CreateTimeEntryType,
    ) -> StoreResult<TimeEntryType>;

    async fn time_entry_type_by_id(&mut self, id: Uuid) -> StoreResult<TimeEntryType>;

    async fn list_time_entry_types_by_company(
        &mut self,
        company_id: Uuid,
    ) -> StoreResult<Vec<TimeEntryType>>;

    async fn count_time_entry_types_by_company(&mut self, company_id: Uuid) -> StoreResult<i64>;

    async fn create_time_entry(&mut self, data: CreateTimeEntry) -> StoreResult<TimeEntry>;

    async fn time_entry_by_id(&mut self, id: Uuid) -> StoreResult<TimeEntry>;
}
