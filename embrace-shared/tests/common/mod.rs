//! Shared fixtures for integration tests

#![allow(dead_code)]

use embrace_shared::auth::{Argon2Params, CredentialService};
use embrace_shared::db::{Gateway, QuotaStore, UnitOfWork};
use embrace_shared::models::quota::{CreateQuota, QuotaResetAt};
use embrace_shared::models::time_entry_type::{CreateTimeEntryType, TimeEntryType};
use embrace_shared::models::user_quota::UserQuota;
use embrace_shared::services::{AdminAccount, CreateTenantRequest, TenantAdmin, TenantCreated, TenantProvisioner};
use uuid::Uuid;

/// Argon2id with test-sized costs
pub fn credentials() -> CredentialService {
    CredentialService::new(Argon2Params {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
        output_len: 32,
    })
    .expect("valid test params")
}

pub fn tenant_request(name: &str, email: &str) -> CreateTenantRequest {
    CreateTenantRequest {
        name: name.to_string(),
        description: None,
        website: None,
        timezone: None,
        admin: AdminAccount::new(email, "longenough1"),
    }
}

pub async fn provision<G: Gateway + Clone>(gateway: &G, name: &str, email: &str) -> TenantCreated {
    TenantProvisioner::new(gateway.clone(), credentials())
        .create_tenant(tenant_request(name, email))
        .await
        .expect("provisioning should succeed")
}

/// Defines `quota_name` and a quota-relevant "Vacation" type consuming it
pub async fn vacation_type<G: Gateway + Clone>(
    gateway: &G,
    company_id: Uuid,
    quota_name: &str,
    limit: i32,
    reset_at: QuotaResetAt,
) -> TimeEntryType {
    let admin = TenantAdmin::new(gateway.clone());

    admin
        .define_quota(CreateQuota {
            company_id,
            name: quota_name.to_string(),
            count: limit,
            reset_at,
        })
        .await
        .expect("quota should be defined");

    admin
        .define_time_entry_type(CreateTimeEntryType {
            company_id,
            name: "Vacation".to_string(),
            color: "#00aa00".to_string(),
            is_quota_relevant: true,
            quota_name: Some(quota_name.to_string()),
            ..Default::default()
        })
        .await
        .expect("vacation type should be defined")
}

/// A billable type that does not count against any quota
pub async fn work_type<G: Gateway + Clone>(gateway: &G, company_id: Uuid) -> TimeEntryType {
    TenantAdmin::new(gateway.clone())
        .define_time_entry_type(CreateTimeEntryType {
            company_id,
            name: "Work".to_string(),
            color: "#0000aa".to_string(),
            is_billable: true,
            ..Default::default()
        })
        .await
        .expect("work type should be defined")
}

/// Committed quota counters of a user
pub async fn user_quotas<G: Gateway>(gateway: &G, user_id: Uuid) -> Vec<UserQuota> {
    let mut uow = gateway.begin().await.expect("begin");
    let user_quotas = uow.list_user_quotas_by_user(user_id).await.expect("list");
    uow.rollback().await.expect("rollback");
    user_quotas
}
