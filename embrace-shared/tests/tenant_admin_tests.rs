/// Integration tests for tenant administration and lifecycle rules

mod common;

use common::provision;
use embrace_shared::db::{Gateway, MemoryGateway, RoleStore, UnitOfWork, UserStore};
use embrace_shared::models::quota::{CreateQuota, QuotaResetAt};
use embrace_shared::models::time_entry_type::CreateTimeEntryType;
use embrace_shared::services::TenantAdmin;
use embrace_shared::ServiceError;
use uuid::Uuid;

fn quota(company_id: Uuid, name: &str, count: i32) -> CreateQuota {
    CreateQuota {
        company_id,
        name: name.to_string(),
        count,
        reset_at: QuotaResetAt::FirstOfYear,
    }
}

#[tokio::test]
async fn test_admin_role_cannot_be_deleted() {
    let gateway = MemoryGateway::new();
    let tenant = provision(&gateway, "Acme", "a@acme.com").await;

    let mut uow = gateway.begin().await.unwrap();
    let role_id = uow.user_by_id(tenant.user_id).await.unwrap().role_id;
    uow.rollback().await.unwrap();

    let err = TenantAdmin::new(gateway.clone())
        .delete_role(role_id)
        .await
        .unwrap_err();

    assert_eq!(err.code(), "conflict");
    assert_eq!(gateway.row_counts().await.roles, 1);

    let mut uow = gateway.begin().await.unwrap();
    assert!(uow.role_by_id(role_id).await.is_ok());
    uow.rollback().await.unwrap();
}

#[tokio::test]
async fn test_custom_role_lifecycle() {
    let gateway = MemoryGateway::new();
    let tenant = provision(&gateway, "Acme", "a@acme.com").await;
    let admin = TenantAdmin::new(gateway.clone());

    let role = admin.define_role(tenant.company_id, "reviewer").await.unwrap();
    assert!(!role.internal_usage);
    assert_eq!(role.company_id, tenant.company_id);

    admin.delete_role(role.id).await.unwrap();

    let mut uow = gateway.begin().await.unwrap();
    let lookup = uow.role_by_id(role.id).await;
    let remaining = uow.count_roles_by_company(tenant.company_id).await.unwrap();
    uow.rollback().await.unwrap();

    assert!(lookup.is_err());
    assert_eq!(remaining, 1);

    let err = admin.delete_role(role.id).await.unwrap_err();
    assert_eq!(err.code(), "not_found");
}

#[tokio::test]
async fn test_role_with_empty_name_is_rejected() {
    let gateway = MemoryGateway::new();
    let tenant = provision(&gateway, "Acme", "a@acme.com").await;

    let err = TenantAdmin::new(gateway.clone())
        .define_role(tenant.company_id, "  ")
        .await
        .unwrap_err();

    assert_eq!(err.code(), "validation_error");
    assert_eq!(gateway.row_counts().await.roles, 1);
}

#[tokio::test]
async fn test_company_with_users_cannot_be_decommissioned() {
    let gateway = MemoryGateway::new();
    let tenant = provision(&gateway, "Acme", "a@acme.com").await;
    let admin = TenantAdmin::new(gateway.clone());

    let err = admin.decommission_company(tenant.company_id).await.unwrap_err();
    assert_eq!(err.code(), "conflict");

    admin.remove_user(tenant.user_id).await.unwrap();
    admin.decommission_company(tenant.company_id).await.unwrap();

    let err = admin.decommission_company(tenant.company_id).await.unwrap_err();
    assert_eq!(err.code(), "not_found");
}

#[tokio::test]
async fn test_removed_user_frees_email() {
    let gateway = MemoryGateway::new();
    let tenant = provision(&gateway, "Acme", "a@acme.com").await;
    TenantAdmin::new(gateway.clone())
        .remove_user(tenant.user_id)
        .await
        .unwrap();

    let mut uow = gateway.begin().await.unwrap();
    let lookup = uow.find_user_by_email("a@acme.com").await.unwrap();
    let user = uow.user_by_id(tenant.user_id).await;
    uow.rollback().await.unwrap();

    assert!(lookup.is_none());
    assert!(user.is_err());
}

#[tokio::test]
async fn test_duplicate_quota_name_conflicts() {
    let gateway = MemoryGateway::new();
    let tenant = provision(&gateway, "Acme", "a@acme.com").await;
    let admin = TenantAdmin::new(gateway.clone());

    admin.define_quota(quota(tenant.company_id, "pto", 25)).await.unwrap();
    let err = admin
        .define_quota(quota(tenant.company_id, "pto", 30))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "conflict");
    assert_eq!(gateway.row_counts().await.quotas, 1);
}

#[tokio::test]
async fn test_quota_names_are_scoped_per_company() {
    let gateway = MemoryGateway::new();
    let acme = provision(&gateway, "Acme", "a@acme.com").await;
    let globex = provision(&gateway, "Globex", "g@globex.com").await;
    let admin = TenantAdmin::new(gateway.clone());

    admin.define_quota(quota(acme.company_id, "pto", 25)).await.unwrap();
    admin.define_quota(quota(globex.company_id, "pto", 30)).await.unwrap();

    assert_eq!(gateway.row_counts().await.quotas, 2);
}

#[tokio::test]
async fn test_invalid_quota_is_rejected() {
    let gateway = MemoryGateway::new();
    let tenant = provision(&gateway, "Acme", "a@acme.com").await;

    let err = TenantAdmin::new(gateway.clone())
        .define_quota(quota(tenant.company_id, "", -1))
        .await
        .unwrap_err();

    match err {
        ServiceError::Validation(fields) => {
            let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
            assert_eq!(names, vec!["name", "count"]);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_quota_for_unknown_company_is_not_found() {
    let gateway = MemoryGateway::new();

    let err = TenantAdmin::new(gateway.clone())
        .define_quota(quota(Uuid::new_v4(), "pto", 25))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound { entity: "company" }));
    assert_eq!(gateway.row_counts().await.quotas, 0);
}

#[tokio::test]
async fn test_quota_relevant_type_requires_quota_name() {
    let gateway = MemoryGateway::new();
    let tenant = provision(&gateway, "Acme", "a@acme.com").await;

    let err = TenantAdmin::new(gateway.clone())
        .define_time_entry_type(CreateTimeEntryType {
            company_id: tenant.company_id,
            name: "Vacation".to_string(),
            color: "#00aa00".to_string(),
            is_quota_relevant: true,
            ..Default::default()
        })
        .await
        .unwrap_err();

    match err {
        ServiceError::Validation(fields) => {
            assert_eq!(fields.len(), 1);
            assert_eq!(fields[0].field, "quota_name");
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(gateway.row_counts().await.time_entry_types, 0);
}
