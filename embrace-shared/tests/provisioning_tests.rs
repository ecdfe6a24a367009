/// Integration tests for tenant provisioning against the in-memory gateway

mod common;

use common::{credentials, provision, tenant_request};
use embrace_shared::db::{
    CompanyStore, Gateway, MemoryGateway, Operation, ProfileStore, RoleStore, RowCounts,
    UnitOfWork, UserStore,
};
use embrace_shared::error::IdentityField;
use embrace_shared::services::{TenantAdmin, TenantProvisioner};
use embrace_shared::ServiceError;
use std::sync::Arc;

#[tokio::test]
async fn test_acme_scenario() {
    let gateway = MemoryGateway::new();
    let provisioner = TenantProvisioner::new(gateway.clone(), credentials());

    let created = provisioner
        .create_tenant(tenant_request("Acme", "a@acme.com"))
        .await
        .expect("first provisioning should succeed");

    assert_eq!(created.company_name, "Acme");
    assert_eq!(created.user_email, "a@acme.com");
    assert_eq!(created.role_name, "admin");

    let counts = gateway.row_counts().await;
    assert_eq!(counts.companies, 1);
    assert_eq!(counts.roles, 1);
    assert_eq!(counts.profiles, 1);
    assert_eq!(counts.users, 1);

    let err = provisioner
        .create_tenant(tenant_request("Acme", "a@acme.com"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "duplicate_identity");
    assert_eq!(gateway.row_counts().await, counts);
}

#[tokio::test]
async fn test_provisioned_records_are_linked() {
    let gateway = MemoryGateway::new();
    let created = provision(&gateway, "Acme", "a@acme.com").await;

    let mut uow = gateway.begin().await.unwrap();
    let user = uow.user_by_id(created.user_id).await.unwrap();
    let role = uow.role_by_id(user.role_id).await.unwrap();
    let profile = uow.profile_by_id(user.profile_id).await.unwrap();
    let company = uow.company_by_user_id(user.id).await.unwrap();
    uow.rollback().await.unwrap();

    assert_eq!(company.id, created.company_id);
    assert_eq!(company.primary_email, "a@acme.com");
    assert_eq!(company.timezone, "UTC");
    assert_eq!(role.company_id, company.id);
    assert!(role.internal_usage);
    assert!(profile.slug.starts_with("user-"));

    assert_ne!(user.password_hash, "longenough1");
    assert!(credentials().verify("longenough1", &user.password_hash).unwrap());
    assert!(!credentials().verify("longenough2", &user.password_hash).unwrap());
}

#[tokio::test]
async fn test_reused_email_in_other_company_is_rejected() {
    let gateway = MemoryGateway::new();
    provision(&gateway, "Acme", "a@acme.com").await;
    let before = gateway.row_counts().await;

    let err = TenantProvisioner::new(gateway.clone(), credentials())
        .create_tenant(tenant_request("Globex", "a@acme.com"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::DuplicateIdentity {
            field: IdentityField::UserEmail
        }
    ));
    assert_eq!(gateway.row_counts().await, before);
}

#[tokio::test]
async fn test_reused_company_name_is_rejected() {
    let gateway = MemoryGateway::new();
    provision(&gateway, "Acme", "a@acme.com").await;

    let err = TenantProvisioner::new(gateway.clone(), credentials())
        .create_tenant(tenant_request("Acme", "b@acme.com"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::DuplicateIdentity {
            field: IdentityField::CompanyName
        }
    ));
    assert_eq!(gateway.row_counts().await.companies, 1);
}

#[tokio::test]
async fn test_email_identity_is_exact() {
    let gateway = MemoryGateway::new();
    provision(&gateway, "Acme", "a@acme.com").await;

    // Neither case folding nor wildcard matching applies.
    provision(&gateway, "Acme Upper", "A@acme.com").await;
    provision(&gateway, "Acme Wildcard", "_@acme.com").await;

    assert_eq!(gateway.row_counts().await.users, 3);
}

#[tokio::test]
async fn test_invalid_request_persists_nothing() {
    let gateway = MemoryGateway::new();
    let mut request = tenant_request("", "not-an-email");
    request.admin.password = "short".to_string();

    let err = TenantProvisioner::new(gateway.clone(), credentials())
        .create_tenant(request)
        .await
        .unwrap_err();

    match err {
        ServiceError::Validation(fields) => {
            let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
            assert_eq!(names, vec!["admin.email", "admin.password", "name"]);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(gateway.row_counts().await, RowCounts::default());
}

#[tokio::test]
async fn test_failure_at_any_write_rolls_back_everything() {
    for operation in [
        Operation::CreateCompany,
        Operation::CreateRole,
        Operation::CreateProfile,
        Operation::CreateUser,
        Operation::Commit,
    ] {
        let gateway = MemoryGateway::new();
        gateway.fail_on(operation).await;

        let err = TenantProvisioner::new(gateway.clone(), credentials())
            .create_tenant(tenant_request("Acme", "a@acme.com"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "persistence_error", "operation {:?}", operation);
        assert_eq!(
            gateway.row_counts().await,
            RowCounts::default(),
            "operation {:?} left rows behind",
            operation
        );

        gateway.clear_faults().await;
        provision(&gateway, "Acme", "a@acme.com").await;
    }
}

#[tokio::test]
async fn test_default_timezone_applies() {
    let gateway = MemoryGateway::new();
    let provisioner = TenantProvisioner::new(gateway.clone(), credentials())
        .with_default_timezone(chrono_tz::Europe::Berlin);

    let implicit = provisioner
        .create_tenant(tenant_request("Acme", "a@acme.com"))
        .await
        .unwrap();

    let mut explicit_request = tenant_request("Globex", "g@globex.com");
    explicit_request.timezone = Some("America/New_York".to_string());
    let explicit = provisioner.create_tenant(explicit_request).await.unwrap();

    let mut uow = gateway.begin().await.unwrap();
    let implicit = uow.company_by_id(implicit.company_id).await.unwrap();
    let explicit = uow.company_by_id(explicit.company_id).await.unwrap();
    uow.rollback().await.unwrap();

    assert_eq!(implicit.timezone, "Europe/Berlin");
    assert_eq!(explicit.timezone, "America/New_York");
}

#[tokio::test]
async fn test_concurrent_claims_on_one_email() {
    let gateway = MemoryGateway::new();
    let provisioner = Arc::new(TenantProvisioner::new(gateway.clone(), credentials()));

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let provisioner = provisioner.clone();
            tokio::spawn(async move {
                provisioner
                    .create_tenant(tenant_request(&format!("Acme {}", i), "a@acme.com"))
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(e) => assert_eq!(e.code(), "duplicate_identity"),
        }
    }

    assert_eq!(created, 1);
    let counts = gateway.row_counts().await;
    assert_eq!(counts.users, 1);
    assert_eq!(counts.companies, 1);
}

#[tokio::test]
async fn test_name_reusable_after_decommission() {
    let gateway = MemoryGateway::new();
    let created = provision(&gateway, "Acme", "a@acme.com").await;

    let admin = TenantAdmin::new(gateway.clone());
    admin.remove_user(created.user_id).await.unwrap();
    admin.decommission_company(created.company_id).await.unwrap();

    let again = provision(&gateway, "Acme", "a@acme.com").await;
    assert_ne!(again.company_id, created.company_id);
}
