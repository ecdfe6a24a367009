/// Tenant provisioning
///
/// Creates a company together with its first administrator:
///
/// 1. Validate the request shape
/// 2. Reject a taken company name or admin email
/// 3. Hash the admin password
/// 4. In one unit of work: company, internal `admin` role, profile, user
///
/// A failure anywhere in step 4 rolls back all four writes.
///
/// # Example
///
/// ```no_run
/// use embrace_shared::auth::{Argon2Params, CredentialService};
/// use embrace_shared::db::MemoryGateway;
/// use embrace_shared::services::provisioning::{AdminAccount, CreateTenantRequest, TenantProvisioner};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provisioner = TenantProvisioner::new(
///     MemoryGateway::new(),
///     CredentialService::new(Argon2Params::default())?,
/// );
///
/// let created = provisioner
///     .create_tenant(CreateTenantRequest {
///         name: "Acme".to_string(),
///         description: None,
///         website: None,
///         timezone: Some("Europe/Berlin".to_string()),
///         admin: AdminAccount::new("a@acme.com", "longenough1"),
///     })
///     .await?;
///
/// assert_eq!(created.role_name, "admin");
/// # Ok(())
/// # }
/// ```

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::password::CredentialService;
use crate::db::{CompanyStore, Gateway, ProfileStore, RoleStore, UnitOfWork, UserStore};
use crate::error::{field_errors, FieldError, ServiceError};
use crate::models::company::CreateCompany;
use crate::models::user::CreateUser;
use crate::models::user_profile::{generate_slug, CreateUserProfile};
use crate::models::user_role::CreateUserRole;
use crate::services::identity::IdentityGuard;

/// Request to create a tenant and its administrator
#[derive(Clone, Deserialize, Validate)]
pub struct CreateTenantRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub website: Option<String>,

    /// IANA zone; the provisioner default applies when absent
    #[serde(default)]
    pub timezone: Option<String>,

    /// Also accepted as `user`
    #[serde(alias = "user")]
    #[validate(nested)]
    pub admin: AdminAccount,
}

/// The tenant's first user
#[derive(Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminAccount {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8))]
    pub password: String,

    /// Must equal `password` when present
    #[serde(default)]
    pub confirm_password: Option<String>,

    #[serde(default)]
    #[validate(length(min = 2, max = 50))]
    pub first_name: Option<String>,

    #[serde(default)]
    #[validate(length(min = 2, max = 50))]
    pub last_name: Option<String>,

    #[serde(default)]
    #[validate(length(min = 2, max = 50))]
    pub title: Option<String>,

    #[serde(default)]
    #[validate(length(min = 2, max = 50))]
    pub position: Option<String>,

    #[serde(default)]
    #[validate(length(min = 2, max = 50))]
    pub location: Option<String>,

    #[serde(default)]
    #[validate(length(min = 10, max = 15))]
    pub phone: Option<String>,
}

impl AdminAccount {
    /// Account with only the required fields set
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            confirm_password: None,
            first_name: None,
            last_name: None,
            title: None,
            position: None,
            location: None,
            phone: None,
        }
    }
}

impl fmt::Debug for AdminAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminAccount")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field(
                "confirm_password",
                &self.confirm_password.as_ref().map(|_| "<redacted>"),
            )
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("title", &self.title)
            .field("position", &self.position)
            .field("location", &self.location)
            .field("phone", &self.phone)
            .finish()
    }
}

impl fmt::Debug for CreateTenantRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateTenantRequest")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("website", &self.website)
            .field("timezone", &self.timezone)
            .field("admin", &self.admin)
            .finish()
    }
}

impl CreateTenantRequest {
    /// Runs every shape check and reports all failures at once
    pub fn check(&self) -> Result<(), ServiceError> {
        let mut errors = match self.validate() {
            Ok(()) => Vec::new(),
            Err(e) => field_errors(&e),
        };

        if let Some(confirmation) = &self.admin.confirm_password {
            if confirmation != &self.admin.password {
                errors.push(
                    FieldError::new("admin.confirm_password", "must_match")
                        .with_message("password confirmation does not match"),
                );
            }
        }

        if let Some(timezone) = &self.timezone {
            if timezone.parse::<Tz>().is_err() {
                errors.push(
                    FieldError::new("timezone", "timezone")
                        .with_message(format!("'{}' is not a known IANA timezone", timezone)),
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(errors))
        }
    }
}

/// Identifiers of a freshly provisioned tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantCreated {
    pub company_id: Uuid,
    pub company_name: String,
    pub user_id: Uuid,
    pub user_email: String,
    pub role_name: String,
}

/// Provisions tenants through a persistence gateway
#[derive(Debug, Clone)]
pub struct TenantProvisioner<G> {
    gateway: G,
    credentials: CredentialService,
    default_timezone: Tz,
}

impl<G: Gateway> TenantProvisioner<G> {
    pub fn new(gateway: G, credentials: CredentialService) -> Self {
        Self {
            gateway,
            credentials,
            default_timezone: Tz::UTC,
        }
    }

    /// Timezone given to companies whose request names none
    pub fn with_default_timezone(mut self, timezone: Tz) -> Self {
        self.default_timezone = timezone;
        self
    }

    /// Creates a company and its administrator atomically
    ///
    /// # Errors
    ///
    /// - `Validation` for malformed input (all failures reported together)
    /// - `DuplicateIdentity` when the company name or admin email is taken,
    ///   including when a concurrent request claims it first
    /// - `Credential` when hashing fails
    /// - `Persistence` for storage faults; nothing is persisted
    #[tracing::instrument(skip(self, request), fields(company_name = %request.name))]
    pub async fn create_tenant(
        &self,
        request: CreateTenantRequest,
    ) -> Result<TenantCreated, ServiceError> {
        request.check()?;

        let mut uow = self.gateway.begin().await?;
        IdentityGuard::ensure_company_name_available(&mut uow, &request.name).await?;
        IdentityGuard::ensure_email_available(&mut uow, &request.admin.email).await?;
        uow.rollback().await?;

        let password_hash = self.credentials.hash(&request.admin.password)?;

        match self.persist_tenant(request, password_hash).await {
            Ok(created) => {
                info!(
                    company_id = %created.company_id,
                    user_id = %created.user_id,
                    "Tenant provisioned"
                );
                Ok(created)
            }
            Err(e) => {
                warn!(error = %e, code = e.code(), "Tenant provisioning rolled back");
                Err(e)
            }
        }
    }

    async fn persist_tenant(
        &self,
        request: CreateTenantRequest,
        password_hash: String,
    ) -> Result<TenantCreated, ServiceError> {
        let timezone = request
            .timezone
            .unwrap_or_else(|| self.default_timezone.name().to_string());
        let admin = request.admin;

        let mut uow = self.gateway.begin().await?;

        let company = uow
            .create_company(CreateCompany {
                name: request.name,
                description: request.description.unwrap_or_default(),
                website: request.website.unwrap_or_default(),
                primary_email: admin.email.clone(),
                timezone,
            })
            .await?;

        let role = uow.create_role(CreateUserRole::admin_for(company.id)).await?;

        let profile = uow
            .create_profile(CreateUserProfile {
                slug: generate_slug(admin.first_name.as_deref(), admin.last_name.as_deref()),
                first_name: admin.first_name,
                last_name: admin.last_name,
                title: admin.title,
                position: admin.position,
                location: admin.location,
                phone: admin.phone,
                avatar: None,
            })
            .await?;

        let user = uow
            .create_user(CreateUser {
                email: admin.email,
                password_hash,
                company_id: company.id,
                role_id: role.id,
                profile_id: profile.id,
            })
            .await?;

        uow.commit().await?;

        Ok(TenantCreated {
            company_id: company.id,
            company_name: company.name,
            user_id: user.id,
            user_email: user.email,
            role_name: role.name,
        })
    }
}
